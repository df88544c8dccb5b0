//! Loan state and population state vectors
//!
//! The population is stored column-wise: one vector each for state,
//! days-past-due and balance, indexed by loan position in the loan book.
//!
//! # Critical Invariants
//!
//! 1. **Atomic commit**: the three vectors are only ever replaced together,
//!    once per tick, via [`PopulationState::commit`]
//! 2. **Absorbing terminals**: `ChargedOff` and `PaidOff` never change again
//! 3. **Zero terminal balance**: a terminal loan always carries balance 0
//! 4. **Non-increasing balances**: a commit never raises a balance

use serde::{Deserialize, Serialize};

/// Delinquency / lifecycle state of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoanState {
    #[serde(rename = "CURRENT")]
    Current,
    #[serde(rename = "DELINQUENT_30")]
    Dpd30,
    #[serde(rename = "DELINQUENT_60")]
    Dpd60,
    #[serde(rename = "DELINQUENT_90")]
    Dpd90,
    #[serde(rename = "CHARGED_OFF")]
    ChargedOff,
    #[serde(rename = "PAID_OFF")]
    PaidOff,
}

impl LoanState {
    /// Non-terminal states, in the order their draws are consumed each tick
    pub const DRAW_ORDER: [LoanState; 4] = [
        LoanState::Current,
        LoanState::Dpd30,
        LoanState::Dpd60,
        LoanState::Dpd90,
    ];

    /// Numeric code used in compact encodings (0=Current … 5=PaidOff)
    pub fn code(&self) -> u8 {
        match self {
            LoanState::Current => 0,
            LoanState::Dpd30 => 1,
            LoanState::Dpd60 => 2,
            LoanState::Dpd90 => 3,
            LoanState::ChargedOff => 4,
            LoanState::PaidOff => 5,
        }
    }

    /// Canonical status vocabulary used in the monthly snapshot
    pub fn status_label(&self) -> &'static str {
        match self {
            LoanState::Current => "CURRENT",
            LoanState::Dpd30 => "DELINQUENT_30",
            LoanState::Dpd60 => "DELINQUENT_60",
            LoanState::Dpd90 => "DELINQUENT_90",
            LoanState::ChargedOff => "CHARGED_OFF",
            LoanState::PaidOff => "PAID_OFF",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanState::ChargedOff | LoanState::PaidOff)
    }

    pub fn is_delinquent(&self) -> bool {
        matches!(self, LoanState::Dpd30 | LoanState::Dpd60 | LoanState::Dpd90)
    }

    /// Days past due a loan carries on entering this state
    ///
    /// `PaidOff` clears delinquency; `ChargedOff` is recorded at 120.
    pub fn entry_dpd(&self) -> u16 {
        match self {
            LoanState::Current | LoanState::PaidOff => 0,
            LoanState::Dpd30 => 30,
            LoanState::Dpd60 => 60,
            LoanState::Dpd90 => 90,
            LoanState::ChargedOff => 120,
        }
    }

    /// Whether a single tick may move a loan from `self` to `next`
    ///
    /// Delinquency only rolls one stage at a time; only DPD30 cures. Payoff
    /// is reachable from CURRENT (probabilistic or balance floor) and from
    /// any non-terminal state through a scheduled forced payoff.
    pub fn can_transition_to(&self, next: LoanState) -> bool {
        if *self == next {
            return true;
        }
        match (self, next) {
            (s, _) if s.is_terminal() => false,
            (_, LoanState::PaidOff) => true,
            (LoanState::Current, LoanState::Dpd30) => true,
            (LoanState::Dpd30, LoanState::Dpd60) => true,
            (LoanState::Dpd30, LoanState::Current) => true,
            (LoanState::Dpd60, LoanState::Dpd90) => true,
            (LoanState::Dpd90, LoanState::ChargedOff) => true,
            _ => false,
        }
    }
}

/// Read-only copy of the population taken right after a commit
///
/// The whole tick reads from this, never from the live vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorState {
    pub states: Vec<LoanState>,
    pub dpd: Vec<u16>,
    pub balances: Vec<i64>,
}

/// Proposed population state for the next tick
#[derive(Debug, Clone, PartialEq)]
pub struct NextState {
    pub states: Vec<LoanState>,
    pub dpd: Vec<u16>,
    pub balances: Vec<i64>,
}

impl NextState {
    /// Start from the prior state: loans without a draw carry over unchanged
    pub fn carry_over(prior: &PriorState) -> Self {
        Self {
            states: prior.states.clone(),
            dpd: prior.dpd.clone(),
            balances: prior.balances.clone(),
        }
    }

    /// Set a loan's state together with its entry dpd; terminals zero the balance
    pub fn set(&mut self, idx: usize, state: LoanState) {
        self.states[idx] = state;
        self.dpd[idx] = state.entry_dpd();
        if state.is_terminal() {
            self.balances[idx] = 0;
        }
    }
}

/// Population-wide state vectors owned by the state machine
///
/// # Example
///
/// ```rust
/// use loan_tape_core_rs::models::state::{LoanState, NextState, PopulationState};
///
/// let mut pop = PopulationState::new(vec![100_000, 250_000]);
/// let prior = pop.capture_prior();
///
/// let mut next = NextState::carry_over(&prior);
/// next.set(1, LoanState::Dpd30);
/// pop.commit(next);
///
/// assert_eq!(pop.state(1), LoanState::Dpd30);
/// assert_eq!(pop.dpd(1), 30);
/// assert_eq!(pop.balance(0), 100_000);
/// ```
#[derive(Debug, Clone)]
pub struct PopulationState {
    states: Vec<LoanState>,
    dpd: Vec<u16>,
    balances: Vec<i64>,
}

impl PopulationState {
    /// All loans start CURRENT at their original principal
    pub fn new(original_balances: Vec<i64>) -> Self {
        let n = original_balances.len();
        Self {
            states: vec![LoanState::Current; n],
            dpd: vec![0; n],
            balances: original_balances,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, idx: usize) -> LoanState {
        self.states[idx]
    }

    pub fn dpd(&self, idx: usize) -> u16 {
        self.dpd[idx]
    }

    pub fn balance(&self, idx: usize) -> i64 {
        self.balances[idx]
    }

    pub fn states(&self) -> &[LoanState] {
        &self.states
    }

    pub fn balances(&self) -> &[i64] {
        &self.balances
    }

    /// Snapshot the committed vectors; call exactly once per tick
    pub fn capture_prior(&self) -> PriorState {
        PriorState {
            states: self.states.clone(),
            dpd: self.dpd.clone(),
            balances: self.balances.clone(),
        }
    }

    /// Atomically replace the whole population state
    ///
    /// # Panics
    /// Panics if the proposed vectors do not match the population size.
    pub fn commit(&mut self, next: NextState) {
        assert_eq!(next.states.len(), self.len(), "state vector length mismatch");
        assert_eq!(next.dpd.len(), self.len(), "dpd vector length mismatch");
        assert_eq!(next.balances.len(), self.len(), "balance vector length mismatch");

        debug_assert!(self
            .balances
            .iter()
            .zip(next.balances.iter())
            .all(|(old, new)| new <= old && *new >= 0));

        self.states = next.states;
        self.dpd = next.dpd;
        self.balances = next.balances;
    }

    /// Number of loans in each state, indexed by [`LoanState::code`]
    pub fn state_counts(&self) -> [usize; 6] {
        let mut counts = [0usize; 6];
        for s in &self.states {
            counts[s.code() as usize] += 1;
        }
        counts
    }
}
