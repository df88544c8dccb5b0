//! Delinquency state machine
//!
//! One uniform draw per active loan per tick, read against nested
//! thresholds so exactly one outcome fires:
//!
//! | from    | outcome (in priority order)                                |
//! |---------|------------------------------------------------------------|
//! | CURRENT | `u < paid` → PAID_OFF, `u < paid + 30` → DPD30, else stay  |
//! | DPD30   | `u < 30_60` → DPD60, `u < 30_60 + cure` → CURRENT, else stay |
//! | DPD60   | `u < roll` → DPD90, else stay                              |
//! | DPD90   | `u < roll` → CHARGED_OFF, else stay                        |
//!
//! After the draw, a scheduled forced payoff overrides the outcome, and a
//! loan that ends up CURRENT pays down its balance (possibly below the
//! payoff floor, which closes it).
//!
//! # Critical Invariants
//!
//! 1. Reads only the prior snapshot; writes only the [`NextState`] buffers
//! 2. Draws are consumed grouped by originating state in
//!    [`LoanState::DRAW_ORDER`], loan index ascending within a group
//! 3. Every active loan consumes exactly one draw, overridden or not

use super::TransitionCounts;
use crate::models::state::{LoanState, NextState, PriorState};
use crate::risk::TransitionParams;
use crate::rng::RngManager;
use crate::schedule::ForcedEventSchedule;
use serde::{Deserialize, Serialize};

/// Monthly paydown of performing loans
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmortizationRule {
    /// Fraction of the prior balance repaid each CURRENT month
    pub paydown_rate: f64,
    /// Balances strictly below this (cents) are closed as paid off
    pub payoff_floor_cents: i64,
}

impl Default for AmortizationRule {
    fn default() -> Self {
        Self {
            paydown_rate: 0.03,
            payoff_floor_cents: 1_000,
        }
    }
}

impl AmortizationRule {
    /// Balance after one performing month (never negative)
    pub fn amortize(&self, balance: i64) -> i64 {
        let paydown = (balance as f64 * self.paydown_rate).round() as i64;
        (balance - paydown).max(0)
    }

    pub fn is_below_floor(&self, balance: i64) -> bool {
        balance < self.payoff_floor_cents
    }
}

/// Interpret one uniform draw for a loan in `state`
///
/// Terminal states are absorbing and return themselves.
///
/// # Example
/// ```
/// use loan_tape_core_rs::models::state::LoanState;
/// use loan_tape_core_rs::risk::TransitionParams;
/// use loan_tape_core_rs::transitions::next_state;
///
/// let p = TransitionParams {
///     p_current_to_30: 0.10,
///     p_current_to_paid: 0.05,
///     ..TransitionParams::ZERO
/// };
/// assert_eq!(next_state(LoanState::Current, &p, 0.01), LoanState::PaidOff);
/// assert_eq!(next_state(LoanState::Current, &p, 0.12), LoanState::Dpd30);
/// assert_eq!(next_state(LoanState::Current, &p, 0.50), LoanState::Current);
/// ```
pub fn next_state(state: LoanState, params: &TransitionParams, u: f64) -> LoanState {
    match state {
        LoanState::Current => {
            if u < params.p_current_to_paid {
                LoanState::PaidOff
            } else if u < params.p_current_to_paid + params.p_current_to_30 {
                LoanState::Dpd30
            } else {
                LoanState::Current
            }
        }
        LoanState::Dpd30 => {
            if u < params.p_30_to_60 {
                LoanState::Dpd60
            } else if u < params.p_30_to_60 + params.p_30_to_cure {
                LoanState::Current
            } else {
                LoanState::Dpd30
            }
        }
        // No cure path out of DPD60
        LoanState::Dpd60 => {
            if u < params.p_roll_forward {
                LoanState::Dpd90
            } else {
                LoanState::Dpd60
            }
        }
        LoanState::Dpd90 => {
            if u < params.p_roll_forward {
                LoanState::ChargedOff
            } else {
                LoanState::Dpd90
            }
        }
        LoanState::ChargedOff | LoanState::PaidOff => state,
    }
}

/// Result of one population step
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub next: NextState,
    pub counts: TransitionCounts,
}

impl TickOutcome {
    /// Whether any scheduled payoff fired this tick
    pub fn forced_fired(&self) -> bool {
        self.counts.forced_payoffs > 0
    }
}

/// Advance every active loan by one month
///
/// `active` lists loan indices in ascending order; `params` and
/// `months_on_book` (raw, unclamped) are aligned with it. Loans not in
/// `active` carry over unchanged.
pub fn step_population(
    prior: &PriorState,
    active: &[usize],
    params: &[TransitionParams],
    months_on_book: &[i64],
    schedule: &ForcedEventSchedule,
    amortization: &AmortizationRule,
    rng: &mut RngManager,
) -> TickOutcome {
    debug_assert_eq!(active.len(), params.len());
    debug_assert_eq!(active.len(), months_on_book.len());

    let mut next = NextState::carry_over(prior);
    let mut counts = TransitionCounts::default();

    // One draw per active loan, handed out in draw order
    let draws = rng.uniform_vec(active.len());
    let mut cursor = 0;

    for group in LoanState::DRAW_ORDER {
        for (pos, &idx) in active.iter().enumerate() {
            let from = prior.states[idx];
            if from != group {
                continue;
            }

            let u = draws[cursor];
            cursor += 1;
            let drawn = next_state(from, &params[pos], u);

            if schedule.fires(idx, months_on_book[pos]) {
                next.set(idx, LoanState::PaidOff);
                counts.forced_payoffs += 1;
                continue;
            }

            match (from, drawn) {
                (LoanState::Current, LoanState::PaidOff) => counts.probabilistic_payoffs += 1,
                (_, LoanState::Dpd30) if from != LoanState::Dpd30 => counts.to_dpd30 += 1,
                (_, LoanState::Dpd60) if from != LoanState::Dpd60 => counts.to_dpd60 += 1,
                (_, LoanState::Dpd90) if from != LoanState::Dpd90 => counts.to_dpd90 += 1,
                (LoanState::Dpd30, LoanState::Current) => counts.cures += 1,
                (_, LoanState::ChargedOff) => counts.charge_offs += 1,
                _ => {}
            }

            if drawn == LoanState::Current {
                let balance = amortization.amortize(prior.balances[idx]);
                if amortization.is_below_floor(balance) {
                    next.set(idx, LoanState::PaidOff);
                    counts.natural_payoffs += 1;
                    if from == LoanState::Dpd30 {
                        // A cure straight into payoff is reported as the payoff
                        counts.cures -= 1;
                    }
                } else {
                    next.set(idx, LoanState::Current);
                    next.balances[idx] = balance;
                }
            } else {
                next.set(idx, drawn);
            }
        }
    }

    TickOutcome { next, counts }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior(states: Vec<LoanState>, balances: Vec<i64>) -> PriorState {
        PriorState {
            dpd: states.iter().map(|s| s.entry_dpd()).collect(),
            states,
            balances,
        }
    }

    fn always(p: f64) -> TransitionParams {
        TransitionParams {
            p_current_to_30: p,
            p_current_to_paid: 0.0,
            p_30_to_60: p,
            p_30_to_cure: 0.0,
            p_roll_forward: p,
        }
    }

    #[test]
    fn test_thresholds_are_nested_in_priority_order() {
        // Dyadic probabilities so every threshold sum is exact
        let p = TransitionParams {
            p_current_to_30: 0.25,
            p_current_to_paid: 0.125,
            p_30_to_60: 0.25,
            p_30_to_cure: 0.5,
            p_roll_forward: 0.5,
        };
        assert_eq!(next_state(LoanState::Current, &p, 0.124), LoanState::PaidOff);
        assert_eq!(next_state(LoanState::Current, &p, 0.125), LoanState::Dpd30);
        assert_eq!(next_state(LoanState::Current, &p, 0.374), LoanState::Dpd30);
        assert_eq!(next_state(LoanState::Current, &p, 0.375), LoanState::Current);
        assert_eq!(next_state(LoanState::Dpd30, &p, 0.249), LoanState::Dpd60);
        assert_eq!(next_state(LoanState::Dpd30, &p, 0.25), LoanState::Current);
        assert_eq!(next_state(LoanState::Dpd30, &p, 0.749), LoanState::Current);
        assert_eq!(next_state(LoanState::Dpd30, &p, 0.75), LoanState::Dpd30);
        assert_eq!(next_state(LoanState::Dpd60, &p, 0.499), LoanState::Dpd90);
        assert_eq!(next_state(LoanState::Dpd60, &p, 0.5), LoanState::Dpd60);
        assert_eq!(next_state(LoanState::Dpd90, &p, 0.499), LoanState::ChargedOff);
        assert_eq!(next_state(LoanState::Dpd90, &p, 0.5), LoanState::Dpd90);
    }

    #[test]
    fn test_dpd60_never_cures() {
        let p = TransitionParams {
            p_30_to_cure: 1.0,
            ..TransitionParams::ZERO
        };
        for u in [0.0, 0.25, 0.5, 0.99] {
            assert_eq!(next_state(LoanState::Dpd60, &p, u), LoanState::Dpd60);
        }
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let p = always(1.0);
        assert_eq!(next_state(LoanState::PaidOff, &p, 0.0), LoanState::PaidOff);
        assert_eq!(next_state(LoanState::ChargedOff, &p, 0.0), LoanState::ChargedOff);
    }

    #[test]
    fn test_one_stage_per_tick() {
        // Certain roll-forward everywhere: each loan moves exactly one stage
        let prior = prior(
            vec![LoanState::Current, LoanState::Dpd30, LoanState::Dpd60, LoanState::Dpd90],
            vec![100_000; 4],
        );
        let active = [0, 1, 2, 3];
        let params = vec![always(1.0); 4];
        let mut rng = RngManager::new(1);

        let out = step_population(
            &prior,
            &active,
            &params,
            &[5, 5, 5, 5],
            &ForcedEventSchedule::never(4),
            &AmortizationRule::default(),
            &mut rng,
        );

        assert_eq!(
            out.next.states,
            vec![LoanState::Dpd30, LoanState::Dpd60, LoanState::Dpd90, LoanState::ChargedOff]
        );
        assert_eq!(out.next.dpd, vec![30, 60, 90, 120]);
        assert_eq!(out.next.balances, vec![100_000, 100_000, 100_000, 0]);
        assert_eq!(out.counts.total(), 4);
    }

    #[test]
    fn test_forced_payoff_overrides_draw() {
        let prior = prior(vec![LoanState::Dpd30, LoanState::Current], vec![50_000, 80_000]);
        let schedule = ForcedEventSchedule::from_offsets(vec![Some(7), Some(8)]);
        let mut rng = RngManager::new(9);

        let out = step_population(
            &prior,
            &[0, 1],
            &[always(1.0), always(1.0)],
            &[7, 7],
            &schedule,
            &AmortizationRule::default(),
            &mut rng,
        );

        assert_eq!(out.next.states[0], LoanState::PaidOff);
        assert_eq!(out.next.balances[0], 0);
        assert_eq!(out.next.dpd[0], 0);
        assert_eq!(out.next.states[1], LoanState::Dpd30);
        assert!(out.forced_fired());
        assert_eq!(out.counts.forced_payoffs, 1);
    }

    #[test]
    fn test_current_loans_amortize_from_prior_balance() {
        let prior = prior(vec![LoanState::Current, LoanState::Dpd30], vec![100_000, 100_000]);
        let cure = TransitionParams {
            p_30_to_cure: 1.0,
            ..TransitionParams::ZERO
        };
        let mut rng = RngManager::new(2);

        let out = step_population(
            &prior,
            &[0, 1],
            &[TransitionParams::ZERO, cure],
            &[3, 3],
            &ForcedEventSchedule::never(2),
            &AmortizationRule::default(),
            &mut rng,
        );

        assert_eq!(out.next.states, vec![LoanState::Current, LoanState::Current]);
        assert_eq!(out.next.balances, vec![97_000, 97_000]);
        assert_eq!(out.counts.cures, 1);
    }

    #[test]
    fn test_balance_under_floor_pays_off() {
        let prior = prior(vec![LoanState::Current], vec![1_020]);
        let mut rng = RngManager::new(4);

        let out = step_population(
            &prior,
            &[0],
            &[TransitionParams::ZERO],
            &[30],
            &ForcedEventSchedule::never(1),
            &AmortizationRule::default(),
            &mut rng,
        );

        assert_eq!(out.next.states[0], LoanState::PaidOff);
        assert_eq!(out.next.balances[0], 0);
        assert_eq!(out.counts.natural_payoffs, 1);
    }

    #[test]
    fn test_draws_grouped_by_state_then_index() {
        // Loan 0 is DPD30, loan 1 is CURRENT: the CURRENT loan draws first
        let prior = prior(vec![LoanState::Dpd30, LoanState::Current], vec![10_000, 10_000]);
        let threshold = TransitionParams {
            p_current_to_30: 0.5,
            p_30_to_60: 0.5,
            ..TransitionParams::ZERO
        };

        let mut probe = RngManager::new(77);
        let first = probe.next_f64();
        let second = probe.next_f64();

        let mut rng = RngManager::new(77);
        let out = step_population(
            &prior,
            &[0, 1],
            &[threshold, threshold],
            &[9, 9],
            &ForcedEventSchedule::never(2),
            &AmortizationRule::default(),
            &mut rng,
        );

        let expect_current = if first < 0.5 { LoanState::Dpd30 } else { LoanState::Current };
        let expect_dpd30 = if second < 0.5 { LoanState::Dpd60 } else { LoanState::Dpd30 };
        assert_eq!(out.next.states[1], expect_current);
        assert_eq!(out.next.states[0], expect_dpd30);
        assert_eq!(rng.get_state(), probe.get_state());
    }
}
