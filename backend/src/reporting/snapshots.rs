//! Snapshot recorder
//!
//! A loan is reported in a month once it has originated and until it has
//! been reported in a terminal state. The terminal month is reported once;
//! the loan is then finalized and never appears again.

use crate::core::time::YearMonth;
use crate::models::loan::Loan;
use crate::models::snapshot::{MonthlySnapshot, SnapshotArena};
use crate::models::state::LoanState;

#[derive(Debug, Clone)]
pub struct SnapshotRecorder {
    arena: SnapshotArena,
    finalized: Vec<bool>,
    max_age: u32,
}

impl SnapshotRecorder {
    pub fn new(n_loans: usize, max_age: u32) -> Self {
        Self::with_capacity(n_loans, max_age, 0)
    }

    /// Recorder whose arena is pre-sized for `capacity` snapshots
    pub fn with_capacity(n_loans: usize, max_age: u32, capacity: usize) -> Self {
        Self {
            arena: SnapshotArena::with_capacity(capacity),
            finalized: vec![false; n_loans],
            max_age,
        }
    }

    /// Whether `loan` should appear in the `month` panel
    pub fn is_reportable(&self, loan_idx: usize, loan: &Loan, month: YearMonth) -> bool {
        loan.is_originated_by(month) && !self.is_finalized(loan_idx)
    }

    pub fn is_finalized(&self, loan_idx: usize) -> bool {
        self.finalized[loan_idx]
    }

    /// Append one fact; terminal states finalize the loan
    ///
    /// Returns `false` (and records nothing) if the loan is already final.
    pub fn record(
        &mut self,
        loan_idx: usize,
        month: YearMonth,
        months_on_book: i64,
        state: LoanState,
        dpd: u16,
        balance: i64,
    ) -> bool {
        if self.is_finalized(loan_idx) {
            return false;
        }

        let reported_age = months_on_book.clamp(0, self.max_age as i64) as u32;
        self.arena
            .push(loan_idx, month, reported_age, state, dpd, balance);
        if state.is_terminal() {
            self.finalized[loan_idx] = true;
        }
        true
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Reported count per state, indexed by [`LoanState::code`]
    pub fn state_counts(&self) -> [usize; 6] {
        let mut counts = [0usize; 6];
        for s in self.arena.states() {
            counts[s.code() as usize] += 1;
        }
        counts
    }

    pub fn materialize(&self, loans: &[Loan]) -> Vec<MonthlySnapshot> {
        self.arena.materialize(loans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::Underwriting;

    fn loan() -> Loan {
        Loan::new(
            "LN-1".into(),
            "APP-1".into(),
            YearMonth::new(2022, 3).unwrap(),
            500_000,
            36,
            0.1,
            Underwriting::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_terminal_reported_once() {
        let l = loan();
        let mut rec = SnapshotRecorder::new(1, 60);
        let apr = YearMonth::new(2022, 4).unwrap();

        assert!(rec.is_reportable(0, &l, apr));
        assert!(rec.record(0, apr, 2, LoanState::ChargedOff, 120, 0));
        assert!(rec.is_finalized(0));
        assert!(!rec.is_reportable(0, &l, apr.next()));
        assert!(!rec.record(0, apr.next(), 3, LoanState::ChargedOff, 120, 0));
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.state_counts()[LoanState::ChargedOff.code() as usize], 1);
    }

    #[test]
    fn test_not_reported_before_origination() {
        let rec = SnapshotRecorder::new(1, 60);
        assert!(!rec.is_reportable(0, &loan(), YearMonth::new(2022, 2).unwrap()));
    }

    #[test]
    fn test_age_is_clamped_when_reported() {
        let l = loan();
        let mut rec = SnapshotRecorder::new(1, 60);
        let month = YearMonth::new(2028, 1).unwrap();
        rec.record(0, month, 71, LoanState::Current, 0, 1_000);
        let snaps = rec.materialize(&[l]);
        assert_eq!(snaps[0].months_on_book, 60);
        assert_eq!(snaps[0].vintage_quarter, "2022-Q1");
    }
}
