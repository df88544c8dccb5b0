//! Payment ledger emitter
//!
//! Every reported loan with an economic event in the month gets exactly
//! one ledger entry, derived from its committed new state and the balance
//! it carried into the month:
//!
//! - ends CURRENT (stayed or cured): PAID, fixed-schedule amount split into
//!   accrued interest first, principal second
//! - enters DPD30/60/90 or CHARGED_OFF: MISSED, zero amount, carries the
//!   month's accrued interest
//! - enters PAID_OFF by any path: PAID_OFF, the whole prior balance as
//!   principal; the month's accrual is still recorded
//! - stays in the same delinquency stage: nothing

use crate::core::time::YearMonth;
use crate::models::loan::Loan;
use crate::models::payment::{PaymentAmounts, PaymentArena, PaymentRecord, PaymentStatus};
use crate::models::state::LoanState;

/// Ledger amounts for one loan-month, or `None` if nothing happened
///
/// # Example
/// ```
/// use loan_tape_core_rs::models::state::LoanState;
/// use loan_tape_core_rs::models::payment::PaymentStatus;
/// use loan_tape_core_rs::reporting::ledger_entry;
/// use loan_tape_core_rs::{Loan, Underwriting, YearMonth};
///
/// let loan = Loan::new(
///     "LN-1".into(), "APP-1".into(), YearMonth::new(2022, 1).unwrap(),
///     1_200_000, 36, 0.12, Underwriting::default(),
/// ).unwrap();
///
/// let paid = ledger_entry(&loan, LoanState::Current, LoanState::Current, 1_200_000).unwrap();
/// assert_eq!(paid.status, PaymentStatus::Paid);
/// assert_eq!(paid.interest, 12_000);
/// assert_eq!(paid.principal, 33_333 - 12_000);
///
/// assert!(ledger_entry(&loan, LoanState::Dpd60, LoanState::Dpd60, 1_000_000).is_none());
/// ```
pub fn ledger_entry(
    loan: &Loan,
    from: LoanState,
    to: LoanState,
    prior_balance: i64,
) -> Option<PaymentAmounts> {
    if from.is_terminal() {
        return None;
    }

    match to {
        LoanState::PaidOff => Some(PaymentAmounts {
            status: PaymentStatus::PaidOff,
            actual: prior_balance,
            principal: prior_balance,
            interest: 0,
            accrued: loan.monthly_interest(prior_balance),
        }),
        LoanState::Current => {
            let accrued = loan.monthly_interest(prior_balance);
            let actual = loan.fixed_schedule_payment();
            let interest = actual.min(accrued);
            Some(PaymentAmounts {
                status: PaymentStatus::Paid,
                actual,
                principal: actual - interest,
                interest,
                accrued,
            })
        }
        _ if to == from => None,
        _ => Some(PaymentAmounts {
            status: PaymentStatus::Missed,
            actual: 0,
            principal: 0,
            interest: 0,
            accrued: loan.monthly_interest(prior_balance),
        }),
    }
}

/// Accumulates ledger entries over a run
#[derive(Debug, Clone, Default)]
pub struct PaymentLedger {
    arena: PaymentArena,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger whose arena is pre-sized for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: PaymentArena::with_capacity(capacity),
        }
    }

    /// Emit the entry for one loan-month; returns whether one was written
    ///
    /// `months_on_book` is the raw value used in the payment id.
    #[allow(clippy::too_many_arguments)]
    pub fn emit(
        &mut self,
        loan_idx: usize,
        loan: &Loan,
        month: YearMonth,
        months_on_book: i64,
        from: LoanState,
        to: LoanState,
        prior_balance: i64,
    ) -> bool {
        match ledger_entry(loan, from, to, prior_balance) {
            Some(amounts) => {
                self.arena.push(loan_idx, month, months_on_book, amounts);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn count_status(&self, status: PaymentStatus) -> usize {
        self.arena.count_status(status)
    }

    pub fn total_collected(&self) -> i64 {
        self.arena.total_collected()
    }

    pub fn materialize(&self, loans: &[Loan]) -> Vec<PaymentRecord> {
        self.arena.materialize(loans)
    }
}
