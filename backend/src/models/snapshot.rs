//! Monthly loan snapshot facts
//!
//! One `MonthlySnapshot` per reported loan per month. During a run the
//! snapshots live in a column-oriented [`SnapshotArena`]; loan-level
//! attributes (ids, rate, installment, vintage) are joined in only when the
//! arena is materialized at the end of the run.

use crate::core::time::YearMonth;
use crate::models::loan::Loan;
use crate::models::state::LoanState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Month-end performance fact for one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    pub loan_id: String,
    pub application_id: String,
    pub as_of_month: YearMonth,
    pub snapshot_date: NaiveDate,
    /// Months on book, clamped to the modeled maximum age
    pub months_on_book: u32,
    pub loan_status: LoanState,
    pub days_past_due: u16,
    /// Outstanding principal (cents)
    pub current_balance: i64,
    pub chargeoff_flag: bool,
    /// 90+ days past due or charged off
    pub default_flag: bool,
    pub original_loan_amount: i64,
    pub original_term_months: u32,
    pub interest_rate: f64,
    pub scheduled_payment_amount: i64,
    pub origination_month: YearMonth,
    pub vintage_quarter: String,
}

/// Column-oriented accumulator for snapshot facts
///
/// Each column grows by one entry per [`SnapshotArena::push`]; all columns
/// always have equal length.
#[derive(Debug, Clone, Default)]
pub struct SnapshotArena {
    loan_idx: Vec<u32>,
    as_of: Vec<YearMonth>,
    months_on_book: Vec<u32>,
    state: Vec<LoanState>,
    dpd: Vec<u16>,
    balance: Vec<i64>,
}

impl SnapshotArena {
    /// Pre-size every column (e.g. active loans × ticks)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            loan_idx: Vec::with_capacity(capacity),
            as_of: Vec::with_capacity(capacity),
            months_on_book: Vec::with_capacity(capacity),
            state: Vec::with_capacity(capacity),
            dpd: Vec::with_capacity(capacity),
            balance: Vec::with_capacity(capacity),
        }
    }

    pub fn push(
        &mut self,
        loan_idx: usize,
        as_of: YearMonth,
        months_on_book: u32,
        state: LoanState,
        dpd: u16,
        balance: i64,
    ) {
        self.loan_idx.push(loan_idx as u32);
        self.as_of.push(as_of);
        self.months_on_book.push(months_on_book);
        self.state.push(state);
        self.dpd.push(dpd);
        self.balance.push(balance);
    }

    pub fn len(&self) -> usize {
        self.loan_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loan_idx.is_empty()
    }

    /// States column, in append order
    pub fn states(&self) -> &[LoanState] {
        &self.state
    }

    /// Join with the loan book and produce the final ordered sequence
    pub fn materialize(&self, loans: &[Loan]) -> Vec<MonthlySnapshot> {
        (0..self.len())
            .map(|row| {
                let loan = &loans[self.loan_idx[row] as usize];
                let state = self.state[row];
                MonthlySnapshot {
                    loan_id: loan.id().to_string(),
                    application_id: loan.application_id().to_string(),
                    as_of_month: self.as_of[row],
                    snapshot_date: self.as_of[row].month_end(),
                    months_on_book: self.months_on_book[row],
                    loan_status: state,
                    days_past_due: self.dpd[row],
                    current_balance: self.balance[row],
                    chargeoff_flag: state == LoanState::ChargedOff,
                    default_flag: matches!(state, LoanState::Dpd90 | LoanState::ChargedOff),
                    original_loan_amount: loan.original_principal(),
                    original_term_months: loan.term_months(),
                    interest_rate: loan.annual_rate(),
                    scheduled_payment_amount: loan.scheduled_installment(),
                    origination_month: loan.origination_month(),
                    vintage_quarter: loan.origination_month().quarter_label(),
                }
            })
            .collect()
    }
}
