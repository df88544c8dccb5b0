//! Payment ledger records
//!
//! Each record explains one month's economic event for a loan: a performing
//! payment, a missed payment, or a payoff.
//!
//! CRITICAL: All money values are i64 (cents), so
//! `principal_paid + interest_paid == actual_payment_amount` holds exactly.

use crate::core::time::YearMonth;
use crate::models::loan::Loan;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of a monthly payment event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Missed,
    PaidOff,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Missed => "MISSED",
            PaymentStatus::PaidOff => "PAID_OFF",
        }
    }
}

/// One payment ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub loan_id: String,
    pub payment_due_date: NaiveDate,
    /// Absent for missed payments
    pub payment_received_date: Option<NaiveDate>,
    /// Fixed-schedule amount billed each month (principal / term); the
    /// annuity installment is reported on the snapshot instead
    pub scheduled_payment_amount: i64,
    pub actual_payment_amount: i64,
    pub principal_paid: i64,
    pub interest_paid: i64,
    pub interest_accrued: i64,
    pub payment_status: PaymentStatus,
}

impl PaymentRecord {
    /// Whether the principal/interest split reconciles to the paid amount
    pub fn is_balanced(&self) -> bool {
        (self.principal_paid + self.interest_paid - self.actual_payment_amount).abs() <= 2
    }
}

/// Amounts of one ledger entry before ids and dates are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentAmounts {
    pub status: PaymentStatus,
    pub actual: i64,
    pub principal: i64,
    pub interest: i64,
    pub accrued: i64,
}

/// Column-oriented accumulator for payment records
#[derive(Debug, Clone, Default)]
pub struct PaymentArena {
    loan_idx: Vec<u32>,
    due_month: Vec<YearMonth>,
    months_on_book: Vec<i64>,
    status: Vec<PaymentStatus>,
    actual: Vec<i64>,
    principal: Vec<i64>,
    interest: Vec<i64>,
    accrued: Vec<i64>,
}

impl PaymentArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            loan_idx: Vec::with_capacity(capacity),
            due_month: Vec::with_capacity(capacity),
            months_on_book: Vec::with_capacity(capacity),
            status: Vec::with_capacity(capacity),
            actual: Vec::with_capacity(capacity),
            principal: Vec::with_capacity(capacity),
            interest: Vec::with_capacity(capacity),
            accrued: Vec::with_capacity(capacity),
        }
    }

    /// Append one entry; `months_on_book` is the raw (unclamped) age used in the id
    pub fn push(
        &mut self,
        loan_idx: usize,
        due_month: YearMonth,
        months_on_book: i64,
        amounts: PaymentAmounts,
    ) {
        self.loan_idx.push(loan_idx as u32);
        self.due_month.push(due_month);
        self.months_on_book.push(months_on_book);
        self.status.push(amounts.status);
        self.actual.push(amounts.actual);
        self.principal.push(amounts.principal);
        self.interest.push(amounts.interest);
        self.accrued.push(amounts.accrued);
    }

    pub fn len(&self) -> usize {
        self.loan_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loan_idx.is_empty()
    }

    /// Count entries with a given status
    pub fn count_status(&self, status: PaymentStatus) -> usize {
        self.status.iter().filter(|s| **s == status).count()
    }

    /// Total cash collected across all entries (cents)
    pub fn total_collected(&self) -> i64 {
        self.actual.iter().sum()
    }

    /// Join with the loan book and produce the final ordered sequence
    pub fn materialize(&self, loans: &[Loan]) -> Vec<PaymentRecord> {
        (0..self.len())
            .map(|row| {
                let loan = &loans[self.loan_idx[row] as usize];
                let status = self.status[row];
                let due = self.due_month[row].month_end();
                let payment_id = match status {
                    PaymentStatus::Missed => {
                        format!("PMT-{}-{}-MISSED", loan.id(), self.months_on_book[row])
                    }
                    _ => format!("PMT-{}-{}", loan.id(), self.months_on_book[row]),
                };

                PaymentRecord {
                    payment_id,
                    loan_id: loan.id().to_string(),
                    payment_due_date: due,
                    payment_received_date: match status {
                        PaymentStatus::Missed => None,
                        _ => Some(due),
                    },
                    scheduled_payment_amount: loan.fixed_schedule_payment(),
                    actual_payment_amount: self.actual[row],
                    principal_paid: self.principal[row],
                    interest_paid: self.interest[row],
                    interest_accrued: self.accrued[row],
                    payment_status: status,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::Underwriting;

    #[test]
    fn test_materialize_builds_ids_and_dates() {
        let loan = Loan::new(
            "LN-7".into(),
            "APP-7".into(),
            YearMonth::new(2022, 1).unwrap(),
            1_200_000,
            36,
            0.12,
            Underwriting::default(),
        )
        .unwrap();

        let mut arena = PaymentArena::with_capacity(4);
        let feb = YearMonth::new(2022, 2).unwrap();
        arena.push(
            0,
            feb,
            2,
            PaymentAmounts {
                status: PaymentStatus::Missed,
                actual: 0,
                principal: 0,
                interest: 0,
                accrued: 12_000,
            },
        );

        let records = arena.materialize(&[loan]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payment_id, "PMT-LN-7-2-MISSED");
        assert_eq!(
            records[0].payment_due_date,
            NaiveDate::from_ymd_opt(2022, 2, 28).unwrap()
        );
        assert_eq!(records[0].payment_received_date, None);
        assert_eq!(records[0].scheduled_payment_amount, 33_333);
        assert!(records[0].is_balanced());
    }

    #[test]
    fn test_status_serializes_to_ledger_vocabulary() {
        let json = serde_json::to_string(&PaymentStatus::PaidOff).unwrap();
        assert_eq!(json, "\"PAID_OFF\"");
    }
}
