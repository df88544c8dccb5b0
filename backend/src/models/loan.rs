//! Loan model
//!
//! A funded loan. Immutable once created: the simulator only ever reads it.
//! Each loan has:
//! - Identity (loan id, application id)
//! - Origination month
//! - Original principal (i64 cents), term, annual interest rate
//! - Scheduled installment (standard amortization formula)
//! - Underwriting attributes consumed by the risk vector source
//!
//! CRITICAL: All money values are i64 (cents)

use crate::core::time::YearMonth;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating loan attributes
///
/// These are configuration errors: a loan with a missing or non-positive
/// term, rate or principal would corrupt every downstream balance, so the run
/// fails instead of defaulting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoanError {
    #[error("loan {loan_id}: missing required attribute '{field}'")]
    MissingAttribute { loan_id: String, field: &'static str },

    #[error("loan {loan_id}: term must be positive, got {term}")]
    NonPositiveTerm { loan_id: String, term: i64 },

    #[error("loan {loan_id}: interest rate must be positive and finite, got {rate}")]
    NonPositiveRate { loan_id: String, rate: f64 },

    #[error("loan {loan_id}: original principal must be positive, got {amount}")]
    NonPositivePrincipal { loan_id: String, amount: i64 },
}

/// Underwriting attributes captured at application time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Underwriting {
    pub fico_score: u16,
    /// Debt-to-income ratio as a fraction (0.35 = 35%)
    pub debt_to_income: f64,
    /// Annual income (whole currency units, not cents)
    pub annual_income: f64,
}

impl Default for Underwriting {
    fn default() -> Self {
        Self {
            fico_score: 700,
            debt_to_income: 0.30,
            annual_income: 60_000.0,
        }
    }
}

/// Raw loan attributes as handed over by an upstream loader
///
/// Every economic attribute is optional here so that a missing value is
/// reported as a [`LoanError::MissingAttribute`] instead of a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: String,
    pub application_id: String,
    pub origination_month: Option<YearMonth>,
    pub original_principal: Option<i64>,
    pub term_months: Option<i64>,
    pub annual_rate: Option<f64>,
    #[serde(default)]
    pub underwriting: Underwriting,
}

/// A funded loan
///
/// # Example
/// ```
/// use loan_tape_core_rs::{Loan, Underwriting, YearMonth};
///
/// let loan = Loan::new(
///     "LN-1".to_string(),
///     "APP-1".to_string(),
///     YearMonth::new(2022, 1).unwrap(),
///     1_200_000, // $12,000.00
///     36,
///     0.12,
///     Underwriting::default(),
/// ).unwrap();
///
/// assert_eq!(loan.fixed_schedule_payment(), 33_333);
/// assert_eq!(loan.scheduled_installment(), 39_857);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    id: String,
    application_id: String,
    origination_month: YearMonth,
    original_principal: i64,
    term_months: u32,
    annual_rate: f64,
    scheduled_installment: i64,
    underwriting: Underwriting,
}

impl Loan {
    /// Create a validated loan
    ///
    /// Rejects zero/negative term, rate and principal before any
    /// amortization math runs.
    pub fn new(
        id: String,
        application_id: String,
        origination_month: YearMonth,
        original_principal: i64,
        term_months: i64,
        annual_rate: f64,
        underwriting: Underwriting,
    ) -> Result<Self, LoanError> {
        if original_principal <= 0 {
            return Err(LoanError::NonPositivePrincipal {
                loan_id: id,
                amount: original_principal,
            });
        }
        if term_months <= 0 || term_months > u32::MAX as i64 {
            return Err(LoanError::NonPositiveTerm {
                loan_id: id,
                term: term_months,
            });
        }
        if !annual_rate.is_finite() || annual_rate <= 0.0 {
            return Err(LoanError::NonPositiveRate {
                loan_id: id,
                rate: annual_rate,
            });
        }

        let term_months = term_months as u32;
        let scheduled_installment =
            amortized_installment(original_principal, annual_rate, term_months);

        Ok(Self {
            id,
            application_id,
            origination_month,
            original_principal,
            term_months,
            annual_rate,
            scheduled_installment,
            underwriting,
        })
    }

    /// Build a loan from raw upstream attributes
    pub fn try_from_record(record: LoanRecord) -> Result<Self, LoanError> {
        let missing = |field: &'static str| LoanError::MissingAttribute {
            loan_id: record.loan_id.clone(),
            field,
        };

        let origination_month = record
            .origination_month
            .ok_or_else(|| missing("origination_month"))?;
        let original_principal = record
            .original_principal
            .ok_or_else(|| missing("original_principal"))?;
        let term_months = record.term_months.ok_or_else(|| missing("term_months"))?;
        let annual_rate = record.annual_rate.ok_or_else(|| missing("annual_rate"))?;

        Loan::new(
            record.loan_id,
            record.application_id,
            origination_month,
            original_principal,
            term_months,
            annual_rate,
            record.underwriting,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn origination_month(&self) -> YearMonth {
        self.origination_month
    }

    /// Original principal (cents)
    pub fn original_principal(&self) -> i64 {
        self.original_principal
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0
    }

    /// Installment from the amortization formula (cents)
    pub fn scheduled_installment(&self) -> i64 {
        self.scheduled_installment
    }

    pub fn underwriting(&self) -> &Underwriting {
        &self.underwriting
    }

    /// Fixed-schedule approximation of a performing payment: principal / term
    pub fn fixed_schedule_payment(&self) -> i64 {
        (self.original_principal as f64 / self.term_months as f64).round() as i64
    }

    /// Interest accrued over one month on `balance` (cents)
    pub fn monthly_interest(&self, balance: i64) -> i64 {
        (balance as f64 * self.monthly_rate()).round() as i64
    }

    /// Raw months on book at `month`; the origination month is month 1
    ///
    /// Zero or negative means the loan has not originated yet.
    pub fn months_on_book(&self, month: YearMonth) -> i64 {
        month.months_since(self.origination_month) + 1
    }

    pub fn is_originated_by(&self, month: YearMonth) -> bool {
        self.origination_month <= month
    }
}

/// Level installment: `P·r(1+r)^n / ((1+r)^n − 1)`, rounded to cents
pub fn amortized_installment(principal: i64, annual_rate: f64, term_months: u32) -> i64 {
    let r = annual_rate / 12.0;
    let n = term_months as i32;
    let growth = (1.0 + r).powi(n);
    let payment = principal as f64 * (r * growth) / (growth - 1.0);
    payment.round() as i64
}
