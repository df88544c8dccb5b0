//! Funding stage: approved applications → immutable loans
//!
//! Deterministic given the RNG state. Draws, in order:
//!
//! 1. one take-rate draw per approved application, in input order
//! 2. one origination-month draw per funded application, in funded order
//!
//! Loan terms come from the application's underwriting attributes:
//! principal is a share of annual income (clamped), the annual rate follows
//! a linear pricing curve in FICO and DTI (clamped), and the scheduled
//! installment uses the level-payment amortization formula.

use crate::core::time::YearMonth;
use crate::models::application::ApplicationRecord;
use crate::models::loan::{Loan, LoanError, Underwriting};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FundingError {
    #[error("application {application_id}: missing required attribute '{field}'")]
    MissingAttribute {
        application_id: String,
        field: &'static str,
    },

    #[error("application {application_id}: invalid {field} {value}")]
    InvalidAttribute {
        application_id: String,
        field: &'static str,
        value: f64,
    },

    #[error(transparent)]
    Loan(#[from] LoanError),
}

/// Annual rate as a linear function of FICO and DTI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingCurve {
    pub base_rate: f64,
    /// FICO at which the FICO adjustment is zero
    pub anchor_fico: f64,
    /// Rate added per FICO point below the anchor
    pub fico_slope: f64,
    /// Rate added per unit of DTI
    pub dti_slope: f64,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for PricingCurve {
    fn default() -> Self {
        Self {
            base_rate: 0.15,
            anchor_fico: 750.0,
            fico_slope: 0.0001,
            dti_slope: 0.10,
            min_rate: 0.06,
            max_rate: 0.25,
        }
    }
}

impl PricingCurve {
    /// # Example
    /// ```
    /// use loan_tape_core_rs::funding::PricingCurve;
    ///
    /// let curve = PricingCurve::default();
    /// assert!((curve.price(750, 0.0) - 0.15).abs() < 1e-12);
    /// assert!((curve.price(650, 0.30) - 0.19).abs() < 1e-12);
    /// assert_eq!(curve.price(300, 2.0), 0.25);
    /// ```
    pub fn price(&self, fico_score: u16, debt_to_income: f64) -> f64 {
        let fico_adjustment = (self.anchor_fico - fico_score as f64) * self.fico_slope;
        let dti_adjustment = debt_to_income * self.dti_slope;
        (self.base_rate + fico_adjustment + dti_adjustment).clamp(self.min_rate, self.max_rate)
    }
}

/// How approved applications are turned into loans
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingRule {
    /// Probability an approved application is funded
    pub take_rate: f64,
    /// Original principal as a share of annual income
    pub income_share: f64,
    pub min_principal_cents: i64,
    pub max_principal_cents: i64,
    pub term_months: i64,
    pub pricing: PricingCurve,
}

impl Default for FundingRule {
    fn default() -> Self {
        Self {
            take_rate: 0.90,
            income_share: 0.15,
            min_principal_cents: 100_000,
            max_principal_cents: 5_000_000,
            term_months: 36,
            pricing: PricingCurve::default(),
        }
    }
}

impl FundingRule {
    /// Original principal in cents for a given annual income
    pub fn principal_cents(&self, annual_income: f64) -> i64 {
        let cents = (annual_income * self.income_share * 100.0).round() as i64;
        cents.clamp(self.min_principal_cents, self.max_principal_cents)
    }
}

/// Inclusive range of calendar months loans may originate in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginationWindow {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl Default for OriginationWindow {
    /// Calendar year 2022
    fn default() -> Self {
        let jan_2022 = YearMonth::from_ordinal(2022 * 12);
        Self {
            start: jan_2022,
            end: jan_2022.add_months(11),
        }
    }
}

impl OriginationWindow {
    pub fn months(&self) -> i64 {
        self.end.months_since(self.start) + 1
    }

    fn sample(&self, rng: &mut RngManager) -> YearMonth {
        self.start.add_months(rng.range(0, self.months()))
    }
}

/// Result of the funding stage
#[derive(Debug, Clone)]
pub struct FundingOutcome {
    pub loans: Vec<Loan>,
    pub approved: usize,
}

/// Fund the approved applications
///
/// Applications that are not approved are skipped without consuming a draw.
/// A funded application with missing or invalid underwriting attributes
/// fails the whole stage.
pub fn fund_applications(
    applications: &[ApplicationRecord],
    rule: &FundingRule,
    window: &OriginationWindow,
    rng: &mut RngManager,
) -> Result<FundingOutcome, FundingError> {
    let approved: Vec<&ApplicationRecord> =
        applications.iter().filter(|app| app.is_approved()).collect();

    let funded: Vec<&ApplicationRecord> = approved
        .iter()
        .copied()
        .filter(|_| rng.next_f64() < rule.take_rate)
        .collect();

    let mut loans = Vec::with_capacity(funded.len());
    for app in funded {
        let origination_month = window.sample(rng);
        loans.push(fund_one(app, origination_month, rule)?);
    }

    Ok(FundingOutcome {
        loans,
        approved: approved.len(),
    })
}

fn fund_one(
    app: &ApplicationRecord,
    origination_month: YearMonth,
    rule: &FundingRule,
) -> Result<Loan, FundingError> {
    let missing = |field: &'static str| FundingError::MissingAttribute {
        application_id: app.application_id.clone(),
        field,
    };
    let invalid = |field: &'static str, value: f64| FundingError::InvalidAttribute {
        application_id: app.application_id.clone(),
        field,
        value,
    };

    let annual_income = app.annual_income.ok_or_else(|| missing("annual_income"))?;
    let fico_score = app.fico_score.ok_or_else(|| missing("fico_score"))?;
    let debt_to_income = app.debt_to_income.ok_or_else(|| missing("debt_to_income"))?;

    if !annual_income.is_finite() || annual_income < 0.0 {
        return Err(invalid("annual_income", annual_income));
    }
    if !debt_to_income.is_finite() || debt_to_income < 0.0 {
        return Err(invalid("debt_to_income", debt_to_income));
    }

    let loan = Loan::new(
        format!("LN-{}", app.application_id),
        app.application_id.clone(),
        origination_month,
        rule.principal_cents(annual_income),
        rule.term_months,
        rule.pricing.price(fico_score, debt_to_income),
        Underwriting {
            fico_score,
            debt_to_income,
            annual_income,
        },
    )?;

    Ok(loan)
}
