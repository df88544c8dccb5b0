//! Application record as received from the upstream loader
//!
//! Only the attributes the funding stage needs. Underwriting fields are
//! optional so a missing value surfaces as a descriptive error for that
//! application rather than a deserialization failure for the whole file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: String,
    pub decision_status: String,
    #[serde(default)]
    pub annual_income: Option<f64>,
    #[serde(default, alias = "fico_score_at_application")]
    pub fico_score: Option<u16>,
    #[serde(default, alias = "debt_to_income_ratio")]
    pub debt_to_income: Option<f64>,
}

impl ApplicationRecord {
    /// Decision status comparison is case-insensitive
    pub fn is_approved(&self) -> bool {
        self.decision_status.trim().eq_ignore_ascii_case("APPROVED")
    }
}
