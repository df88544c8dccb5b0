//! Simulation configuration
//!
//! Every field has a default, so a JSON file only needs to name what it
//! changes:
//!
//! ```json
//! { "seed": 7, "start_month": "2022-01", "end_month": "2023-12" }
//! ```

use crate::core::time::YearMonth;
use crate::funding::{FundingRule, OriginationWindow};
use crate::schedule::{ForcedPayoffWindows, MonthWindow};
use crate::transitions::{AmortizationRule, SeasoningRule};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the single run-wide generator
    pub seed: u64,
    /// First simulated calendar month
    pub start_month: YearMonth,
    /// Last simulated calendar month (inclusive)
    pub end_month: YearMonth,
    /// Months funded loans may originate in
    pub origination: OriginationWindow,
    /// Oldest age modeled by the transition surface; older loans clamp here
    pub max_age: u32,
    pub seasoning: SeasoningRule,
    pub amortization: AmortizationRule,
    pub funding: FundingRule,
    pub forced_payoffs: ForcedPayoffWindows,
    /// Keep the tick-level event log in the output
    pub record_events: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let jan_2022 = YearMonth::from_ordinal(2022 * 12);
        Self {
            seed: 42,
            start_month: jan_2022,
            end_month: jan_2022.add_months(35),
            origination: OriginationWindow::default(),
            max_age: 60,
            seasoning: SeasoningRule::default(),
            amortization: AmortizationRule::default(),
            funding: FundingRule::default(),
            forced_payoffs: ForcedPayoffWindows::default(),
            record_events: true,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Number of simulated months
    pub fn months(&self) -> usize {
        (self.end_month.months_since(self.start_month) + 1).max(0) as usize
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.end_month < self.start_month {
            return invalid(format!(
                "end_month {} is before start_month {}",
                self.end_month, self.start_month
            ));
        }
        if self.origination.end < self.origination.start {
            return invalid(format!(
                "origination window end {} is before start {}",
                self.origination.end, self.origination.start
            ));
        }
        if self.max_age == 0 {
            return invalid("max_age must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.seasoning.factor) {
            return invalid(format!(
                "seasoning factor must be within [0, 1], got {}",
                self.seasoning.factor
            ));
        }
        if !(0.0..1.0).contains(&self.amortization.paydown_rate) {
            return invalid(format!(
                "paydown_rate must be within [0, 1), got {}",
                self.amortization.paydown_rate
            ));
        }
        if self.amortization.payoff_floor_cents < 0 {
            return invalid("payoff_floor_cents must not be negative".into());
        }

        let funding = &self.funding;
        if !(0.0..=1.0).contains(&funding.take_rate) {
            return invalid(format!(
                "take_rate must be within [0, 1], got {}",
                funding.take_rate
            ));
        }
        if !(funding.income_share > 0.0) {
            return invalid("income_share must be positive".into());
        }
        if funding.min_principal_cents <= 0
            || funding.min_principal_cents > funding.max_principal_cents
        {
            return invalid(format!(
                "principal bounds [{}, {}] are not a positive range",
                funding.min_principal_cents, funding.max_principal_cents
            ));
        }
        if funding.term_months <= 0 {
            return invalid(format!(
                "term_months must be positive, got {}",
                funding.term_months
            ));
        }
        if !(funding.pricing.min_rate > 0.0) || funding.pricing.min_rate > funding.pricing.max_rate
        {
            return invalid(format!(
                "rate bounds [{}, {}] are not a positive range",
                funding.pricing.min_rate, funding.pricing.max_rate
            ));
        }

        let windows: [(&str, MonthWindow); 3] = [
            ("early", self.forced_payoffs.early),
            ("mid", self.forced_payoffs.mid),
            ("late", self.forced_payoffs.late),
        ];
        for (name, window) in windows {
            if !window.is_valid() {
                return invalid(format!(
                    "{} forced payoff window [{}, {}] is empty or starts before month 1",
                    name, window.min, window.max
                ));
            }
        }

        Ok(())
    }
}
