//! Built-in archetype model
//!
//! A deterministic risk vector source with eight behavioral archetypes.
//! Risk vectors are a softmax over per-archetype scores driven by FICO and
//! debt-to-income; base transition curves are simple age-shaped rates.
//! It exists so that runs and tests do not need an external predictor; it
//! makes no claim to economic fidelity.

use super::{ArchetypeCatalog, RiskVectorSource, TransitionParams};
use crate::models::loan::Loan;

pub const PRIME_ON_TIME: &str = "PRIME_ON_TIME";
pub const STEADY_PAYER: &str = "STEADY_PAYER";
pub const EARLY_PREPAY: &str = "EARLY_PREPAY";
pub const MID_PREPAY: &str = "MID_PREPAY";
pub const LATE_PREPAY: &str = "LATE_PREPAY";
pub const CURE_CYCLER: &str = "CURE_CYCLER";
pub const LATE_STAGE_DEFAULT: &str = "LATE_STAGE_DEFAULT";
pub const ROLL_TO_CHARGEOFF: &str = "ROLL_TO_CHARGEOFF";

/// Per-archetype profile: score coefficients and base monthly rates
struct Profile {
    label: &'static str,
    /// softmax score = intercept + fico_coef·z_fico + dti_coef·z_dti
    intercept: f64,
    fico_coef: f64,
    dti_coef: f64,
    /// Peak CURRENT → DPD30 rate
    delinquency: f64,
    /// Month on book where delinquency peaks
    delinquency_peak: f64,
    payoff: f64,
    roll_30_60: f64,
    cure_30: f64,
    roll_forward: f64,
}

const PROFILES: [Profile; 8] = [
    Profile {
        label: PRIME_ON_TIME,
        intercept: 1.2,
        fico_coef: 1.0,
        dti_coef: -0.6,
        delinquency: 0.002,
        delinquency_peak: 18.0,
        payoff: 0.004,
        roll_30_60: 0.10,
        cure_30: 0.70,
        roll_forward: 0.20,
    },
    Profile {
        label: STEADY_PAYER,
        intercept: 1.0,
        fico_coef: 0.3,
        dti_coef: -0.2,
        delinquency: 0.008,
        delinquency_peak: 14.0,
        payoff: 0.003,
        roll_30_60: 0.20,
        cure_30: 0.55,
        roll_forward: 0.30,
    },
    Profile {
        label: EARLY_PREPAY,
        intercept: 0.2,
        fico_coef: 0.6,
        dti_coef: -0.3,
        delinquency: 0.003,
        delinquency_peak: 10.0,
        payoff: 0.010,
        roll_30_60: 0.10,
        cure_30: 0.70,
        roll_forward: 0.20,
    },
    Profile {
        label: MID_PREPAY,
        intercept: 0.2,
        fico_coef: 0.4,
        dti_coef: -0.2,
        delinquency: 0.004,
        delinquency_peak: 14.0,
        payoff: 0.008,
        roll_30_60: 0.15,
        cure_30: 0.65,
        roll_forward: 0.25,
    },
    Profile {
        label: LATE_PREPAY,
        intercept: 0.1,
        fico_coef: 0.3,
        dti_coef: -0.1,
        delinquency: 0.005,
        delinquency_peak: 20.0,
        payoff: 0.006,
        roll_30_60: 0.15,
        cure_30: 0.60,
        roll_forward: 0.25,
    },
    Profile {
        label: CURE_CYCLER,
        intercept: -0.3,
        fico_coef: -0.3,
        dti_coef: 0.4,
        delinquency: 0.040,
        delinquency_peak: 12.0,
        payoff: 0.002,
        roll_30_60: 0.15,
        cure_30: 0.70,
        roll_forward: 0.35,
    },
    Profile {
        label: LATE_STAGE_DEFAULT,
        intercept: -0.8,
        fico_coef: -0.7,
        dti_coef: 0.6,
        delinquency: 0.030,
        delinquency_peak: 24.0,
        payoff: 0.001,
        roll_30_60: 0.45,
        cure_30: 0.25,
        roll_forward: 0.60,
    },
    Profile {
        label: ROLL_TO_CHARGEOFF,
        intercept: -1.2,
        fico_coef: -1.0,
        dti_coef: 0.8,
        delinquency: 0.060,
        delinquency_peak: 8.0,
        payoff: 0.001,
        roll_30_60: 0.70,
        cure_30: 0.10,
        roll_forward: 0.80,
    },
];

/// Reference implementation of [`RiskVectorSource`]
///
/// # Example
/// ```
/// use loan_tape_core_rs::risk::{ReferenceArchetypeModel, RiskVectorSource};
///
/// let model = ReferenceArchetypeModel::new();
/// let catalog = model.archetype_catalog();
/// assert_eq!(catalog.len(), 8);
///
/// let params = model.base_transition_parameters("ROLL_TO_CHARGEOFF", 8);
/// assert!(params.p_roll_forward > 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReferenceArchetypeModel;

impl ReferenceArchetypeModel {
    pub fn new() -> Self {
        Self
    }

    fn profile(label: &str) -> Option<&'static Profile> {
        PROFILES.iter().find(|p| p.label == label)
    }

    /// Softmax of archetype scores for one set of underwriting attributes
    pub fn risk_vector(fico_score: u16, debt_to_income: f64) -> Vec<f64> {
        let z_fico = (fico_score as f64 - 700.0) / 50.0;
        let z_dti = (debt_to_income - 0.30) * 10.0;

        let scores: Vec<f64> = PROFILES
            .iter()
            .map(|p| p.intercept + p.fico_coef * z_fico + p.dti_coef * z_dti)
            .collect();
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        exps.into_iter().map(|e| e / total).collect()
    }
}

impl RiskVectorSource for ReferenceArchetypeModel {
    fn archetype_catalog(&self) -> ArchetypeCatalog {
        // Profile labels are unique constants, no validation needed
        ArchetypeCatalog {
            labels: PROFILES.iter().map(|p| p.label.to_string()).collect(),
            early_prepay: None,
            mid_prepay: None,
            late_prepay: None,
        }
        .with_prepay_markers(Some(EARLY_PREPAY), Some(MID_PREPAY), Some(LATE_PREPAY))
    }

    fn predict_risk_vectors(&self, loans: &[Loan]) -> Vec<Vec<f64>> {
        loans
            .iter()
            .map(|loan| {
                let uw = loan.underwriting();
                Self::risk_vector(uw.fico_score, uw.debt_to_income)
            })
            .collect()
    }

    fn base_transition_parameters(&self, archetype: &str, age_months: usize) -> TransitionParams {
        let profile = match Self::profile(archetype) {
            Some(p) => p,
            None => return TransitionParams::ZERO,
        };

        let age = age_months as f64;
        // Delinquency hump around the archetype's peak month
        let spread = (age - profile.delinquency_peak) / 12.0;
        let hump = 0.4 + 0.6 * (-spread * spread).exp();
        // Voluntary payoff ramps up over the first two years
        let payoff_ramp = (age / 24.0).min(1.0);

        TransitionParams {
            p_current_to_30: profile.delinquency * hump,
            p_current_to_paid: profile.payoff * payoff_ramp,
            p_30_to_60: profile.roll_30_60,
            p_30_to_cure: profile.cure_30,
            p_roll_forward: profile.roll_forward,
        }
    }
}
