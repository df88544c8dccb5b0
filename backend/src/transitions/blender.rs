//! Dynamic blender
//!
//! A loan's effective transition parameters are the mixture of every
//! archetype's surface row at the loan's age, weighted by its risk vector.
//! It is a dot product per loan, never a pick of one archetype.
//!
//! Seasoning: young loans (fewer than `SeasoningRule::months` on book) have
//! the CURRENT → DPD30 component scaled by `SeasoningRule::factor`.

use super::surface::TransitionSurface;
use crate::risk::{RiskMatrix, TransitionParams};
use serde::{Deserialize, Serialize};

/// Early-life delinquency suppression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasoningRule {
    /// Loans with months on book strictly below this are suppressed
    pub months: u32,
    /// Multiplier applied to CURRENT → DPD30 during seasoning
    pub factor: f64,
}

impl Default for SeasoningRule {
    fn default() -> Self {
        Self {
            months: 4,
            factor: 0.10,
        }
    }
}

impl SeasoningRule {
    pub fn applies(&self, months_on_book: usize) -> bool {
        months_on_book < self.months as usize
    }

    /// Apply the suppression to a blended parameter set
    pub fn apply(&self, months_on_book: usize, params: &mut TransitionParams) {
        if self.applies(months_on_book) {
            params.p_current_to_30 *= self.factor;
        }
    }
}

/// Weighted mixture of the surface row at `age` by `weights`
pub fn blend(surface: &TransitionSurface, weights: &[f64], age: usize) -> TransitionParams {
    let mut blended = TransitionParams::ZERO;
    for (params, weight) in surface.row(age).iter().zip(weights.iter()) {
        if *weight != 0.0 {
            blended.add_weighted(params, *weight);
        }
    }
    blended
}

/// Effective parameters for a batch of loans at one tick
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedBatch {
    /// Aligned with the `active` slice passed to [`blend_population`]
    pub params: Vec<TransitionParams>,
    /// Loans whose blended outflow exceeded 1 and had to be rescaled
    pub renormalized: usize,
}

/// Blend, season and guard the parameters of every active loan
///
/// `active` holds loan indices into `risk`; `months_on_book` holds each
/// active loan's raw months on book, aligned with `active`. Seasoning reads
/// the raw value; the surface lookup clamps it to the modeled maximum age.
pub fn blend_population(
    surface: &TransitionSurface,
    risk: &RiskMatrix,
    active: &[usize],
    months_on_book: &[i64],
    seasoning: &SeasoningRule,
) -> BlendedBatch {
    debug_assert_eq!(active.len(), months_on_book.len());

    let mut renormalized = 0;
    let params = active
        .iter()
        .zip(months_on_book.iter())
        .map(|(&loan_idx, &mob)| {
            let age = mob.max(0) as usize;
            let mut p = blend(surface, risk.row(loan_idx), age);
            seasoning.apply(age, &mut p);
            let (guarded, rescaled) = p.normalized();
            if rescaled {
                renormalized += 1;
            }
            guarded
        })
        .collect();

    BlendedBatch {
        params,
        renormalized,
    }
}
