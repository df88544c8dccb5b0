//! Transition modeling: surface table, dynamic blender, state machine
//!
//! Per tick the engine looks up the surface at each active loan's age,
//! blends it by the loan's risk vector ([`blender`]), and hands the blended
//! parameters to the population step ([`machine`]), which draws one uniform
//! per loan and produces the next state buffers.

pub mod blender;
pub mod machine;
pub mod surface;

use serde::{Deserialize, Serialize};

pub use blender::{blend, blend_population, BlendedBatch, SeasoningRule};
pub use machine::{next_state, step_population, AmortizationRule, TickOutcome};
pub use surface::TransitionSurface;

/// Number of state changes of each kind in one or more ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCounts {
    pub to_dpd30: usize,
    pub to_dpd60: usize,
    pub to_dpd90: usize,
    /// DPD30 → CURRENT
    pub cures: usize,
    pub charge_offs: usize,
    /// CURRENT → PAID_OFF by draw
    pub probabilistic_payoffs: usize,
    /// Scheduled payoff overrides
    pub forced_payoffs: usize,
    /// Balance fell below the payoff floor
    pub natural_payoffs: usize,
}

impl TransitionCounts {
    pub fn add(&mut self, other: &TransitionCounts) {
        self.to_dpd30 += other.to_dpd30;
        self.to_dpd60 += other.to_dpd60;
        self.to_dpd90 += other.to_dpd90;
        self.cures += other.cures;
        self.charge_offs += other.charge_offs;
        self.probabilistic_payoffs += other.probabilistic_payoffs;
        self.forced_payoffs += other.forced_payoffs;
        self.natural_payoffs += other.natural_payoffs;
    }

    pub fn payoffs(&self) -> usize {
        self.probabilistic_payoffs + self.forced_payoffs + self.natural_payoffs
    }

    pub fn total(&self) -> usize {
        self.to_dpd30 + self.to_dpd60 + self.to_dpd90 + self.cures + self.charge_offs + self.payoffs()
    }
}
