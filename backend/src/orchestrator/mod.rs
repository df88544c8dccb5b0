//! Orchestrator - main simulation loop
//!
//! Wires funding, risk, scheduling, transitions and reporting into one
//! batch run. See `engine.rs` for the tick loop.

pub mod config;
pub mod engine;
pub mod summary;

// Re-export main types for convenience
pub use config::{ConfigError, SimulationConfig};
pub use engine::{Orchestrator, SimulationError, SimulationOutput, TickResult};
pub use summary::{compute_config_hash, compute_panel_digest, OutcomeCounts, RunSummary};
