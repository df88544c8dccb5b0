//! Loan Tape Simulator Core - Rust Engine
//!
//! Synthesizes monthly loan-performance histories for a funded population
//! with deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Calendar months and the simulation clock
//! - **models**: Domain types (Loan, LoanState, snapshots, payments, events)
//! - **funding**: Approved applications → loans
//! - **risk**: Risk vector source trait and the built-in archetype model
//! - **schedule**: Discrete archetype labels and forced payoff scheduling
//! - **transitions**: Surface table, dynamic blender, delinquency state machine
//! - **reporting**: Snapshot recorder and payment ledger emitter
//! - **orchestrator**: Configuration, main simulation loop, run summary
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents)
//! 2. All randomness is deterministic (one seeded RNG per run)
//! 3. Loan state vectors only change through the atomic per-tick commit

// Module declarations
pub mod core;
pub mod funding;
pub mod models;
pub mod orchestrator;
pub mod reporting;
pub mod risk;
pub mod rng;
pub mod schedule;
pub mod transitions;

// Re-exports for convenience
pub use core::time::{MonthError, TimeManager, YearMonth};
pub use funding::{FundingError, FundingRule, OriginationWindow, PricingCurve};
pub use models::{
    application::ApplicationRecord,
    event::{Event, EventLog},
    loan::{Loan, LoanError, LoanRecord, Underwriting},
    payment::{PaymentRecord, PaymentStatus},
    snapshot::MonthlySnapshot,
    state::LoanState,
};
pub use orchestrator::{
    ConfigError, Orchestrator, RunSummary, SimulationConfig, SimulationError, SimulationOutput,
    TickResult,
};
pub use risk::{
    ArchetypeCatalog, ReferenceArchetypeModel, RiskSourceError, RiskVectorSource, TransitionParams,
};
pub use rng::RngManager;
pub use schedule::{ForcedEventSchedule, ForcedPayoffWindows};
pub use transitions::{AmortizationRule, SeasoningRule, TransitionCounts};
