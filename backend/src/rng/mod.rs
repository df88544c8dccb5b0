//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, reproducible draws.
//! CRITICAL: Every draw in a run (funding, archetype labels, forced payoff
//! offsets, monthly transitions) MUST go through one `RngManager`.

mod xorshift;

pub use xorshift::RngManager;
