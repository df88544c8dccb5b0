//! Output recording: payment ledger emitter and snapshot recorder
//!
//! Both append into column-oriented arenas once per tick and are
//! materialized into record sequences at the end of the run.

pub mod payments;
pub mod snapshots;

pub use payments::{ledger_entry, PaymentLedger};
pub use snapshots::SnapshotRecorder;
