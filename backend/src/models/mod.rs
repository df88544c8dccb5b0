//! Domain models for the loan tape simulator

pub mod application;
pub mod event;
pub mod loan;
pub mod payment;
pub mod snapshot;
pub mod state;

// Re-exports
pub use application::ApplicationRecord;
pub use event::{Event, EventLog};
pub use loan::{Loan, LoanError, LoanRecord, Underwriting};
pub use payment::{PaymentRecord, PaymentStatus};
pub use snapshot::MonthlySnapshot;
pub use state::LoanState;
