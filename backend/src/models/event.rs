//! Event logging for run auditing.
//!
//! The event log is a tick-level audit trail of a simulation run: funding
//! totals, per-tick transition counts, skipped ticks and notable first
//! occurrences. Loan-level facts live in the snapshot and payment outputs;
//! the log explains how the run got there.
//!
//! # Example
//!
//! ```rust
//! use loan_tape_core_rs::models::event::{Event, EventLog};
//! use loan_tape_core_rs::YearMonth;
//!
//! let mut log = EventLog::new();
//! log.log(Event::TickSkipped {
//!     tick: 3,
//!     month: YearMonth::new(2022, 4).unwrap(),
//! });
//! assert_eq!(log.events_of_type("TickSkipped").len(), 1);
//! ```

use crate::core::time::YearMonth;
use crate::transitions::TransitionCounts;
use serde::Serialize;

/// Simulation event capturing a run-level state change.
///
/// All events carry the tick (0-based month index) for temporal ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Funding stage finished
    LoansFunded {
        tick: usize,
        approved: usize,
        funded: usize,
        forced_payoffs_scheduled: usize,
    },

    /// No originated, non-terminal loan existed this month
    TickSkipped { tick: usize, month: YearMonth },

    /// A month was simulated and committed
    TickCompleted {
        tick: usize,
        month: YearMonth,
        active: usize,
        reported: usize,
        payments: usize,
        transitions: TransitionCounts,
    },

    /// Blended probabilities exceeded 1 for some loans and were rescaled
    ProbabilitiesRenormalized {
        tick: usize,
        month: YearMonth,
        loans: usize,
    },

    /// First month in the run where a scheduled payoff fired
    FirstForcedPayoff {
        tick: usize,
        month: YearMonth,
        loans: usize,
    },
}

impl Event {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> usize {
        match self {
            Event::LoansFunded { tick, .. } => *tick,
            Event::TickSkipped { tick, .. } => *tick,
            Event::TickCompleted { tick, .. } => *tick,
            Event::ProbabilitiesRenormalized { tick, .. } => *tick,
            Event::FirstForcedPayoff { tick, .. } => *tick,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::LoansFunded { .. } => "LoansFunded",
            Event::TickSkipped { .. } => "TickSkipped",
            Event::TickCompleted { .. } => "TickCompleted",
            Event::ProbabilitiesRenormalized { .. } => "ProbabilitiesRenormalized",
            Event::FirstForcedPayoff { .. } => "FirstForcedPayoff",
        }
    }

    /// Calendar month of the event, if it belongs to a simulated month
    pub fn month(&self) -> Option<YearMonth> {
        match self {
            Event::LoansFunded { .. } => None,
            Event::TickSkipped { month, .. }
            | Event::TickCompleted { month, .. }
            | Event::ProbabilitiesRenormalized { month, .. }
            | Event::FirstForcedPayoff { month, .. } => Some(*month),
        }
    }
}

/// Event log for storing and querying simulation events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Sum the transition counts of every completed tick
    pub fn total_transitions(&self) -> TransitionCounts {
        let mut total = TransitionCounts::default();
        for event in &self.events {
            if let Event::TickCompleted { transitions, .. } = event {
                total.add(transitions);
            }
        }
        total
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
