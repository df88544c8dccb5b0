//! Orchestrator engine: the monthly simulation loop
//!
//! # Lifecycle
//!
//! 1. **Setup** (`new` / `from_applications`): fund loans, validate risk
//!    vectors, build the transition surface, draw archetype labels and
//!    schedule forced payoffs
//! 2. **Tick** (`tick`), once per calendar month:
//!    - capture the prior state (once)
//!    - select active loans: originated and not terminal
//!    - blend surface rows by risk vector, apply seasoning, guard
//!    - one draw per active loan; forced payoffs; amortization
//!    - atomic commit
//!    - snapshots and ledger entries for every reported loan
//! 3. **Finish** (`run` / `finish`): materialize the arenas, fingerprint
//!    the panel, summarize
//!
//! # Example
//!
//! ```rust
//! use loan_tape_core_rs::orchestrator::{Orchestrator, SimulationConfig};
//! use loan_tape_core_rs::risk::ReferenceArchetypeModel;
//! use loan_tape_core_rs::{Loan, Underwriting, YearMonth};
//!
//! let config = SimulationConfig {
//!     start_month: YearMonth::new(2022, 1).unwrap(),
//!     end_month: YearMonth::new(2022, 12).unwrap(),
//!     ..SimulationConfig::default()
//! };
//! let loans = vec![Loan::new(
//!     "LN-1".into(),
//!     "APP-1".into(),
//!     YearMonth::new(2022, 1).unwrap(),
//!     1_200_000,
//!     36,
//!     0.12,
//!     Underwriting::default(),
//! ).unwrap()];
//!
//! let model = ReferenceArchetypeModel::new();
//! let output = Orchestrator::new(config, loans, &model).unwrap().run().unwrap();
//!
//! assert!(!output.snapshots.is_empty());
//! assert_eq!(output.summary.loans_funded, 1);
//! ```

use crate::core::time::{MonthError, TimeManager, YearMonth};
use crate::funding::{fund_applications, FundingError};
use crate::models::application::ApplicationRecord;
use crate::models::event::{Event, EventLog};
use crate::models::loan::{Loan, LoanError, LoanRecord};
use crate::models::payment::{PaymentRecord, PaymentStatus};
use crate::models::snapshot::MonthlySnapshot;
use crate::models::state::PopulationState;
use crate::orchestrator::config::{ConfigError, SimulationConfig};
use crate::orchestrator::summary::{
    compute_config_hash, compute_panel_digest, OutcomeCounts, RunSummary,
};
use crate::reporting::{PaymentLedger, SnapshotRecorder};
use crate::risk::{ArchetypeCatalog, RiskMatrix, RiskSourceError, RiskVectorSource};
use crate::rng::RngManager;
use crate::schedule::{sample_archetype_labels, schedule_forced_payoffs, ForcedEventSchedule};
use crate::transitions::{blend_population, step_population, TransitionCounts, TransitionSurface};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Errors
// ============================================================================

/// Run-level error; every fallible public operation returns it
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Loan(#[from] LoanError),

    #[error(transparent)]
    Funding(#[from] FundingError),

    #[error(transparent)]
    RiskSource(#[from] RiskSourceError),

    #[error(transparent)]
    Month(#[from] MonthError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("simulation already finished after {ticks} ticks")]
    RunFinished { ticks: usize },
}

// ============================================================================
// Results
// ============================================================================

/// What happened in one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    pub tick: usize,
    pub month: YearMonth,
    /// Originated, non-terminal loans at the start of the month
    pub active: usize,
    /// Snapshots written
    pub reported: usize,
    /// Ledger entries written
    pub payments: usize,
    /// No active loan existed; nothing was drawn
    pub skipped: bool,
    pub transitions: TransitionCounts,
}

/// Fully materialized output of a batch run
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub snapshots: Vec<MonthlySnapshot>,
    pub payments: Vec<PaymentRecord>,
    pub summary: RunSummary,
    pub event_log: EventLog,
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator {
    config: SimulationConfig,
    config_hash: String,
    loans: Vec<Loan>,
    applications_approved: usize,
    catalog: ArchetypeCatalog,
    risk: RiskMatrix,
    surface: TransitionSurface,
    schedule: ForcedEventSchedule,
    population: PopulationState,
    time: TimeManager,
    rng: RngManager,
    snapshots: SnapshotRecorder,
    ledger: PaymentLedger,
    event_log: EventLog,
    /// Set the first tick a scheduled payoff fires
    first_forced_payoff_seen: bool,
    skipped_ticks: usize,
    totals: TransitionCounts,
}

impl Orchestrator {
    /// Set up a run over already-funded loans
    pub fn new(
        config: SimulationConfig,
        loans: Vec<Loan>,
        source: &dyn RiskVectorSource,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let rng = RngManager::new(config.seed);
        let approved = loans.len();
        Self::assemble(config, loans, approved, source, rng)
    }

    /// Validate raw upstream loan records, then set up the run
    ///
    /// The first record with a missing or non-positive term, rate or
    /// principal fails the run.
    pub fn from_loan_records(
        config: SimulationConfig,
        records: Vec<LoanRecord>,
        source: &dyn RiskVectorSource,
    ) -> Result<Self, SimulationError> {
        let loans = records
            .into_iter()
            .map(Loan::try_from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(config, loans, source)
    }

    /// Fund approved applications, then set up the run
    pub fn from_applications(
        config: SimulationConfig,
        applications: &[ApplicationRecord],
        source: &dyn RiskVectorSource,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut rng = RngManager::new(config.seed);
        let funded = fund_applications(applications, &config.funding, &config.origination, &mut rng)?;
        Self::assemble(config, funded.loans, funded.approved, source, rng)
    }

    fn assemble(
        config: SimulationConfig,
        loans: Vec<Loan>,
        applications_approved: usize,
        source: &dyn RiskVectorSource,
        mut rng: RngManager,
    ) -> Result<Self, SimulationError> {
        let config_hash = compute_config_hash(&config)?;

        let catalog = source.archetype_catalog();
        if catalog.is_empty() {
            return Err(RiskSourceError::EmptyCatalog.into());
        }
        let rows = source.predict_risk_vectors(&loans);
        let risk = RiskMatrix::from_rows(rows, loans.len(), catalog.len())?;

        let surface = TransitionSurface::build(source, &catalog, config.max_age as usize);
        info!(
            max_age = config.max_age,
            archetypes = catalog.len(),
            "transition surface built"
        );

        let labels = sample_archetype_labels(&risk, &mut rng);
        let schedule = schedule_forced_payoffs(&labels, &catalog, &config.forced_payoffs, &mut rng);

        info!(
            approved = applications_approved,
            funded = loans.len(),
            forced_payoffs = schedule.scheduled_count(),
            "loan book ready"
        );

        let population = PopulationState::new(loans.iter().map(Loan::original_principal).collect());
        // At most one snapshot and one ledger entry per loan per month
        let panel_capacity = loans.len() * config.months();
        let snapshots = SnapshotRecorder::with_capacity(loans.len(), config.max_age, panel_capacity);
        let time = TimeManager::new(config.start_month, config.end_month);

        let mut orchestrator = Self {
            config_hash,
            applications_approved,
            catalog,
            risk,
            surface,
            schedule,
            population,
            time,
            rng,
            snapshots,
            ledger: PaymentLedger::with_capacity(panel_capacity),
            event_log: EventLog::new(),
            first_forced_payoff_seen: false,
            skipped_ticks: 0,
            totals: TransitionCounts::default(),
            loans,
            config,
        };

        orchestrator.log_event(Event::LoansFunded {
            tick: 0,
            approved: orchestrator.applications_approved,
            funded: orchestrator.loans.len(),
            forced_payoffs_scheduled: orchestrator.schedule.scheduled_count(),
        });

        Ok(orchestrator)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn catalog(&self) -> &ArchetypeCatalog {
        &self.catalog
    }

    pub fn risk_matrix(&self) -> &RiskMatrix {
        &self.risk
    }

    pub fn surface(&self) -> &TransitionSurface {
        &self.surface
    }

    pub fn forced_schedule(&self) -> &ForcedEventSchedule {
        &self.schedule
    }

    pub fn population(&self) -> &PopulationState {
        &self.population
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn current_tick(&self) -> usize {
        self.time.current_tick()
    }

    pub fn current_month(&self) -> YearMonth {
        self.time.current_month()
    }

    pub fn is_finished(&self) -> bool {
        self.time.is_finished()
    }

    fn log_event(&mut self, event: Event) {
        if self.config.record_events {
            self.event_log.log(event);
        }
    }

    // ========================================================================
    // Tick loop
    // ========================================================================

    /// Simulate the current month and advance the clock
    pub fn tick(&mut self) -> Result<TickResult, SimulationError> {
        if self.time.is_finished() {
            return Err(SimulationError::RunFinished {
                ticks: self.time.total_ticks(),
            });
        }

        let tick = self.time.current_tick();
        let month = self.time.current_month();

        // STEP 1: PRIOR STATE (captured once; everything below reads it)
        let prior = self.population.capture_prior();

        // STEP 2: ACTIVE POPULATION
        let active: Vec<usize> = (0..self.loans.len())
            .filter(|&idx| {
                self.loans[idx].is_originated_by(month) && !prior.states[idx].is_terminal()
            })
            .collect();

        if active.is_empty() {
            debug!(tick, %month, "no active loans, tick skipped");
            self.skipped_ticks += 1;
            self.log_event(Event::TickSkipped { tick, month });
            self.time.advance_tick();
            return Ok(TickResult {
                tick,
                month,
                active: 0,
                reported: 0,
                payments: 0,
                skipped: true,
                transitions: TransitionCounts::default(),
            });
        }

        let months_on_book: Vec<i64> = active
            .iter()
            .map(|&idx| self.loans[idx].months_on_book(month))
            .collect();

        // STEP 3: BLEND
        let batch = blend_population(
            &self.surface,
            &self.risk,
            &active,
            &months_on_book,
            &self.config.seasoning,
        );
        if batch.renormalized > 0 {
            warn!(
                tick,
                %month,
                loans = batch.renormalized,
                "blended transition probabilities exceeded 1 and were renormalized"
            );
            self.log_event(Event::ProbabilitiesRenormalized {
                tick,
                month,
                loans: batch.renormalized,
            });
        }

        // STEP 4: TRANSITIONS
        let outcome = step_population(
            &prior,
            &active,
            &batch.params,
            &months_on_book,
            &self.schedule,
            &self.config.amortization,
            &mut self.rng,
        );

        if outcome.forced_fired() && !self.first_forced_payoff_seen {
            self.first_forced_payoff_seen = true;
            info!(tick, %month, loans = outcome.counts.forced_payoffs, "first forced payoff");
            self.log_event(Event::FirstForcedPayoff {
                tick,
                month,
                loans: outcome.counts.forced_payoffs,
            });
        }
        let counts = outcome.counts;

        // STEP 5: COMMIT
        self.population.commit(outcome.next);

        // STEP 6: REPORT
        let mut reported = 0;
        let mut payments = 0;
        for (idx, loan) in self.loans.iter().enumerate() {
            if !self.snapshots.is_reportable(idx, loan, month) {
                continue;
            }
            let mob = loan.months_on_book(month);
            let state = self.population.state(idx);

            if self.snapshots.record(
                idx,
                month,
                mob,
                state,
                self.population.dpd(idx),
                self.population.balance(idx),
            ) {
                reported += 1;
            }
            if self.ledger.emit(
                idx,
                loan,
                month,
                mob,
                prior.states[idx],
                state,
                prior.balances[idx],
            ) {
                payments += 1;
            }
        }

        self.totals.add(&counts);
        debug!(
            tick,
            %month,
            active = active.len(),
            reported,
            payments,
            to_dpd30 = counts.to_dpd30,
            cures = counts.cures,
            charge_offs = counts.charge_offs,
            payoffs = counts.payoffs(),
            "tick completed"
        );
        self.log_event(Event::TickCompleted {
            tick,
            month,
            active: active.len(),
            reported,
            payments,
            transitions: counts,
        });

        self.time.advance_tick();

        Ok(TickResult {
            tick,
            month,
            active: active.len(),
            reported,
            payments,
            skipped: false,
            transitions: counts,
        })
    }

    /// Simulate every remaining month and materialize the output
    pub fn run(mut self) -> Result<SimulationOutput, SimulationError> {
        while !self.time.is_finished() {
            self.tick()?;
        }
        self.finish()
    }

    /// Materialize the panel as of the months simulated so far
    pub fn finish(self) -> Result<SimulationOutput, SimulationError> {
        let snapshots = self.snapshots.materialize(&self.loans);
        let payments = self.ledger.materialize(&self.loans);
        let panel_digest = compute_panel_digest(&snapshots, &payments)?;

        let summary = RunSummary {
            run_id: Uuid::new_v4(),
            seed: self.config.seed,
            config_hash: self.config_hash,
            panel_digest,
            start_month: self.config.start_month,
            end_month: self.config.end_month,
            ticks: self.time.current_tick(),
            skipped_ticks: self.skipped_ticks,
            applications_approved: self.applications_approved,
            loans_funded: self.loans.len(),
            forced_payoffs_scheduled: self.schedule.scheduled_count(),
            snapshot_count: snapshots.len(),
            payment_count: payments.len(),
            missed_payment_count: self.ledger.count_status(PaymentStatus::Missed),
            total_collected: self.ledger.total_collected(),
            final_states: OutcomeCounts::from_state_counts(self.population.state_counts()),
            transitions: self.totals,
        };

        info!(
            run_id = %summary.run_id,
            ticks = summary.ticks,
            snapshots = summary.snapshot_count,
            payments = summary.payment_count,
            charged_off = summary.final_states.charged_off,
            paid_off = summary.final_states.paid_off,
            "simulation complete"
        );

        Ok(SimulationOutput {
            snapshots,
            payments,
            summary,
            event_log: self.event_log,
        })
    }
}
