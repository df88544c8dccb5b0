//! Event scheduler: forced payoffs drawn at funding time
//!
//! Two separate computations, run once per loan in loan order:
//!
//! 1. [`sample_archetype_labels`] draws one discrete archetype per loan from
//!    its risk vector. The label is used only for scheduling; month-to-month
//!    behavior always comes from the continuous blend.
//! 2. [`schedule_forced_payoffs`] draws a payoff month from the window keyed
//!    by the label (early / mid / late prepay). Any other label, or a label
//!    the catalog does not mark as a prepayer, schedules nothing.

use crate::risk::{ArchetypeCatalog, PrepayTiming, RiskMatrix};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Inclusive months-on-book window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub min: u32,
    pub max: u32,
}

impl MonthWindow {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min >= 1 && self.min <= self.max
    }

    fn sample(&self, rng: &mut RngManager) -> u32 {
        rng.range_inclusive(self.min as i64, self.max as i64) as u32
    }
}

/// Payoff windows per prepay timing
///
/// Deserializes bound by bound: a window or bound left out of the JSON keeps
/// its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForcedPayoffWindows {
    pub early: MonthWindow,
    pub mid: MonthWindow,
    pub late: MonthWindow,
}

impl Default for ForcedPayoffWindows {
    fn default() -> Self {
        Self {
            early: MonthWindow::new(6, 18),
            mid: MonthWindow::new(19, 30),
            late: MonthWindow::new(31, 60),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WindowOverride {
    min: Option<u32>,
    max: Option<u32>,
}

impl WindowOverride {
    fn over(&self, base: MonthWindow) -> MonthWindow {
        MonthWindow::new(self.min.unwrap_or(base.min), self.max.unwrap_or(base.max))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PayoffWindowOverrides {
    early: WindowOverride,
    mid: WindowOverride,
    late: WindowOverride,
}

impl<'de> Deserialize<'de> for ForcedPayoffWindows {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = PayoffWindowOverrides::deserialize(deserializer)?;
        let base = ForcedPayoffWindows::default();
        Ok(Self {
            early: overrides.early.over(base.early),
            mid: overrides.mid.over(base.mid),
            late: overrides.late.over(base.late),
        })
    }
}

impl ForcedPayoffWindows {
    pub fn window(&self, timing: PrepayTiming) -> MonthWindow {
        match timing {
            PrepayTiming::Early => self.early,
            PrepayTiming::Mid => self.mid,
            PrepayTiming::Late => self.late,
        }
    }
}

/// Per-loan forced payoff month (raw months on book), or never
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForcedEventSchedule {
    offsets: Vec<Option<u32>>,
}

impl ForcedEventSchedule {
    /// No loan has a forced event
    pub fn never(n_loans: usize) -> Self {
        Self {
            offsets: vec![None; n_loans],
        }
    }

    pub fn from_offsets(offsets: Vec<Option<u32>>) -> Self {
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offset(&self, loan_idx: usize) -> Option<u32> {
        self.offsets.get(loan_idx).copied().flatten()
    }

    /// Whether the forced payoff of `loan_idx` is due at `months_on_book`
    pub fn fires(&self, loan_idx: usize, months_on_book: i64) -> bool {
        self.offset(loan_idx)
            .map_or(false, |month| month as i64 == months_on_book)
    }

    pub fn scheduled_count(&self) -> usize {
        self.offsets.iter().filter(|o| o.is_some()).count()
    }
}

/// Draw one archetype index per loan from its risk vector
///
/// Consumes exactly one uniform draw per loan, in loan order.
pub fn sample_archetype_labels(risk: &RiskMatrix, rng: &mut RngManager) -> Vec<Option<usize>> {
    (0..risk.n_loans())
        .map(|idx| rng.sample_categorical(risk.row(idx)))
        .collect()
}

/// Turn sampled labels into forced payoff months
///
/// Consumes one draw per loan whose label is a prepay archetype, in loan
/// order; other loans consume nothing.
pub fn schedule_forced_payoffs(
    labels: &[Option<usize>],
    catalog: &ArchetypeCatalog,
    windows: &ForcedPayoffWindows,
    rng: &mut RngManager,
) -> ForcedEventSchedule {
    let offsets = labels
        .iter()
        .map(|label| {
            label
                .and_then(|idx| catalog.prepay_timing(idx))
                .map(|timing| windows.window(timing).sample(rng))
        })
        .collect();

    ForcedEventSchedule { offsets }
}
