//! Risk vector source interface
//!
//! The simulator does not know how risk is predicted. It consumes three
//! capabilities through [`RiskVectorSource`]:
//!
//! - an ordered archetype catalog (with optional early/mid/late prepay markers)
//! - a risk vector per loan: a probability distribution over the catalog
//! - the base transition parameters of one archetype at one loan age
//!
//! [`reference::ReferenceArchetypeModel`] is the built-in implementation.

pub mod reference;

use crate::models::loan::Loan;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub use reference::ReferenceArchetypeModel;

/// Tolerance for risk vector rows summing to 1
pub const RISK_VECTOR_TOLERANCE: f64 = 1e-6;

/// Errors in the data handed over by a risk vector source
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskSourceError {
    #[error("archetype catalog is empty")]
    EmptyCatalog,

    #[error("archetype '{0}' appears more than once in the catalog")]
    DuplicateArchetype(String),

    #[error("expected {expected} risk vectors, got {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("risk vector {row} has {actual} entries, catalog has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("risk vector {row} has invalid probability {value} for archetype {column}")]
    InvalidProbability { row: usize, column: usize, value: f64 },

    #[error("risk vector {row} sums to {sum}, expected 1")]
    RowSum { row: usize, sum: f64 },
}

/// The five base transition probabilities of the delinquency state machine
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionParams {
    /// CURRENT → DPD30
    pub p_current_to_30: f64,
    /// CURRENT → PAID_OFF
    pub p_current_to_paid: f64,
    /// DPD30 → DPD60
    pub p_30_to_60: f64,
    /// DPD30 → CURRENT
    pub p_30_to_cure: f64,
    /// DPD60 → DPD90 and DPD90 → CHARGED_OFF
    pub p_roll_forward: f64,
}

impl TransitionParams {
    pub const ZERO: TransitionParams = TransitionParams {
        p_current_to_30: 0.0,
        p_current_to_paid: 0.0,
        p_30_to_60: 0.0,
        p_30_to_cure: 0.0,
        p_roll_forward: 0.0,
    };

    /// Clamp every component into [0, 1]; NaN becomes 0
    pub fn clamped(&self) -> Self {
        fn unit(p: f64) -> f64 {
            if p.is_nan() {
                0.0
            } else {
                p.clamp(0.0, 1.0)
            }
        }
        Self {
            p_current_to_30: unit(self.p_current_to_30),
            p_current_to_paid: unit(self.p_current_to_paid),
            p_30_to_60: unit(self.p_30_to_60),
            p_30_to_cure: unit(self.p_30_to_cure),
            p_roll_forward: unit(self.p_roll_forward),
        }
    }

    /// `self += weight * other`
    pub fn add_weighted(&mut self, other: &TransitionParams, weight: f64) {
        self.p_current_to_30 += weight * other.p_current_to_30;
        self.p_current_to_paid += weight * other.p_current_to_paid;
        self.p_30_to_60 += weight * other.p_30_to_60;
        self.p_30_to_cure += weight * other.p_30_to_cure;
        self.p_roll_forward += weight * other.p_roll_forward;
    }

    /// Total outgoing mass from CURRENT
    pub fn current_outflow(&self) -> f64 {
        self.p_current_to_paid + self.p_current_to_30
    }

    /// Total outgoing mass from DPD30
    pub fn dpd30_outflow(&self) -> f64 {
        self.p_30_to_60 + self.p_30_to_cure
    }

    /// Guard against more than one transition firing per draw
    ///
    /// Components are clamped to [0, 1] and any originating state whose
    /// outgoing probabilities sum above 1 is rescaled proportionally.
    /// Returns the guarded set and whether rescaling was needed.
    pub fn normalized(&self) -> (Self, bool) {
        let mut p = self.clamped();
        let mut rescaled = false;

        let current = p.current_outflow();
        if current > 1.0 {
            p.p_current_to_paid /= current;
            p.p_current_to_30 /= current;
            rescaled = true;
        }

        let dpd30 = p.dpd30_outflow();
        if dpd30 > 1.0 {
            p.p_30_to_60 /= dpd30;
            p.p_30_to_cure /= dpd30;
            rescaled = true;
        }

        (p, rescaled)
    }
}

/// Which forced payoff window a prepay archetype maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrepayTiming {
    Early,
    Mid,
    Late,
}

/// Ordered set of archetype labels
///
/// # Example
/// ```
/// use loan_tape_core_rs::risk::{ArchetypeCatalog, PrepayTiming};
///
/// let catalog = ArchetypeCatalog::new(vec!["ON_TIME".into(), "EARLY_PREPAY".into()])
///     .unwrap()
///     .with_prepay_markers(Some("EARLY_PREPAY"), None, None);
///
/// assert_eq!(catalog.len(), 2);
/// assert_eq!(catalog.prepay_timing(1), Some(PrepayTiming::Early));
/// assert_eq!(catalog.prepay_timing(0), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeCatalog {
    labels: Vec<String>,
    early_prepay: Option<String>,
    mid_prepay: Option<String>,
    late_prepay: Option<String>,
}

impl ArchetypeCatalog {
    /// Create a catalog; labels must be non-empty and unique
    pub fn new(labels: Vec<String>) -> Result<Self, RiskSourceError> {
        if labels.is_empty() {
            return Err(RiskSourceError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(RiskSourceError::DuplicateArchetype(label.clone()));
            }
        }
        Ok(Self {
            labels,
            early_prepay: None,
            mid_prepay: None,
            late_prepay: None,
        })
    }

    /// Name the archetypes that schedule early/mid/late forced payoffs
    ///
    /// A marker naming a label outside the catalog simply never matches.
    pub fn with_prepay_markers(
        mut self,
        early: Option<&str>,
        mid: Option<&str>,
        late: Option<&str>,
    ) -> Self {
        self.early_prepay = early.map(str::to_string);
        self.mid_prepay = mid.map(str::to_string);
        self.late_prepay = late.map(str::to_string);
        self
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Forced payoff timing for the archetype at `idx`, if it is a prepayer
    pub fn prepay_timing(&self, idx: usize) -> Option<PrepayTiming> {
        let label = self.label(idx)?;
        if self.early_prepay.as_deref() == Some(label) {
            Some(PrepayTiming::Early)
        } else if self.mid_prepay.as_deref() == Some(label) {
            Some(PrepayTiming::Mid)
        } else if self.late_prepay.as_deref() == Some(label) {
            Some(PrepayTiming::Late)
        } else {
            None
        }
    }
}

/// Black-box provider of archetype risk
pub trait RiskVectorSource {
    /// Ordered archetype catalog; column order of every risk vector
    fn archetype_catalog(&self) -> ArchetypeCatalog;

    /// One probability row per loan, in loan order, each summing to 1
    fn predict_risk_vectors(&self, loans: &[Loan]) -> Vec<Vec<f64>>;

    /// Base transition parameters of `archetype` at `age_months`
    fn base_transition_parameters(&self, archetype: &str, age_months: usize) -> TransitionParams;
}

/// Validated risk vectors for the whole population, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RiskMatrix {
    n_archetypes: usize,
    data: Vec<f64>,
}

impl RiskMatrix {
    /// Validate and flatten the rows returned by a risk vector source
    ///
    /// Every row must have one entry per archetype, entries must be finite
    /// and non-negative, and each row must sum to 1 within
    /// [`RISK_VECTOR_TOLERANCE`].
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        expected_rows: usize,
        n_archetypes: usize,
    ) -> Result<Self, RiskSourceError> {
        if rows.len() != expected_rows {
            return Err(RiskSourceError::RowCount {
                expected: expected_rows,
                actual: rows.len(),
            });
        }

        let mut data = Vec::with_capacity(expected_rows * n_archetypes);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != n_archetypes {
                return Err(RiskSourceError::RowWidth {
                    row: row_idx,
                    expected: n_archetypes,
                    actual: row.len(),
                });
            }
            if let Some((column, value)) = row
                .iter()
                .enumerate()
                .find(|(_, p)| !p.is_finite() || **p < 0.0)
            {
                return Err(RiskSourceError::InvalidProbability {
                    row: row_idx,
                    column,
                    value: *value,
                });
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > RISK_VECTOR_TOLERANCE {
                return Err(RiskSourceError::RowSum { row: row_idx, sum });
            }
            data.extend(row);
        }

        Ok(Self { n_archetypes, data })
    }

    pub fn n_loans(&self) -> usize {
        if self.n_archetypes == 0 {
            0
        } else {
            self.data.len() / self.n_archetypes
        }
    }

    pub fn n_archetypes(&self) -> usize {
        self.n_archetypes
    }

    /// Risk vector of loan `idx`
    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.n_archetypes;
        &self.data[start..start + self.n_archetypes]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_rejects_duplicates() {
        let err = ArchetypeCatalog::new(vec!["A".into(), "B".into(), "A".into()]).unwrap_err();
        assert_eq!(err, RiskSourceError::DuplicateArchetype("A".into()));
        assert_eq!(
            ArchetypeCatalog::new(vec![]).unwrap_err(),
            RiskSourceError::EmptyCatalog
        );
    }

    #[test]
    fn test_unknown_marker_never_matches() {
        let catalog = ArchetypeCatalog::new(vec!["A".into(), "B".into()])
            .unwrap()
            .with_prepay_markers(Some("NOT_IN_CATALOG"), Some("B"), None);
        assert_eq!(catalog.prepay_timing(0), None);
        assert_eq!(catalog.prepay_timing(1), Some(PrepayTiming::Mid));
        assert_eq!(catalog.prepay_timing(5), None);
    }

    #[test]
    fn test_risk_matrix_validation() {
        assert!(RiskMatrix::from_rows(vec![vec![0.5, 0.5]], 1, 2).is_ok());

        let err = RiskMatrix::from_rows(vec![vec![0.5, 0.4]], 1, 2).unwrap_err();
        assert!(matches!(err, RiskSourceError::RowSum { row: 0, .. }));

        let err = RiskMatrix::from_rows(vec![vec![1.2, -0.2]], 1, 2).unwrap_err();
        assert!(matches!(
            err,
            RiskSourceError::InvalidProbability { row: 0, column: 1, .. }
        ));

        let err = RiskMatrix::from_rows(vec![vec![1.0]], 1, 2).unwrap_err();
        assert!(matches!(err, RiskSourceError::RowWidth { .. }));

        let err = RiskMatrix::from_rows(vec![], 1, 2).unwrap_err();
        assert_eq!(err, RiskSourceError::RowCount { expected: 1, actual: 0 });
    }

    #[test]
    fn test_normalized_rescales_excess_mass() {
        let p = TransitionParams {
            p_current_to_30: 0.9,
            p_current_to_paid: 0.3,
            p_30_to_60: 0.2,
            p_30_to_cure: 0.3,
            p_roll_forward: 1.4,
        };
        let (n, rescaled) = p.normalized();
        assert!(rescaled);
        assert!((n.current_outflow() - 1.0).abs() < 1e-12);
        assert!((n.p_current_to_30 / n.p_current_to_paid - 3.0).abs() < 1e-9);
        assert_eq!(n.p_30_to_60, 0.2);
        assert_eq!(n.p_roll_forward, 1.0);
    }
}
