//! End-of-run summary and reproducibility fingerprints
//!
//! The config hash is SHA-256 over canonical (key-sorted) JSON of the
//! configuration. The panel digest is SHA-256 over the serialized snapshot
//! and payment sequences; two runs with the same seed, config and inputs
//! produce the same digest. The run id is random and excluded from both.

use crate::core::time::YearMonth;
use crate::models::payment::PaymentRecord;
use crate::models::snapshot::MonthlySnapshot;
use crate::models::state::LoanState;
use crate::transitions::TransitionCounts;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ============================================================================
// Summary
// ============================================================================

/// Final state of every funded loan at the end of the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub current: usize,
    pub dpd30: usize,
    pub dpd60: usize,
    pub dpd90: usize,
    pub charged_off: usize,
    pub paid_off: usize,
}

impl OutcomeCounts {
    /// From counts indexed by [`LoanState::code`]
    pub fn from_state_counts(counts: [usize; 6]) -> Self {
        let at = |s: LoanState| counts[s.code() as usize];
        Self {
            current: at(LoanState::Current),
            dpd30: at(LoanState::Dpd30),
            dpd60: at(LoanState::Dpd60),
            dpd90: at(LoanState::Dpd90),
            charged_off: at(LoanState::ChargedOff),
            paid_off: at(LoanState::PaidOff),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub seed: u64,
    pub config_hash: String,
    pub panel_digest: String,
    pub start_month: YearMonth,
    pub end_month: YearMonth,
    pub ticks: usize,
    pub skipped_ticks: usize,
    pub applications_approved: usize,
    pub loans_funded: usize,
    pub forced_payoffs_scheduled: usize,
    pub snapshot_count: usize,
    pub payment_count: usize,
    pub missed_payment_count: usize,
    /// Sum of all actual payment amounts (cents)
    pub total_collected: i64,
    pub final_states: OutcomeCounts,
    pub transitions: TransitionCounts,
}

// ============================================================================
// Fingerprints
// ============================================================================

fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    use std::collections::BTreeMap;

    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Deterministic SHA-256 of any serializable configuration
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, serde_json::Error> {
    let canonical = canonicalize(serde_json::to_value(config)?);
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 over the snapshot sequence followed by the payment sequence
pub fn compute_panel_digest(
    snapshots: &[MonthlySnapshot],
    payments: &[PaymentRecord],
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    for snapshot in snapshots {
        hasher.update(serde_json::to_vec(snapshot)?);
        hasher.update(b"\n");
    }
    hasher.update(b"--payments--\n");
    for payment in payments {
        hasher.update(serde_json::to_vec(payment)?);
        hasher.update(b"\n");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_hash_ignores_key_order() {
        let mut a = HashMap::new();
        a.insert("seed", 1);
        a.insert("max_age", 60);
        let mut b = HashMap::new();
        b.insert("max_age", 60);
        b.insert("seed", 1);

        let ha = compute_config_hash(&a).unwrap();
        assert_eq!(ha, compute_config_hash(&b).unwrap());
        assert_eq!(ha.len(), 64);
    }

    #[test]
    fn test_empty_panel_digest_is_stable() {
        let d1 = compute_panel_digest(&[], &[]).unwrap();
        let d2 = compute_panel_digest(&[], &[]).unwrap();
        assert_eq!(d1, d2);
    }
}
