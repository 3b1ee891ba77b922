//! Calibration records and their JSON representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tribecal_analysis::SimilarityMetrics;

/// Outcome of calibrating against one reference recording.
///
/// Created once per recording by the orchestrator and never mutated after
/// it is inserted into the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Conditions parsed from the recording identifier.
    pub test_conditions: BTreeMap<String, f64>,
    /// Parameters chosen by the optimizer.
    pub optimal_parameters: Vec<f64>,
    /// Comparison of the optimized render against the reference.
    pub validation_metrics: SimilarityMetrics,
    /// Spectral correlation reached; `null` in JSON when undefined.
    #[serde(deserialize_with = "tribecal_analysis::nan_from_null")]
    pub target_similarity: f64,
}

/// All records of a batch, keyed by recording identifier.
pub type CalibrationRecords = BTreeMap<String, CalibrationRecord>;
