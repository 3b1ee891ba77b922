//! Persisted calibration report.
//!
//! The report is a pretty-printed JSON object keyed by recording stem:
//!
//! ```json
//! {
//!   "monotribe_cutoff_50": {
//!     "test_conditions": { "cutoff": 50.0 },
//!     "optimal_parameters": [2.1, 0.79, 0.0, 0.0],
//!     "validation_metrics": {
//!       "spectral_correlation": 0.997,
//!       "time_correlation": 0.41,
//!       "rms_error": 0.12
//!     },
//!     "target_similarity": 0.997
//!   }
//! }
//! ```
//!
//! Undefined correlations are written as `null` and read back as NaN.

use std::path::Path;

use crate::error::{CalibrationError, Result};
use crate::record::CalibrationRecords;

/// File name of the report inside the results directory.
pub const REPORT_FILE_NAME: &str = "calibration_results.json";

/// Write records as pretty JSON, creating parent directories as needed.
pub fn save_report(path: impl AsRef<Path>, records: &CalibrationRecords) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CalibrationError::create_dir(parent, e))?;
    }

    let json = serde_json::to_string_pretty(records).map_err(|e| CalibrationError::json(path, e))?;
    std::fs::write(path, json).map_err(|e| CalibrationError::write_file(path, e))?;

    tracing::info!(path = %path.display(), records = records.len(), "calibration report saved");
    Ok(())
}

/// Read a report written by [`save_report`].
pub fn load_report(path: impl AsRef<Path>) -> Result<CalibrationRecords> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| CalibrationError::read_file(path, e))?;
    serde_json::from_str(&json).map_err(|e| CalibrationError::json(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CalibrationRecord;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use tribecal_analysis::SimilarityMetrics;

    fn record(correlation: f64) -> CalibrationRecord {
        CalibrationRecord {
            test_conditions: BTreeMap::from([("cutoff".to_string(), 50.0)]),
            optimal_parameters: vec![2.1, 0.79, 0.0, 0.0],
            validation_metrics: SimilarityMetrics {
                spectral_correlation: correlation,
                time_correlation: 0.4,
                rms_error: 0.1,
            },
            target_similarity: correlation,
        }
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results").join(REPORT_FILE_NAME);
        let records = BTreeMap::from([("monotribe_cutoff_50".to_string(), record(0.997))]);

        save_report(&path, &records).unwrap();
        assert!(path.exists());
        assert_eq!(load_report(&path).unwrap(), records);
    }

    #[test]
    fn test_layout_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(REPORT_FILE_NAME);
        save_report(&path, &BTreeMap::from([("take".to_string(), record(0.5))])).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &value["take"];
        assert_eq!(entry["test_conditions"]["cutoff"], 50.0);
        assert_eq!(entry["optimal_parameters"].as_array().unwrap().len(), 4);
        assert_eq!(entry["validation_metrics"]["rms_error"], 0.1);
        assert_eq!(entry["target_similarity"], 0.5);
    }

    #[test]
    fn test_nan_written_as_null() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(REPORT_FILE_NAME);
        save_report(&path, &BTreeMap::from([("silent".to_string(), record(f64::NAN))])).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"target_similarity\": null"), "{json}");

        let loaded = load_report(&path).unwrap();
        assert!(loaded["silent"].target_similarity.is_nan());
        assert!(loaded["silent"].validation_metrics.spectral_correlation.is_nan());
    }

    #[test]
    fn test_non_finite_condition_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(REPORT_FILE_NAME);
        let mut take = record(0.9);
        take.test_conditions = crate::conditions::parse_conditions("tribe_gain_inf.wav").values;

        let records = BTreeMap::from([("tribe_gain_inf".to_string(), take)]);
        save_report(&path, &records).unwrap();
        assert_eq!(load_report(&path).unwrap(), records);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_report(dir.path().join("none.json")),
            Err(CalibrationError::ReadFile { .. })
        ));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_report(&path), Err(CalibrationError::Json { .. })));
    }
}
