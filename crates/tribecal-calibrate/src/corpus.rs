//! Regression corpus: golden renders of calibrated parameter sets.
//!
//! Each case is a pair of files sharing a stem: `params_<stem>.json` (a JSON
//! number array) and `audio_<stem>.wav` (mono 32-bit float). Re-rendering the
//! parameters later and comparing against the stored audio catches emulator
//! changes that would invalidate a calibration.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tribecal_analysis::{AudioBuffer, spectral_correlation, truncate_to_shorter};

use crate::error::{CalibrationError, Result};
use crate::orchestrator::BatchFailure;
use crate::record::CalibrationRecords;
use crate::render::Render;

const PARAMS_PREFIX: &str = "params_";
const AUDIO_PREFIX: &str = "audio_";

/// Path of the parameter file for `stem`.
pub fn params_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{PARAMS_PREFIX}{stem}.json"))
}

/// Path of the audio file for `stem`.
pub fn audio_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{AUDIO_PREFIX}{stem}.wav"))
}

/// One stored regression case.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionCase {
    /// Shared file stem.
    pub stem: String,
    /// Emulator parameters.
    pub parameters: Vec<f64>,
    /// Golden render.
    pub audio: AudioBuffer,
}

/// Outcome of re-rendering one regression case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    /// Case stem.
    pub stem: String,
    /// Spectral correlation of the new render against the golden one.
    pub spectral_correlation: f64,
    /// Whether the new render is free of NaN and infinity.
    pub finite: bool,
    /// `finite` and correlation above the threshold.
    pub passed: bool,
}

/// Cases written by [`write_regression_corpus`] and the records that could not be rendered.
#[derive(Debug, Default)]
pub struct CorpusSummary {
    /// Stems written, in record order.
    pub written: Vec<String>,
    /// Records skipped because rendering failed.
    pub failures: Vec<BatchFailure>,
}

/// Render every record's optimal parameters and store them as regression cases.
///
/// Audio is written at `sample_rate`. A record whose render fails is skipped
/// and reported; file system errors abort.
pub fn write_regression_corpus<R: Render + ?Sized>(
    dir: impl AsRef<Path>,
    records: &CalibrationRecords,
    renderer: &R,
    sample_rate: u32,
) -> Result<CorpusSummary> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| CalibrationError::create_dir(dir, e))?;

    let mut summary = CorpusSummary::default();
    for (stem, record) in records {
        let rendered = match renderer.render(&record.optimal_parameters) {
            Ok(buffer) => buffer,
            Err(source) => {
                tracing::warn!(stem, error = %source, "skipping regression case");
                summary.failures.push(BatchFailure {
                    id: stem.clone(),
                    error: CalibrationError::Render {
                        id: stem.clone(),
                        source,
                    },
                });
                continue;
            }
        };

        if rendered.sample_rate() != sample_rate {
            tracing::warn!(
                stem,
                render_rate = rendered.sample_rate(),
                corpus_rate = sample_rate,
                "storing render at the corpus sample rate"
            );
        }
        let audio = AudioBuffer::new(rendered.into_samples(), sample_rate).map_err(|source| {
            CalibrationError::Render {
                id: stem.clone(),
                source: source.into(),
            }
        })?;

        let params_file = params_path(dir, stem);
        let json = serde_json::to_string_pretty(&record.optimal_parameters)
            .map_err(|e| CalibrationError::json(&params_file, e))?;
        std::fs::write(&params_file, json)
            .map_err(|e| CalibrationError::write_file(&params_file, e))?;
        tribecal_io::write_wav(audio_path(dir, stem), &audio)?;

        summary.written.push(stem.clone());
    }

    tracing::info!(
        dir = %dir.display(),
        cases = summary.written.len(),
        "regression corpus written"
    );
    Ok(summary)
}

/// Load every complete case from a corpus directory, sorted by stem.
///
/// Parameter files without a matching audio file are ignored.
pub fn load_regression_corpus(dir: impl AsRef<Path>) -> Result<Vec<RegressionCase>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| CalibrationError::read_file(dir, e))?;

    let mut stems = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CalibrationError::read_file(dir, e))?;
        let name = entry.file_name();
        let Some(stem) = name
            .to_str()
            .and_then(|n| n.strip_prefix(PARAMS_PREFIX))
            .and_then(|n| n.strip_suffix(".json"))
        else {
            continue;
        };
        if audio_path(dir, stem).is_file() {
            stems.push(stem.to_string());
        } else {
            tracing::debug!(stem, "parameter file without audio; ignored");
        }
    }
    stems.sort();

    let mut cases = Vec::with_capacity(stems.len());
    for stem in stems {
        let params_file = params_path(dir, &stem);
        let json = std::fs::read_to_string(&params_file)
            .map_err(|e| CalibrationError::read_file(&params_file, e))?;
        let parameters: Vec<f64> =
            serde_json::from_str(&json).map_err(|e| CalibrationError::json(&params_file, e))?;
        let audio = tribecal_io::load_buffer(audio_path(dir, &stem))?;
        cases.push(RegressionCase {
            stem,
            parameters,
            audio,
        });
    }

    Ok(cases)
}

/// Re-render each case and compare it spectrally against its golden audio.
///
/// A case passes when the render is finite and its spectral correlation is
/// strictly above `threshold`. A failed render is a failing case, not an error.
pub fn check_regression<R: Render + ?Sized>(
    corpus: &[RegressionCase],
    renderer: &R,
    threshold: f64,
) -> Vec<RegressionResult> {
    corpus
        .iter()
        .map(|case| {
            let result = match renderer.render(&case.parameters) {
                Ok(current) => {
                    let finite = current.is_finite();
                    let (a, b) = truncate_to_shorter(&case.audio, &current);
                    let correlation = spectral_correlation(a, b);
                    RegressionResult {
                        stem: case.stem.clone(),
                        spectral_correlation: correlation,
                        finite,
                        passed: finite && correlation > threshold,
                    }
                }
                Err(err) => {
                    tracing::warn!(stem = %case.stem, error = %err, "regression render failed");
                    RegressionResult {
                        stem: case.stem.clone(),
                        spectral_correlation: f64::NAN,
                        finite: false,
                        passed: false,
                    }
                }
            };

            if !result.passed {
                tracing::error!(
                    stem = %result.stem,
                    correlation = result.spectral_correlation,
                    "regression check failed"
                );
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CalibrationRecord;
    use crate::render::RenderError;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use tribecal_analysis::SimilarityMetrics;

    fn saw(params: &[f64]) -> std::result::Result<AudioBuffer, RenderError> {
        let period = (params[0].max(2.0)) as usize;
        let samples = (0..4096)
            .map(|i| (i % period) as f32 / period as f32 - 0.5)
            .collect();
        Ok(AudioBuffer::new(samples, 44100)?)
    }

    fn record(parameters: Vec<f64>) -> CalibrationRecord {
        CalibrationRecord {
            test_conditions: BTreeMap::new(),
            optimal_parameters: parameters,
            validation_metrics: SimilarityMetrics {
                spectral_correlation: 1.0,
                time_correlation: 1.0,
                rms_error: 0.0,
            },
            target_similarity: 1.0,
        }
    }

    #[test]
    fn test_file_naming() {
        let dir = Path::new("/corpus");
        assert_eq!(params_path(dir, "cutoff_50"), Path::new("/corpus/params_cutoff_50.json"));
        assert_eq!(audio_path(dir, "cutoff_50"), Path::new("/corpus/audio_cutoff_50.wav"));
    }

    #[test]
    fn test_write_then_check_passes() {
        let dir = TempDir::new().unwrap();
        let records = BTreeMap::from([
            ("slow".to_string(), record(vec![100.0])),
            ("fast".to_string(), record(vec![20.0])),
        ]);
        let renderer = |p: &[f64]| saw(p);

        let summary = write_regression_corpus(dir.path(), &records, &renderer, 44100).unwrap();
        assert_eq!(summary.written, vec!["fast", "slow"]);
        assert!(summary.failures.is_empty());
        assert!(params_path(dir.path(), "slow").is_file());
        assert!(audio_path(dir.path(), "slow").is_file());

        let corpus = load_regression_corpus(dir.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[1].stem, "slow");
        assert_eq!(corpus[1].parameters, vec![100.0]);

        let results = check_regression(&corpus, &renderer, 0.99);
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn test_changed_emulator_fails() {
        let dir = TempDir::new().unwrap();
        let records = BTreeMap::from([("case".to_string(), record(vec![100.0]))]);
        write_regression_corpus(dir.path(), &records, &|p: &[f64]| saw(p), 44100).unwrap();

        // Emulator now renders a different pitch for the same parameters
        let drifted = |p: &[f64]| saw(&[p[0] * 0.37]);
        let corpus = load_regression_corpus(dir.path()).unwrap();
        let results = check_regression(&corpus, &drifted, 0.99);
        assert!(!results[0].passed);
        assert!(results[0].finite);
    }

    #[test]
    fn test_nan_render_fails() {
        let corpus = vec![RegressionCase {
            stem: "case".to_string(),
            parameters: vec![1.0],
            audio: saw(&[50.0]).unwrap(),
        }];
        let nan = |_: &[f64]| -> std::result::Result<AudioBuffer, RenderError> {
            Ok(AudioBuffer::new(vec![f32::NAN; 4096], 44100)?)
        };
        let results = check_regression(&corpus, &nan, 0.99);
        assert!(!results[0].finite);
        assert!(!results[0].passed);
    }

    #[test]
    fn test_failed_render_skipped_when_writing() {
        let dir = TempDir::new().unwrap();
        let records = BTreeMap::from([
            ("good".to_string(), record(vec![64.0])),
            ("bad".to_string(), record(vec![-1.0])),
        ]);
        let renderer = |p: &[f64]| {
            if p[0] < 0.0 {
                Err(RenderError::Failed("negative period".to_string()))
            } else {
                saw(p)
            }
        };

        let summary = write_regression_corpus(dir.path(), &records, &renderer, 44100).unwrap();
        assert_eq!(summary.written, vec!["good"]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].id, "bad");
        assert!(!params_path(dir.path(), "bad").exists());
    }

    #[test]
    fn test_unpaired_params_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(params_path(dir.path(), "orphan"), "[1.0, 2.0]").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "corpus").unwrap();
        assert!(load_regression_corpus(dir.path()).unwrap().is_empty());
    }
}
