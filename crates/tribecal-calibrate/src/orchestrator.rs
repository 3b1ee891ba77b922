//! Batch calibration over a set of reference recordings.
//!
//! For each recording identifier the [`Calibrator`]:
//!
//! 1. parses test conditions from the identifier,
//! 2. loads the reference through a [`ReferenceLoader`],
//! 3. optimizes emulator parameters against it,
//! 4. re-renders at the optimum and compares against the reference,
//! 5. classifies the result and stores a [`CalibrationRecord`].
//!
//! A failure in any step skips that recording and is recorded in the
//! [`BatchReport`]; the batch always runs to completion.

use std::fmt;
use std::path::Path;

use tribecal_analysis::{AudioBuffer, compare, sample_rate_mismatch};

use crate::conditions::{MalformedPair, parse_conditions};
use crate::error::{CalibrationError, Result};
use crate::minimize::{Minimizer, NelderMead};
use crate::optimize::Optimizer;
use crate::record::{CalibrationRecord, CalibrationRecords};
use crate::render::Render;
use crate::verdict::{Thresholds, Verdict};

/// Starting point used when none is configured.
pub const DEFAULT_INITIAL_PARAMETERS: [f64; 4] = [2.0, 0.8, 0.0, 0.0];

/// Source of reference recordings by identifier.
pub trait ReferenceLoader {
    /// Load the reference buffer for `id`.
    fn load(&self, id: &str) -> Result<AudioBuffer>;
}

impl<F> ReferenceLoader for F
where
    F: Fn(&str) -> Result<AudioBuffer>,
{
    fn load(&self, id: &str) -> Result<AudioBuffer> {
        self(id)
    }
}

/// Advisory finding produced while calibrating one recording.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Quality classification of a finished calibration.
    Verdict {
        /// Recording identifier.
        id: String,
        /// Classification.
        verdict: Verdict,
        /// Spectral correlation it was based on.
        spectral_correlation: f64,
    },
    /// A condition pair in the identifier was skipped.
    MalformedCondition {
        /// Recording identifier.
        id: String,
        /// The skipped pair.
        pair: MalformedPair,
    },
    /// The optimizer stopped on its budget rather than its tolerances.
    NonConvergence {
        /// Recording identifier.
        id: String,
        /// Iterations performed.
        iterations: usize,
        /// Renders performed.
        evaluations: usize,
    },
    /// Reference and render disagree on sample rate; compared without resampling.
    SampleRateMismatch {
        /// Recording identifier.
        id: String,
        /// Reference rate (Hz).
        reference: u32,
        /// Render rate (Hz).
        candidate: u32,
    },
}

impl Diagnostic {
    /// Identifier of the recording this diagnostic concerns.
    pub fn id(&self) -> &str {
        match self {
            Diagnostic::Verdict { id, .. }
            | Diagnostic::MalformedCondition { id, .. }
            | Diagnostic::NonConvergence { id, .. }
            | Diagnostic::SampleRateMismatch { id, .. } => id,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Verdict {
                id,
                verdict,
                spectral_correlation,
            } => write!(f, "{id}: {verdict} (spectral correlation {spectral_correlation:.4})"),
            Diagnostic::MalformedCondition { id, pair } => {
                write!(f, "{id}: skipped condition {}={}", pair.key, pair.value)
            }
            Diagnostic::NonConvergence {
                id,
                iterations,
                evaluations,
            } => write!(
                f,
                "{id}: optimizer did not converge ({iterations} iterations, {evaluations} renders)"
            ),
            Diagnostic::SampleRateMismatch {
                id,
                reference,
                candidate,
            } => write!(
                f,
                "{id}: sample rate mismatch, reference {reference} Hz vs render {candidate} Hz"
            ),
        }
    }
}

/// A recording that was skipped.
#[derive(Debug)]
pub struct BatchFailure {
    /// Recording identifier.
    pub id: String,
    /// Why it was skipped.
    pub error: CalibrationError,
}

/// Everything a batch run produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Calibrated recordings keyed by identifier.
    pub records: CalibrationRecords,
    /// Recordings that were skipped, in processing order.
    pub failures: Vec<BatchFailure>,
    /// Advisory findings, in processing order.
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchReport {
    /// Verdict recorded for `id`, if it was calibrated.
    pub fn verdict(&self, id: &str) -> Option<Verdict> {
        self.diagnostics.iter().find_map(|d| match d {
            Diagnostic::Verdict {
                id: diag_id,
                verdict,
                ..
            } if diag_id == id => Some(*verdict),
            _ => None,
        })
    }

    fn absorb(&mut self, id: String, result: Result<Calibrated>) {
        match result {
            Ok(calibrated) => {
                self.diagnostics.extend(calibrated.diagnostics);
                self.records.insert(id, calibrated.record);
            }
            Err(error) => {
                tracing::warn!(id = %id, error = %error, "skipping recording");
                self.failures.push(BatchFailure { id, error });
            }
        }
    }
}

/// One recording's record and the diagnostics raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibrated {
    /// The finished record.
    pub record: CalibrationRecord,
    /// Findings for this recording.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs calibrations with a fixed starting point, search, and thresholds.
#[derive(Debug, Clone)]
pub struct Calibrator<M = NelderMead> {
    optimizer: Optimizer<M>,
    initial_parameters: Vec<f64>,
    thresholds: Thresholds,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_PARAMETERS.to_vec())
    }
}

impl Calibrator {
    /// Calibrator using Nelder–Mead with default options.
    pub fn new(initial_parameters: Vec<f64>) -> Self {
        Self::with_minimizer(initial_parameters, NelderMead::default())
    }
}

impl<M: Minimizer> Calibrator<M> {
    /// Calibrator using the given search.
    pub fn with_minimizer(initial_parameters: Vec<f64>, minimizer: M) -> Self {
        Self {
            optimizer: Optimizer::new(minimizer),
            initial_parameters,
            thresholds: Thresholds::default(),
        }
    }

    /// Replace the verdict thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Starting parameter vector.
    pub fn initial_parameters(&self) -> &[f64] {
        &self.initial_parameters
    }

    /// Verdict thresholds.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Calibrate a single recording.
    pub fn calibrate_one<L, R>(&self, id: &str, loader: &L, renderer: &R) -> Result<Calibrated>
    where
        L: ReferenceLoader + ?Sized,
        R: Render + ?Sized,
    {
        if self.initial_parameters.is_empty() {
            return Err(CalibrationError::NoParameters);
        }

        let mut diagnostics = Vec::new();
        let conditions = parse_conditions(id);
        diagnostics.extend(
            conditions
                .malformed
                .into_iter()
                .map(|pair| Diagnostic::MalformedCondition {
                    id: id.to_string(),
                    pair,
                }),
        );

        tracing::info!(id, "calibrating");
        let reference = loader.load(id)?;

        let outcome = self
            .optimizer
            .optimize(&reference, &self.initial_parameters, renderer);
        if !outcome.converged {
            tracing::warn!(
                id,
                iterations = outcome.iterations,
                evaluations = outcome.evaluations,
                "optimizer stopped before converging"
            );
            diagnostics.push(Diagnostic::NonConvergence {
                id: id.to_string(),
                iterations: outcome.iterations,
                evaluations: outcome.evaluations,
            });
        }

        let candidate = renderer
            .render(&outcome.parameters)
            .map_err(|source| CalibrationError::Render {
                id: id.to_string(),
                source,
            })?;

        if let Some((reference_rate, candidate_rate)) = sample_rate_mismatch(&reference, &candidate) {
            tracing::warn!(
                id,
                reference_rate,
                candidate_rate,
                "sample rates differ; comparing without resampling"
            );
            diagnostics.push(Diagnostic::SampleRateMismatch {
                id: id.to_string(),
                reference: reference_rate,
                candidate: candidate_rate,
            });
        }

        let metrics = compare(&reference, &candidate);
        let verdict = self.thresholds.classify(metrics.spectral_correlation);
        match verdict {
            Verdict::MatchAchieved => {
                tracing::info!(id, correlation = metrics.spectral_correlation, "match achieved");
            }
            Verdict::CloseMatch => {
                tracing::warn!(id, correlation = metrics.spectral_correlation, "close match");
            }
            Verdict::Divergent => {
                tracing::error!(
                    id,
                    correlation = metrics.spectral_correlation,
                    finite = candidate.is_finite(),
                    "significant difference remains"
                );
            }
        }
        diagnostics.push(Diagnostic::Verdict {
            id: id.to_string(),
            verdict,
            spectral_correlation: metrics.spectral_correlation,
        });

        Ok(Calibrated {
            record: CalibrationRecord {
                test_conditions: conditions.values,
                optimal_parameters: outcome.parameters,
                validation_metrics: metrics,
                target_similarity: metrics.spectral_correlation,
            },
            diagnostics,
        })
    }

    /// Calibrate every identifier in order.
    ///
    /// Per-recording failures are collected in [`BatchReport::failures`];
    /// the batch never aborts.
    pub fn run_batch<I, S, L, R>(&self, ids: I, loader: &L, renderer: &R) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        L: ReferenceLoader + ?Sized,
        R: Render + ?Sized,
    {
        self.run_batch_with_progress(ids, loader, renderer, |_| {})
    }

    /// [`run_batch`](Self::run_batch), calling `on_done` after each identifier.
    pub fn run_batch_with_progress<I, S, L, R, P>(
        &self,
        ids: I,
        loader: &L,
        renderer: &R,
        mut on_done: P,
    ) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        L: ReferenceLoader + ?Sized,
        R: Render + ?Sized,
        P: FnMut(&str),
    {
        let mut report = BatchReport::default();
        for id in ids {
            let id = id.as_ref();
            let result = self.calibrate_one(id, loader, renderer);
            report.absorb(id.to_string(), result);
            on_done(id);
        }

        tracing::info!(
            calibrated = report.records.len(),
            skipped = report.failures.len(),
            "batch complete"
        );
        report
    }

    /// Calibrate identifiers on the rayon thread pool.
    ///
    /// Each recording is processed independently; results are merged into
    /// the report on the calling thread, in input order.
    #[cfg(feature = "parallel")]
    pub fn run_batch_parallel<S, L, R>(&self, ids: &[S], loader: &L, renderer: &R) -> BatchReport
    where
        S: AsRef<str> + Sync,
        L: ReferenceLoader + Sync + ?Sized,
        R: Render + Sync + ?Sized,
        M: Sync,
    {
        use rayon::prelude::*;

        let results: Vec<(String, Result<Calibrated>)> = ids
            .par_iter()
            .map(|id| {
                let id = id.as_ref();
                (id.to_string(), self.calibrate_one(id, loader, renderer))
            })
            .collect();

        let mut report = BatchReport::default();
        for (id, result) in results {
            report.absorb(id, result);
        }

        tracing::info!(
            calibrated = report.records.len(),
            skipped = report.failures.len(),
            "batch complete"
        );
        report
    }
}

/// Stems of the `.wav` files in `dir`, sorted.
pub fn discover_recordings(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| CalibrationError::read_file(dir, e))?;

    let mut stems = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CalibrationError::read_file(dir, e))?.path();
        let is_wav = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if !is_wav || !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.push(stem.to_string());
        }
    }

    stems.sort();
    Ok(stems)
}
