//! Parameter search against a reference recording.

use tribecal_analysis::{AudioBuffer, spectral_correlation, truncate_to_shorter};

use crate::minimize::{Minimizer, NelderMead};
use crate::render::Render;

/// Objective assigned to a render that cannot be scored.
pub const WORST_OBJECTIVE: f64 = 1.0;

/// Result of one optimization run.
///
/// Non-convergence is not an error: `parameters` is always the best vector
/// found, and `converged` says whether the search met its tolerances.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    /// Best parameter vector found.
    pub parameters: Vec<f64>,
    /// `1 − spectral_correlation` at `parameters`.
    pub objective: f64,
    /// Whether the minimizer met its tolerances.
    pub converged: bool,
    /// Minimizer iterations.
    pub iterations: usize,
    /// Renders performed.
    pub evaluations: usize,
}

/// Score one parameter vector: `1 − spectral_correlation(reference, render)`.
///
/// A failed render, a non-finite render, or an undefined (NaN) correlation
/// scores [`WORST_OBJECTIVE`] so the search steers away from it without
/// seeing NaN.
pub fn objective<R: Render + ?Sized>(
    reference: &AudioBuffer,
    renderer: &R,
    parameters: &[f64],
) -> f64 {
    let candidate = match renderer.render(parameters) {
        Ok(candidate) => candidate,
        Err(err) => {
            tracing::debug!(?parameters, error = %err, "render failed during search");
            return WORST_OBJECTIVE;
        }
    };
    if !candidate.is_finite() {
        tracing::debug!(?parameters, "non-finite render during search");
        return WORST_OBJECTIVE;
    }

    let (a, b) = truncate_to_shorter(reference, &candidate);
    let correlation = spectral_correlation(a, b);
    if correlation.is_nan() {
        WORST_OBJECTIVE
    } else {
        1.0 - correlation
    }
}

/// Minimizes the spectral-correlation objective with a pluggable search.
#[derive(Debug, Clone, Default)]
pub struct Optimizer<M = NelderMead> {
    minimizer: M,
}

impl<M: Minimizer> Optimizer<M> {
    /// Create an optimizer over the given search.
    pub fn new(minimizer: M) -> Self {
        Self { minimizer }
    }

    /// The search in use.
    pub fn minimizer(&self) -> &M {
        &self.minimizer
    }

    /// Find parameters whose render best matches `reference` spectrally.
    ///
    /// Only spectral correlation drives the search; time correlation and RMS
    /// error are reported by validation but never optimized.
    pub fn optimize<R: Render + ?Sized>(
        &self,
        reference: &AudioBuffer,
        initial_parameters: &[f64],
        renderer: &R,
    ) -> OptimizationOutcome {
        let mut score = |parameters: &[f64]| objective(reference, renderer, parameters);
        let minimum = self.minimizer.minimize(&mut score, initial_parameters);

        tracing::debug!(
            objective = minimum.value,
            iterations = minimum.iterations,
            evaluations = minimum.evaluations,
            converged = minimum.converged,
            "optimization finished"
        );

        OptimizationOutcome {
            parameters: minimum.point,
            objective: minimum.value,
            converged: minimum.converged,
            iterations: minimum.iterations,
            evaluations: minimum.evaluations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 8000;

    fn tone(freq: f64, len: usize) -> AudioBuffer {
        let samples = (0..len)
            .map(|i| (2.0 * PI * freq as f32 * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        AudioBuffer::new(samples, SAMPLE_RATE).unwrap()
    }

    #[test]
    fn test_objective_zero_for_exact_match() {
        let reference = tone(440.0, 1024);
        let renderer = |p: &[f64]| -> Result<AudioBuffer, RenderError> { Ok(tone(p[0], 1024)) };
        assert!(objective(&reference, &renderer, &[440.0]).abs() < 1e-9);
    }

    #[test]
    fn test_objective_worst_on_failure() {
        let reference = tone(440.0, 256);
        let failing = |_: &[f64]| -> Result<AudioBuffer, RenderError> {
            Err(RenderError::Failed("boom".to_string()))
        };
        assert_eq!(objective(&reference, &failing, &[1.0]), WORST_OBJECTIVE);
    }

    #[test]
    fn test_objective_worst_on_nan_render() {
        let reference = tone(440.0, 256);
        let nan = |_: &[f64]| -> Result<AudioBuffer, RenderError> {
            Ok(AudioBuffer::new(vec![f32::NAN; 256], SAMPLE_RATE)?)
        };
        assert_eq!(objective(&reference, &nan, &[1.0]), WORST_OBJECTIVE);
    }

    #[test]
    fn test_objective_worst_on_silent_render() {
        let reference = tone(440.0, 256);
        let silent = |_: &[f64]| -> Result<AudioBuffer, RenderError> {
            Ok(AudioBuffer::new(vec![0.0; 256], SAMPLE_RATE)?)
        };
        assert_eq!(objective(&reference, &silent, &[1.0]), WORST_OBJECTIVE);
    }

    #[test]
    fn test_optimize_recovers_gain_shape() {
        // Two-tone mix whose balance is the parameter; spectral shape depends on the ratio
        let mix = |p: &[f64]| -> Result<AudioBuffer, RenderError> {
            let samples = (0..2048)
                .map(|i| {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    (2.0 * PI * 500.0 * t).sin() + p[0] as f32 * (2.0 * PI * 1500.0 * t).sin()
                })
                .collect();
            Ok(AudioBuffer::new(samples, SAMPLE_RATE)?)
        };
        let reference = mix(&[0.3]).unwrap();

        let outcome = Optimizer::<NelderMead>::default().optimize(&reference, &[0.8], &mix);
        assert!(outcome.objective < 1e-4, "objective {}", outcome.objective);
        assert!((outcome.parameters[0] - 0.3).abs() < 0.02, "{:?}", outcome.parameters);
        assert!(outcome.evaluations > 0);
    }
}
