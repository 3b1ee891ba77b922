//! A/B comparison of a reference recording and a candidate rendering

use crate::fft::{Fft, magnitudes};
use crate::signal::{AudioBuffer, truncate_to_shorter};
use serde::{Deserialize, Deserializer, Serialize};

/// Similarity between a reference and a candidate buffer.
///
/// Correlations are `NaN` when either side has zero variance. JSON encodes
/// `NaN` as `null`, and `null` reads back as `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMetrics {
    /// Pearson correlation of the two magnitude spectra, in [-1, 1] or NaN
    #[serde(deserialize_with = "nan_from_null")]
    pub spectral_correlation: f64,
    /// Pearson correlation of the time-domain samples, in [-1, 1] or NaN
    #[serde(deserialize_with = "nan_from_null")]
    pub time_correlation: f64,
    /// Root-mean-square of the sample-wise difference
    #[serde(deserialize_with = "nan_from_null")]
    pub rms_error: f64,
}

impl SimilarityMetrics {
    /// `true` when any metric is NaN (silent, constant, or non-finite input).
    pub fn is_degenerate(&self) -> bool {
        self.spectral_correlation.is_nan()
            || self.time_correlation.is_nan()
            || self.rms_error.is_nan()
    }
}

/// Deserialize a float written by serde_json, reading `null` back as NaN.
///
/// serde_json writes non-finite floats as `null`; use this with
/// `#[serde(deserialize_with = ...)]` on any `f64` that may be NaN.
pub fn nan_from_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Compare a candidate against a reference.
///
/// Both buffers are truncated to the shorter length. Sample rates are not
/// reconciled; see [`sample_rate_mismatch`].
pub fn compare(reference: &AudioBuffer, candidate: &AudioBuffer) -> SimilarityMetrics {
    let (a, b) = truncate_to_shorter(reference, candidate);

    SimilarityMetrics {
        spectral_correlation: spectral_correlation(a, b),
        time_correlation: pearson(a, b),
        rms_error: rms_error(a, b),
    }
}

/// Pearson correlation of two full-length FFT magnitude spectra.
///
/// Inputs are truncated to the shorter length first.
pub fn spectral_correlation(signal_a: &[f32], signal_b: &[f32]) -> f64 {
    let len = signal_a.len().min(signal_b.len());
    if len == 0 {
        return f64::NAN;
    }

    let fft = Fft::new(len);
    let mag_a = magnitudes(&fft.forward_full(&signal_a[..len]));
    let mag_b = magnitudes(&fft.forward_full(&signal_b[..len]));

    pearson(&mag_a, &mag_b)
}

/// Pearson correlation coefficient.
///
/// Returns `NaN` for empty input or when either side has zero variance.
pub fn pearson(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return f64::NAN;
    }
    let (a, b) = (&a[..len], &b[..len]);

    let n = len as f64;
    let mean_a = a.iter().map(|&x| f64::from(x)).sum::<f64>() / n;
    let mean_b = b.iter().map(|&x| f64::from(x)).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (&x, &y) in a.iter().zip(b) {
        let da = f64::from(x) - mean_a;
        let db = f64::from(y) - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Root-mean-square of the sample-wise difference over the shorter length.
pub fn rms_error(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }

    let sum: f64 = a[..len]
        .iter()
        .zip(&b[..len])
        .map(|(&x, &y)| (f64::from(x) - f64::from(y)).powi(2))
        .sum();

    (sum / len as f64).sqrt()
}

/// The two sample rates when they differ.
///
/// Comparison never resamples; callers report the mismatch and proceed.
pub fn sample_rate_mismatch(a: &AudioBuffer, b: &AudioBuffer) -> Option<(u32, u32)> {
    (a.sample_rate() != b.sample_rate()).then_some((a.sample_rate(), b.sample_rate()))
}
