//! Transfer function estimation from paired input/output buffers

use crate::error::{AnalysisError, Result};
use crate::fft::Fft;
use crate::signal::AudioBuffer;
use crate::spectrum::SpectrumFeature;
use serde::Serialize;

/// Input bins at or below this magnitude produce a zero transfer ratio.
pub const INPUT_MAGNITUDE_FLOOR: f32 = 1e-12;

/// Transfer function magnitude curve and its -3 dB cutoff
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferFunctionFeature {
    /// |output / input| per bin (dB), non-negative frequencies only
    pub spectrum: SpectrumFeature,
    /// First frequency at least 3 dB below the curve's peak
    pub cutoff_hz: Option<f32>,
}

/// Estimate `output / input` in the frequency domain.
///
/// Both buffers must already be the same length; callers truncate to the
/// shorter one first. Bins where the input is effectively silent get a ratio
/// of exactly zero instead of dividing by a near-zero value.
pub fn estimate_transfer_function(
    input: &AudioBuffer,
    output: &AudioBuffer,
) -> Result<TransferFunctionFeature> {
    if input.len() != output.len() {
        return Err(AnalysisError::LengthMismatch {
            left: input.len(),
            right: output.len(),
        });
    }
    if input.sample_rate() != output.sample_rate() {
        tracing::warn!(
            input_rate = input.sample_rate(),
            output_rate = output.sample_rate(),
            "sample rates differ; using the input rate for the frequency axis"
        );
    }

    let n = input.len();
    let fft = Fft::new(n);
    let input_fft = fft.forward_full(input.samples());
    let output_fft = fft.forward_full(output.samples());

    let ratio: Vec<f32> = input_fft
        .iter()
        .zip(&output_fft)
        .take(n / 2)
        .map(|(x, y)| {
            if x.norm() > INPUT_MAGNITUDE_FLOOR {
                (y / x).norm()
            } else {
                0.0
            }
        })
        .collect();

    let spectrum = SpectrumFeature::from_magnitudes(&ratio, input.sample_rate(), n);
    let cutoff_hz = cutoff_frequency(&spectrum);

    Ok(TransferFunctionFeature {
        spectrum,
        cutoff_hz,
    })
}

/// Lowest frequency whose magnitude is at least 3 dB below the peak.
///
/// Returns `None` for an empty or flat curve.
pub fn cutoff_frequency(spectrum: &SpectrumFeature) -> Option<f32> {
    let peak = spectrum
        .magnitude_db
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    let threshold = peak - 3.0;

    spectrum
        .magnitude_db
        .iter()
        .position(|&m| m <= threshold)
        .map(|i| spectrum.frequencies[i])
}
