//! Tribecal Analysis - feature extraction for synthesizer calibration
//!
//! This crate turns audio buffers into comparable acoustic features and scores
//! how closely a candidate rendering matches a reference recording:
//!
//! - [`signal`] - Canonical mono buffers from raw decoded samples
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`spectrum`] - Windowed, averaged magnitude spectra and harmonic lookup
//! - [`envelope`] - Attack/decay timing from a signal plus its gate track
//! - [`transfer_fn`] - Input/output transfer ratio and -3 dB cutoff
//! - [`compare`] - Spectral/time correlation and RMS error
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use tribecal_analysis::{AudioBuffer, analyze_spectrum, find_harmonics, compare};
//!
//! let reference = AudioBuffer::new(recorded, 48000)?;
//! let candidate = AudioBuffer::new(rendered, 48000)?;
//!
//! // Harmonic content of the hardware recording
//! let spectrum = analyze_spectrum(&reference, 4096)?;
//! let harmonics = find_harmonics(&spectrum, None)?;
//! println!("Fundamental: {:.1} Hz", harmonics.fundamental_hz);
//!
//! // Similarity of the emulator output
//! let metrics = compare(&reference, &candidate);
//! println!("Spectral correlation: {:.4}", metrics.spectral_correlation);
//! ```
//!
//! ## Degenerate Signals
//!
//! Correlations of zero-variance input (silence, DC) are `NaN`, never `0.0`
//! or `1.0`. Check [`SimilarityMetrics::is_degenerate`] before thresholding.

pub mod compare;
pub mod envelope;
mod error;
pub mod fft;
pub mod signal;
pub mod spectrum;
pub mod transfer_fn;

// Re-export main types
pub use compare::{
    SimilarityMetrics, compare, nan_from_null, pearson, rms_error, sample_rate_mismatch,
    spectral_correlation,
};
pub use envelope::{EnvelopeEvent, gate_edges, measure_envelope};
pub use error::{AnalysisError, Result};
pub use fft::{Fft, Window};
pub use signal::{AudioBuffer, RawAudio, RawSamples, SampleFormat, prepare, truncate_to_shorter};
pub use spectrum::{
    DEFAULT_WINDOW_SIZE, HarmonicAnalysis, HarmonicEntry, SpectrumFeature, analyze_spectrum,
    find_harmonics,
};
pub use transfer_fn::{TransferFunctionFeature, cutoff_frequency, estimate_transfer_function};
