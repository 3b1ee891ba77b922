//! Signal preparation: raw decoded samples to canonical mono buffers.
//!
//! Every analysis in this crate consumes an [`AudioBuffer`]: mono, float
//! samples in roughly [-1, 1], with a positive sample rate. Decoders hand over
//! a [`RawAudio`] (possibly interleaved multi-channel, possibly integer) and
//! [`prepare`] normalizes it.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Declared bit format of decoded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 16-bit signed integer PCM.
    Int16,
    /// 24-bit signed integer PCM (stored in `i32`).
    Int24,
    /// 32-bit signed integer PCM.
    Int32,
    /// IEEE 754 single-precision float, already in [-1, 1].
    Float32,
}

impl SampleFormat {
    /// Maximum positive magnitude of an integer format, `None` for float.
    pub fn full_scale(self) -> Option<f64> {
        match self {
            SampleFormat::Int16 => Some(32767.0),
            SampleFormat::Int24 => Some(8_388_607.0),
            SampleFormat::Int32 => Some(2_147_483_647.0),
            SampleFormat::Float32 => None,
        }
    }

    /// Map a container's bit depth and float flag to a format.
    pub fn from_bits(bits_per_sample: u16, is_float: bool) -> Option<Self> {
        match (bits_per_sample, is_float) {
            (32, true) => Some(SampleFormat::Float32),
            (16, false) => Some(SampleFormat::Int16),
            (24, false) => Some(SampleFormat::Int24),
            (32, false) => Some(SampleFormat::Int32),
            _ => None,
        }
    }
}

/// Interleaved samples as produced by a decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSamples {
    /// Integer-quantized samples.
    Int(Vec<i32>),
    /// Floating-point samples.
    Float(Vec<f32>),
}

impl RawSamples {
    fn len(&self) -> usize {
        match self {
            RawSamples::Int(v) => v.len(),
            RawSamples::Float(v) => v.len(),
        }
    }
}

/// Decoded audio before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// Interleaved sample data.
    pub samples: RawSamples,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Canonical mono audio buffer.
///
/// Never empty and always carries a positive sample rate. The samples are not
/// required to be finite: emulator output may contain NaN, which comparison
/// reports rather than rejects.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer, checking the non-empty and positive-rate invariants.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(AnalysisError::InvalidBuffer("buffer is empty".to_string()));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidBuffer(
                "sample rate must be positive".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Sample data.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples (always at least one).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// `true` when every sample is finite.
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    /// A new buffer holding at most the first `len` samples.
    ///
    /// `len` of zero is clamped to one sample to keep the buffer invariant.
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.clamp(1, self.samples.len());
        Self {
            samples: self.samples[..len].to_vec(),
            sample_rate: self.sample_rate,
        }
    }

    /// Consume the buffer and return its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Normalize raw decoded samples into an [`AudioBuffer`].
///
/// Integer samples are divided by the declared format's full scale
/// (16-bit: 32767, 32-bit: 2147483647); float samples pass through.
/// Multi-channel input is reduced to mono by averaging each frame.
pub fn prepare(raw: RawAudio, format: SampleFormat) -> Result<AudioBuffer> {
    let channels = raw.channels as usize;
    if channels == 0 {
        return Err(AnalysisError::InvalidBuffer(
            "channel count must be positive".to_string(),
        ));
    }
    if !raw.samples.len().is_multiple_of(channels) {
        return Err(AnalysisError::InvalidBuffer(format!(
            "{} samples do not divide into {} channels",
            raw.samples.len(),
            channels
        )));
    }

    let scaled: Vec<f32> = match (raw.samples, format.full_scale()) {
        (RawSamples::Int(samples), Some(full_scale)) => samples
            .into_iter()
            .map(|s| (f64::from(s) / full_scale) as f32)
            .collect(),
        (RawSamples::Float(samples), None) => samples,
        _ => return Err(AnalysisError::FormatMismatch { declared: format }),
    };

    // Mix down to mono if multi-channel
    let mono = if channels > 1 {
        scaled
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        scaled
    };

    AudioBuffer::new(mono, raw.sample_rate)
}

/// Both buffers' samples cut to the shorter length. Never resamples.
pub fn truncate_to_shorter<'a>(a: &'a AudioBuffer, b: &'a AudioBuffer) -> (&'a [f32], &'a [f32]) {
    let len = a.len().min(b.len());
    (&a.samples[..len], &b.samples[..len])
}
