//! Spectral analysis utilities

use crate::error::{AnalysisError, Result};
use crate::fft::{Fft, Window, magnitude_to_db};
use crate::signal::AudioBuffer;
use serde::Serialize;

/// Default analysis window length in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Number of harmonics reported by [`find_harmonics`].
pub const HARMONIC_COUNT: u32 = 5;

/// Magnitude spectrum over the non-negative frequencies of an analysis window.
///
/// `frequencies` is strictly ascending from 0 Hz and holds
/// `window_size / 2` bins; `magnitude_db` is parallel to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumFeature {
    /// Bin center frequencies (Hz)
    pub frequencies: Vec<f32>,
    /// Magnitude per bin (dB)
    pub magnitude_db: Vec<f32>,
    /// Sample rate of the analyzed buffer (Hz)
    pub sample_rate: u32,
    /// Effective analysis window length (samples)
    pub window_size: usize,
}

impl SpectrumFeature {
    /// Build a feature from linear magnitudes of bins `0..magnitudes.len()`.
    pub(crate) fn from_magnitudes(magnitudes: &[f32], sample_rate: u32, window_size: usize) -> Self {
        let bin_width = sample_rate as f32 / window_size as f32;
        Self {
            frequencies: (0..magnitudes.len())
                .map(|k| k as f32 * bin_width)
                .collect(),
            magnitude_db: magnitude_to_db(magnitudes),
            sample_rate,
            window_size,
        }
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// `true` when the spectrum has no bins (single-sample window).
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency resolution in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.window_size as f32
    }

    /// Loudest bin after DC as `(frequency_hz, magnitude_db)`.
    ///
    /// Ties resolve to the lowest frequency.
    pub fn peak(&self) -> Option<(f32, f32)> {
        let mut best: Option<usize> = None;
        for i in 1..self.magnitude_db.len() {
            match best {
                Some(b) if self.magnitude_db[i] <= self.magnitude_db[b] => {}
                _ => best = Some(i),
            }
        }
        best.map(|i| (self.frequencies[i], self.magnitude_db[i]))
    }

    /// Index of the bin closest to `freq_hz`, ties resolving to the lower bin.
    pub fn nearest_bin(&self, freq_hz: f32) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &f) in self.frequencies.iter().enumerate() {
            let distance = (f - freq_hz).abs();
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((i, distance)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Magnitude (dB) of the bin nearest to `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f32) -> Option<f32> {
        self.nearest_bin(freq_hz).map(|i| self.magnitude_db[i])
    }
}

/// One harmonic of the fundamental, read from the nearest spectrum bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HarmonicEntry {
    /// Harmonic number (1 = fundamental)
    pub harmonic: u32,
    /// Frequency of the nearest bin (Hz)
    pub frequency_hz: f32,
    /// Magnitude of the nearest bin (dB)
    pub magnitude_db: f32,
}

/// Fundamental frequency and the harmonics found at its integer multiples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicAnalysis {
    /// Fundamental used for the lookup (Hz)
    pub fundamental_hz: f32,
    /// Harmonics 1 through 5, in order
    pub harmonics: Vec<HarmonicEntry>,
}

/// Averaged magnitude spectrum of a buffer.
///
/// The buffer is split into non-overlapping windows of `window_size` samples.
/// Each window gets a Hann taper and an FFT; magnitudes are averaged across
/// complete windows (a trailing partial window is dropped), the upper half is
/// discarded, and the result is converted to dB. A buffer shorter than one
/// window is analyzed as a single window of its own length.
pub fn analyze_spectrum(buffer: &AudioBuffer, window_size: usize) -> Result<SpectrumFeature> {
    if window_size == 0 {
        return Err(AnalysisError::InvalidWindow(window_size));
    }

    let samples = buffer.samples();
    let window_size = if samples.len() < window_size {
        samples.len()
    } else {
        window_size
    };
    let num_windows = samples.len() / window_size;

    let fft = Fft::new(window_size);
    let taper = Window::Hann.coefficients(window_size);
    let half = window_size / 2;

    let mut avg = vec![0.0f32; half];
    let mut chunk = vec![0.0f32; window_size];

    for window in samples.chunks_exact(window_size) {
        for ((dst, &s), &w) in chunk.iter_mut().zip(window).zip(&taper) {
            *dst = s * w;
        }
        let spectrum = fft.forward_full(&chunk);
        for (acc, c) in avg.iter_mut().zip(&spectrum[..half]) {
            *acc += c.norm();
        }
    }

    for val in &mut avg {
        *val /= num_windows as f32;
    }

    Ok(SpectrumFeature::from_magnitudes(
        &avg,
        buffer.sample_rate(),
        window_size,
    ))
}

/// Look up harmonics 1..=5 of a fundamental in a spectrum.
///
/// Without a supplied fundamental, the loudest bin after DC is used. Each
/// harmonic reports the bin nearest to `fundamental × n`.
pub fn find_harmonics(
    spectrum: &SpectrumFeature,
    fundamental_hz: Option<f32>,
) -> Result<HarmonicAnalysis> {
    let fundamental_hz = match fundamental_hz {
        Some(f) if !spectrum.is_empty() => f,
        Some(_) => return Err(AnalysisError::EmptySpectrum),
        None => spectrum.peak().ok_or(AnalysisError::EmptySpectrum)?.0,
    };

    let mut harmonics = Vec::with_capacity(HARMONIC_COUNT as usize);
    for harmonic in 1..=HARMONIC_COUNT {
        let target = fundamental_hz * harmonic as f32;
        let idx = spectrum
            .nearest_bin(target)
            .ok_or(AnalysisError::EmptySpectrum)?;
        harmonics.push(HarmonicEntry {
            harmonic,
            frequency_hz: spectrum.frequencies[idx],
            magnitude_db: spectrum.magnitude_db[idx],
        });
    }

    Ok(HarmonicAnalysis {
        fundamental_hz,
        harmonics,
    })
}
