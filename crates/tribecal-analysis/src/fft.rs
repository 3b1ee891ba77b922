//! FFT wrapper with windowing functions

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Floor added to magnitudes before the logarithm so silent bins stay finite.
pub const MAGNITUDE_FLOOR: f32 = 1e-12;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Hann window (raised cosine)
    Hann,
}

impl Window {
    /// Apply window to a buffer
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        match self {
            Window::Hann => {
                // Symmetric form: zero at both ends, unity at the center.
                if n < 2 {
                    return;
                }
                let denom = (n - 1) as f32;
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos());
                    *sample *= w;
                }
            }
        }
    }

    /// Get window coefficients
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// FFT processor with a cached forward plan
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        Self { fft, size }
    }

    /// Perform forward FFT on real input, returning all `size` bins.
    ///
    /// Input shorter than the FFT size is zero-padded; longer input is truncated.
    pub fn forward_full(&self, input: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer: Vec<Complex<f32>> =
            input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);
        buffer
    }
}

/// Magnitude of every bin of a complex spectrum
pub fn magnitudes(spectrum: &[Complex<f32>]) -> Vec<f32> {
    spectrum.iter().map(|c| c.norm()).collect()
}

/// Convert linear magnitudes to dB: `20·log10(magnitude + 1e-12)`.
///
/// The floor is added before the logarithm, so an exact-zero bin maps to
/// -240 dB rather than `-inf`.
pub fn magnitude_to_db(magnitudes: &[f32]) -> Vec<f32> {
    magnitudes
        .iter()
        .map(|&m| 20.0 * (m + MAGNITUDE_FLOOR).log10())
        .collect()
}
