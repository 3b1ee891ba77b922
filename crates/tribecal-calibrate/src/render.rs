//! The emulator seam: parameters in, audio out.

use thiserror::Error;
use tribecal_analysis::{AnalysisError, AudioBuffer};

/// Why an emulator could not produce audio for a parameter vector.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The emulator reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The emulator could not be started or its output could not be read.
    #[error("emulator I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The emulator's output file could not be decoded.
    #[error(transparent)]
    Audio(#[from] tribecal_io::Error),

    /// The emulator produced samples that do not form a buffer.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Something that renders candidate audio from a parameter vector.
///
/// Implementations are assumed deterministic for a given parameter vector
/// within one calibration run; the optimizer relies on it.
///
/// Any `Fn(&[f64]) -> Result<AudioBuffer, RenderError>` is a renderer, which
/// is how tests supply synthetic emulators:
///
/// ```rust
/// use tribecal_analysis::AudioBuffer;
/// use tribecal_calibrate::{Render, RenderError};
///
/// let dc = |params: &[f64]| -> Result<AudioBuffer, RenderError> {
///     Ok(AudioBuffer::new(vec![params[0] as f32; 64], 48000)?)
/// };
/// assert_eq!(dc.render(&[0.5]).unwrap().samples()[0], 0.5);
/// ```
pub trait Render {
    /// Render audio for `parameters`.
    fn render(&self, parameters: &[f64]) -> Result<AudioBuffer, RenderError>;
}

impl<F> Render for F
where
    F: Fn(&[f64]) -> Result<AudioBuffer, RenderError>,
{
    fn render(&self, parameters: &[f64]) -> Result<AudioBuffer, RenderError> {
        self(parameters)
    }
}
