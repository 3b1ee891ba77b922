//! Error types for analysis operations.

use crate::signal::SampleFormat;
use thiserror::Error;

/// Errors that can occur while preparing or analyzing audio.
///
/// Degenerate input to a correlation is not an error: it yields `NaN`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The buffer violates the canonical buffer invariants.
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    /// Samples do not match the declared bit format.
    #[error("sample data does not match declared format {declared:?}")]
    FormatMismatch {
        /// Format the caller declared for the samples.
        declared: SampleFormat,
    },

    /// Two inputs that must be the same length are not.
    #[error("length mismatch: {left} vs {right} samples")]
    LengthMismatch {
        /// Length of the first input.
        left: usize,
        /// Length of the second input.
        right: usize,
    },

    /// Analysis window size must be at least one sample.
    #[error("invalid analysis window size: {0}")]
    InvalidWindow(usize),

    /// The spectrum has no bin to search.
    #[error("spectrum has no non-DC bins")]
    EmptySpectrum,
}

/// Convenience result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_display() {
        let err = AnalysisError::LengthMismatch {
            left: 10,
            right: 12,
        };
        assert_eq!(err.to_string(), "length mismatch: 10 vs 12 samples");
    }

    #[test]
    fn format_mismatch_display() {
        let err = AnalysisError::FormatMismatch {
            declared: SampleFormat::Int16,
        };
        assert!(err.to_string().contains("Int16"), "got: {err}");
    }
}
