//! Audio file I/O for tribecal.
//!
//! Decodes WAV recordings into [`RawAudio`](tribecal_analysis::RawAudio)
//! and hands them to signal preparation, and writes rendered buffers back
//! out for the regression corpus.
//!
//! ```rust,ignore
//! use tribecal_io::{load_buffer, write_wav};
//!
//! let reference = load_buffer("recordings/monotribe_cutoff_50.wav")?;
//! println!("{} samples at {} Hz", reference.len(), reference.sample_rate());
//! write_wav("copy.wav", &reference)?;
//! ```

mod wav;

pub use wav::{WavInfo, decode, load_buffer, read_wav_info, write_wav};

use std::path::PathBuf;

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file could not be opened or decoded as WAV.
    #[error("unreadable audio {path}: {source}")]
    UnreadableAudio {
        /// File that failed to decode.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: hound::Error,
    },

    /// The WAV header declares a bit depth with no matching sample format.
    #[error("unsupported sample format in {path}: {bits_per_sample}-bit {kind}")]
    UnsupportedFormat {
        /// File with the unsupported header.
        path: PathBuf,
        /// Declared bit depth.
        bits_per_sample: u16,
        /// "int" or "float".
        kind: &'static str,
    },

    /// The decoded samples do not form a valid buffer.
    #[error("invalid audio in {path}: {source}")]
    Analysis {
        /// File whose contents were rejected.
        path: PathBuf,
        /// Rejection reason from signal preparation.
        #[source]
        source: tribecal_analysis::AnalysisError,
    },

    /// Writing a WAV file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination file.
        path: PathBuf,
        /// Encoder error.
        #[source]
        source: hound::Error,
    },
}

impl Error {
    /// `true` for decode failures that a batch should skip rather than abort on.
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            Error::UnreadableAudio { .. } | Error::UnsupportedFormat { .. } | Error::Analysis { .. }
        )
    }
}

/// Result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
