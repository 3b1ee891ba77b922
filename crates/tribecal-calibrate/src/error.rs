//! Error types for calibration operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::render::RenderError;

/// Errors that can occur while calibrating, persisting, or checking regressions.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The reference recording could not be loaded.
    #[error("failed to load reference '{id}': {source}")]
    Reference {
        /// Recording identifier.
        id: String,
        /// Decode or preparation failure.
        #[source]
        source: tribecal_io::Error,
    },

    /// The reference loader has nothing for this identifier.
    #[error("no reference recording for '{0}'")]
    MissingReference(String),

    /// The emulator failed to produce audio outside the optimizer's objective.
    #[error("render failed for '{id}': {source}")]
    Render {
        /// Recording identifier or corpus stem.
        id: String,
        /// Emulator failure.
        #[source]
        source: RenderError,
    },

    /// No starting parameters were supplied.
    #[error("initial parameter vector is empty")]
    NoParameters,

    /// A report, corpus file, or directory listing could not be read.
    #[error("cannot read '{path}': {source}")]
    ReadFile {
        /// Offending path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A report or corpus file could not be written.
    #[error("cannot write '{path}': {source}")]
    WriteFile {
        /// Offending path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An output directory could not be created.
    #[error("cannot create output directory '{path}': {source}")]
    CreateDir {
        /// Offending path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A report or parameter file is not valid JSON of the expected shape.
    #[error("invalid JSON in '{path}': {source}")]
    Json {
        /// Offending file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing or reading corpus audio failed.
    #[error(transparent)]
    Audio(#[from] tribecal_io::Error),
}

impl CalibrationError {
    /// Wrap a read failure at `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalibrationError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Wrap a write failure at `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalibrationError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Wrap a directory creation failure at `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalibrationError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON failure for `path`.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CalibrationError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result type for calibration operations.
pub type Result<T> = std::result::Result<T, CalibrationError>;
