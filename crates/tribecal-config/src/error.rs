//! Errors raised while loading, saving, or validating calibration settings.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config '{path}': {source}")]
    ReadFile {
        /// Config file path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be written.
    #[error("cannot write config '{path}': {source}")]
    WriteFile {
        /// Config file path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The directory for the configuration file could not be created.
    #[error("cannot create config directory '{path}': {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has mistyped fields.
    #[error("malformed config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The settings could not be rendered as TOML.
    #[error("cannot encode config as TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A setting is out of range
    #[error("invalid setting '{field}': {reason}")]
    Invalid {
        /// Dotted name of the offending setting.
        field: &'static str,
        /// Description of why the value is rejected.
        reason: String,
    },
}

impl ConfigError {
    /// [`ConfigError::ReadFile`] for `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::WriteFile`] for `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::CreateDir`] for `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::Invalid`] for `field`.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
