//! Configuration for tribecal calibration runs.
//!
//! Settings live in a TOML file (by default `tribecal.toml` in the user
//! config directory). Every field is optional; missing fields take the
//! built-in defaults, and the loaded configuration is validated before use.
//!
//! # Example
//!
//! ```rust,no_run
//! use tribecal_config::CalibrationConfig;
//!
//! // Explicit file, else the user config file, else defaults
//! let config = CalibrationConfig::load_or_default(None).unwrap();
//! println!("Starting from {:?}", config.initial_parameters);
//!
//! let mut tuned = config.clone();
//! tuned.optimizer.max_evaluations = Some(400);
//! tuned.save("tribecal.toml").unwrap();
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::{CalibrationConfig, OutputConfig};
pub use error::ConfigError;
pub use paths::{CONFIG_FILE_NAME, default_config_file, user_config_dir};
