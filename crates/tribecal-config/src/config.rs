//! Calibration settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tribecal_calibrate::{DEFAULT_INITIAL_PARAMETERS, NelderMeadOptions, Thresholds};

use crate::error::ConfigError;
use crate::paths::default_config_file;

fn default_initial_parameters() -> Vec<f64> {
    DEFAULT_INITIAL_PARAMETERS.to_vec()
}

fn default_window_size() -> usize {
    4096
}

/// Where calibration artifacts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory of the calibration report.
    pub results_dir: PathBuf,
    /// Directory of the regression corpus.
    pub reference_dir: PathBuf,
    /// Sample rate of corpus audio (Hz).
    pub corpus_sample_rate: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("calibration_results"),
            reference_dir: PathBuf::from("reference_data"),
            corpus_sample_rate: 44100,
        }
    }
}

/// Settings for a calibration run.
///
/// Every field has a default, so an empty file is a valid configuration:
///
/// ```toml
/// initial_parameters = [2.0, 0.8, 0.0, 0.0]
/// window_size = 4096
///
/// [thresholds]
/// match_achieved = 0.995
/// close_match = 0.99
/// regression = 0.99
///
/// [optimizer]
/// xatol = 1e-4
/// fatol = 1e-4
///
/// [output]
/// results_dir = "calibration_results"
/// reference_dir = "reference_data"
/// corpus_sample_rate = 44100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Starting point of every optimization.
    #[serde(default = "default_initial_parameters")]
    pub initial_parameters: Vec<f64>,
    /// Spectrum analysis window (samples).
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Verdict and regression thresholds.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Nelder–Mead stopping criteria.
    #[serde(default)]
    pub optimizer: NelderMeadOptions,
    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            initial_parameters: default_initial_parameters(),
            window_size: default_window_size(),
            thresholds: Thresholds::default(),
            optimizer: NelderMeadOptions::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CalibrationConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Without one, the user config file is
    /// used if present, otherwise the built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let user_file = default_config_file();
                if user_file.is_file() {
                    Self::load(user_file)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_parameters.is_empty() {
            return Err(ConfigError::invalid(
                "initial_parameters",
                "at least one parameter is required",
            ));
        }
        if self.initial_parameters.iter().any(|p| !p.is_finite()) {
            return Err(ConfigError::invalid(
                "initial_parameters",
                "parameters must be finite",
            ));
        }
        if self.window_size < 2 {
            return Err(ConfigError::invalid(
                "window_size",
                format!("must be at least 2, got {}", self.window_size),
            ));
        }

        let t = &self.thresholds;
        for (field, value) in [
            ("thresholds.match_achieved", t.match_achieved),
            ("thresholds.close_match", t.close_match),
            ("thresholds.regression", t.regression),
        ] {
            if !(value > -1.0 && value <= 1.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be in (-1, 1], got {value}"),
                ));
            }
        }
        if t.close_match > t.match_achieved {
            return Err(ConfigError::invalid(
                "thresholds.close_match",
                format!(
                    "{} exceeds match_achieved {}",
                    t.close_match, t.match_achieved
                ),
            ));
        }

        let o = &self.optimizer;
        for (field, value) in [("optimizer.xatol", o.xatol), ("optimizer.fatol", o.fatol)] {
            if !(value > 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be positive, got {value}"),
                ));
            }
        }
        if o.max_iterations == Some(0) {
            return Err(ConfigError::invalid(
                "optimizer.max_iterations",
                "must be positive",
            ));
        }
        if o.max_evaluations == Some(0) {
            return Err(ConfigError::invalid(
                "optimizer.max_evaluations",
                "must be positive",
            ));
        }

        if self.output.corpus_sample_rate == 0 {
            return Err(ConfigError::invalid(
                "output.corpus_sample_rate",
                "must be positive",
            ));
        }

        Ok(())
    }
}
