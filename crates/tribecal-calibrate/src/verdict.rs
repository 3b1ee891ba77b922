//! Advisory classification of calibration quality.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How closely a calibrated render matches its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Spectral correlation above `match_achieved`.
    MatchAchieved,
    /// Spectral correlation above `close_match`.
    CloseMatch,
    /// Anything else, including an undefined (NaN) correlation.
    Divergent,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::MatchAchieved => write!(f, "match achieved"),
            Verdict::CloseMatch => write!(f, "close match"),
            Verdict::Divergent => write!(f, "divergent"),
        }
    }
}

/// Correlation thresholds used for verdicts and regression checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Strict lower bound for [`Verdict::MatchAchieved`].
    pub match_achieved: f64,
    /// Strict lower bound for [`Verdict::CloseMatch`].
    pub close_match: f64,
    /// Strict lower bound for a regression case to pass.
    pub regression: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            match_achieved: 0.995,
            close_match: 0.99,
            regression: 0.99,
        }
    }
}

impl Thresholds {
    /// Classify a spectral correlation. NaN is always divergent.
    pub fn classify(&self, spectral_correlation: f64) -> Verdict {
        if spectral_correlation > self.match_achieved {
            Verdict::MatchAchieved
        } else if spectral_correlation > self.close_match {
            Verdict::CloseMatch
        } else {
            Verdict::Divergent
        }
    }
}
