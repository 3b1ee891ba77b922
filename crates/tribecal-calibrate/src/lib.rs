//! Parameter calibration of a synthesizer emulator against reference recordings.
//!
//! The emulator is an opaque [`Render`] implementation: parameters in, audio
//! out. [`Optimizer`] searches parameter space for the render whose spectrum
//! best matches a reference, [`Calibrator`] runs that search over a batch of
//! recordings, and the [`corpus`] module turns the results into regression
//! cases for later non-regression checks.
//!
//! # Example
//!
//! ```rust,no_run
//! use tribecal_analysis::AudioBuffer;
//! use tribecal_calibrate::{
//!     CalibrationError, Calibrator, RenderError, discover_recordings, save_report,
//! };
//!
//! let emulator = |params: &[f64]| -> Result<AudioBuffer, RenderError> {
//!     let samples = (0..44100)
//!         .map(|i| (params[0] as f32 * i as f32 / 44100.0).sin() * params[1] as f32)
//!         .collect();
//!     Ok(AudioBuffer::new(samples, 44100)?)
//! };
//! let loader = |id: &str| -> Result<AudioBuffer, CalibrationError> {
//!     tribecal_io::load_buffer(format!("recordings/{id}.wav")).map_err(|source| {
//!         CalibrationError::Reference { id: id.to_string(), source }
//!     })
//! };
//!
//! let ids = discover_recordings("recordings").unwrap();
//! let report = Calibrator::default().run_batch(&ids, &loader, &emulator);
//! for diagnostic in &report.diagnostics {
//!     println!("{diagnostic}");
//! }
//! save_report("calibration_results/calibration_results.json", &report.records).unwrap();
//! ```

pub mod conditions;
pub mod corpus;
mod error;
pub mod minimize;
pub mod optimize;
pub mod orchestrator;
mod record;
pub mod render;
pub mod report;
pub mod verdict;

pub use conditions::{MalformedPair, ParsedConditions, parse_conditions};
pub use corpus::{
    CorpusSummary, RegressionCase, RegressionResult, check_regression, load_regression_corpus,
    write_regression_corpus,
};
pub use error::{CalibrationError, Result};
pub use minimize::{Minimizer, Minimum, NelderMead, NelderMeadOptions};
pub use optimize::{OptimizationOutcome, Optimizer};
pub use orchestrator::{
    BatchFailure, BatchReport, Calibrated, Calibrator, DEFAULT_INITIAL_PARAMETERS, Diagnostic,
    ReferenceLoader, discover_recordings,
};
pub use record::{CalibrationRecord, CalibrationRecords};
pub use render::{Render, RenderError};
pub use report::{REPORT_FILE_NAME, load_report, save_report};
pub use verdict::{Thresholds, Verdict};
