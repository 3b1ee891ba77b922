//! Helpers shared by the commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tribecal_analysis::{AudioBuffer, EnvelopeEvent, measure_envelope};
use tribecal_calibrate::{CalibrationError, ReferenceLoader};
use tribecal_config::CalibrationConfig;

/// Load a WAV file as a canonical mono buffer.
pub fn load_audio(path: &Path) -> anyhow::Result<AudioBuffer> {
    tribecal_io::load_buffer(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Envelope events of `buffer` against a gate track, over their common length.
pub fn envelope_with_gate(
    buffer: &AudioBuffer,
    gate: &AudioBuffer,
) -> anyhow::Result<Vec<EnvelopeEvent>> {
    let len = buffer.len().min(gate.len());
    if len != buffer.len() || len != gate.len() {
        tracing::warn!(
            signal = buffer.len(),
            gate = gate.len(),
            "signal and gate lengths differ; using the shorter"
        );
    }
    let events = measure_envelope(&buffer.truncated(len), &gate.samples()[..len])?;
    Ok(events)
}

/// Print one line per envelope event.
pub fn print_events(events: &[EnvelopeEvent]) {
    if events.is_empty() {
        println!("  No complete gate windows found");
        return;
    }
    for (i, event) in events.iter().enumerate() {
        let attack = event
            .attack_time_s
            .map_or_else(|| "n/a".to_string(), |t| format!("{:.2} ms", t * 1000.0));
        let decay = event
            .decay_time_s
            .map_or_else(|| "n/a".to_string(), |t| format!("{:.2} ms", t * 1000.0));
        println!(
            "  Note {:>2}: samples {}..{}  attack {attack}  decay {decay}  peak {:.3}",
            i + 1,
            event.gate_on,
            event.gate_off,
            event.peak_amplitude
        );
    }
}

/// Effective configuration: `--config` if given, else the user file, else defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<CalibrationConfig> {
    CalibrationConfig::load_or_default(explicit).context("failed to load configuration")
}

/// Write a value as pretty JSON and say so.
pub fn write_json(path: &Path, value: &impl Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote detailed report to {}", path.display());
    Ok(())
}

/// Metric for display; undefined correlations print as such.
pub fn metric(value: f64) -> String {
    if value.is_nan() {
        "undefined".to_string()
    } else {
        format!("{value:.4}")
    }
}

/// Print a section heading underlined to its width.
pub fn heading(title: &str) {
    println!("{title}");
    println!("{}", "-".repeat(title.len()));
}

/// Loads `<dir>/<id>.wav` (or `.WAV`) as the reference for `id`.
pub struct WavDirectoryLoader {
    dir: PathBuf,
}

impl WavDirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        let lower = self.dir.join(format!("{id}.wav"));
        if lower.is_file() {
            return lower;
        }
        let upper = self.dir.join(format!("{id}.WAV"));
        if upper.is_file() { upper } else { lower }
    }
}

impl ReferenceLoader for WavDirectoryLoader {
    fn load(&self, id: &str) -> Result<AudioBuffer, CalibrationError> {
        tribecal_io::load_buffer(self.path_for(id)).map_err(|source| CalibrationError::Reference {
            id: id.to_string(),
            source,
        })
    }
}
