//! Envelope timing from a signal and its gate track
//!
//! The gate track marks when a note is held. Each rising edge paired with
//! the next falling edge delimits one envelope:
//!
//! - **Attack**: time from 10% to 90% of the window's peak amplitude
//! - **Decay**: time after gate-off until the amplitude falls to 37% (1/e)
//!   of its value at gate-off
//!
//! Either measurement may be absent when it cannot be determined; that is a
//! valid outcome, not an error.

use crate::error::{AnalysisError, Result};
use crate::signal::AudioBuffer;
use serde::Serialize;

/// Forward difference of the gate that counts as an edge.
pub const GATE_THRESHOLD: f32 = 0.5;

/// Shortest gate window (samples) that is measured.
pub const MIN_WINDOW_SAMPLES: usize = 10;

/// Maximum samples examined after gate-off for the decay measurement.
pub const DECAY_SEARCH_SAMPLES: usize = 1000;

const ATTACK_LOW: f32 = 0.1;
const ATTACK_HIGH: f32 = 0.9;
const DECAY_RATIO: f32 = 0.37;

/// Timing of one gated envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvelopeEvent {
    /// Sample index of the rising gate edge
    pub gate_on: usize,
    /// Sample index of the falling gate edge
    pub gate_off: usize,
    /// 10%–90% rise time (seconds)
    pub attack_time_s: Option<f64>,
    /// Time to fall to 37% after gate-off (seconds)
    pub decay_time_s: Option<f64>,
    /// Peak absolute amplitude within the gate window
    pub peak_amplitude: f32,
}

/// Rising and falling edges of a gate track.
///
/// An edge at index `i` means `gate[i + 1] - gate[i]` crossed ±0.5.
pub fn gate_edges(gate: &[f32]) -> (Vec<usize>, Vec<usize>) {
    let mut on = Vec::new();
    let mut off = Vec::new();

    for (i, pair) in gate.windows(2).enumerate() {
        let diff = pair[1] - pair[0];
        if diff > GATE_THRESHOLD {
            on.push(i);
        } else if diff < -GATE_THRESHOLD {
            off.push(i);
        }
    }

    (on, off)
}

/// Measure attack and decay for every gate-on/gate-off pair.
///
/// A gate-on without a later gate-off is skipped, as is any window shorter
/// than [`MIN_WINDOW_SAMPLES`].
pub fn measure_envelope(buffer: &AudioBuffer, gate: &[f32]) -> Result<Vec<EnvelopeEvent>> {
    if gate.len() != buffer.len() {
        return Err(AnalysisError::LengthMismatch {
            left: buffer.len(),
            right: gate.len(),
        });
    }

    let samples = buffer.samples();
    let sample_rate = f64::from(buffer.sample_rate());
    let (on_edges, off_edges) = gate_edges(gate);

    let mut events = Vec::new();

    for &gate_on in &on_edges {
        let Some(&gate_off) = off_edges.iter().find(|&&off| off > gate_on) else {
            continue;
        };

        let window = &samples[gate_on..gate_off];
        if window.len() < MIN_WINDOW_SAMPLES {
            continue;
        }

        let peak_amplitude = window.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));

        let attack_time_s = attack_span(window, peak_amplitude).map(|n| n as f64 / sample_rate);
        let decay_end = (gate_off + DECAY_SEARCH_SAMPLES).min(samples.len());
        let decay_time_s = decay_span(&samples[gate_off..decay_end]).map(|n| n as f64 / sample_rate);

        events.push(EnvelopeEvent {
            gate_on,
            gate_off,
            attack_time_s,
            decay_time_s,
            peak_amplitude,
        });
    }

    Ok(events)
}

/// Samples between first reaching 10% and first reaching 90% of `peak`.
fn attack_span(window: &[f32], peak: f32) -> Option<usize> {
    let low = window.iter().position(|s| s.abs() >= peak * ATTACK_LOW)?;
    let high = window.iter().position(|s| s.abs() >= peak * ATTACK_HIGH)?;
    Some(high.saturating_sub(low))
}

/// Samples from gate-off until the amplitude first falls to 37% of its start.
fn decay_span(tail: &[f32]) -> Option<usize> {
    if tail.len() < MIN_WINDOW_SAMPLES {
        return None;
    }
    let threshold = tail[0].abs() * DECAY_RATIO;
    tail.iter().position(|s| s.abs() <= threshold)
}
