//! A/B comparison of a hardware recording and an emulator rendering.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde_json::json;
use tribecal_analysis::{
    HarmonicAnalysis, analyze_spectrum, compare, find_harmonics, sample_rate_mismatch,
};

use super::common::{
    envelope_with_gate, heading, load_audio, load_config, metric, print_events, write_json,
};

/// Features compared beyond the similarity metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisKind {
    /// Harmonic content
    Spectrum,
    /// Envelope timing (requires --gate)
    Timing,
    /// Spectrum and timing
    Both,
}

impl AnalysisKind {
    fn spectrum(self) -> bool {
        matches!(self, Self::Spectrum | Self::Both)
    }

    fn timing(self) -> bool {
        matches!(self, Self::Timing | Self::Both)
    }
}

#[derive(Args)]
pub struct CompareArgs {
    /// Reference audio file (hardware recording)
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Candidate audio file (emulator rendering)
    #[arg(value_name = "CANDIDATE")]
    candidate: PathBuf,

    /// Which features to compare
    #[arg(long, value_enum, default_value = "spectrum")]
    analysis: AnalysisKind,

    /// Gate track (WAV) marking held notes, for timing analysis
    #[arg(long)]
    gate: Option<PathBuf>,

    /// Spectrum analysis window (defaults to the configured size)
    #[arg(long)]
    window_size: Option<usize>,

    /// Configuration file supplying thresholds and defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output detailed JSON report
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: CompareArgs) -> anyhow::Result<()> {
    if args.analysis.timing() && args.gate.is_none() {
        anyhow::bail!("timing analysis requires --gate");
    }
    let config = load_config(args.config.as_deref())?;
    let window_size = args.window_size.unwrap_or(config.window_size);

    println!("A/B Comparison");
    println!("==============");
    println!("  Reference: {}", args.reference.display());
    println!("  Candidate: {}", args.candidate.display());
    println!();

    let reference = load_audio(&args.reference)?;
    let candidate = load_audio(&args.candidate)?;

    if let Some((reference_rate, candidate_rate)) = sample_rate_mismatch(&reference, &candidate) {
        tracing::warn!(reference_rate, candidate_rate, "comparing without resampling");
        println!(
            "  Warning: sample rates differ ({reference_rate} Hz vs {candidate_rate} Hz); \
             comparing without resampling"
        );
        println!();
    }

    let len = reference.len().min(candidate.len());
    println!(
        "Comparing {} samples ({:.2}s at {} Hz)",
        len,
        len as f64 / f64::from(reference.sample_rate()),
        reference.sample_rate()
    );
    println!();

    let metrics = compare(&reference, &candidate);
    let verdict = config.thresholds.classify(metrics.spectral_correlation);

    heading("Similarity");
    println!("  Spectral correlation: {}", metric(metrics.spectral_correlation));
    println!("  Time correlation:     {}", metric(metrics.time_correlation));
    println!("  RMS error:            {}", metric(metrics.rms_error));
    println!("  Verdict:              {verdict}");
    if metrics.is_degenerate() {
        println!("  (silent or constant input; correlation undefined)");
    }
    println!();

    let mut report = json!({
        "reference": args.reference.display().to_string(),
        "candidate": args.candidate.display().to_string(),
        "reference_sample_rate": reference.sample_rate(),
        "candidate_sample_rate": candidate.sample_rate(),
        "compared_samples": len,
        "metrics": metrics,
        "verdict": verdict.to_string(),
    });

    if args.analysis.spectrum() {
        let reference_harmonics =
            find_harmonics(&analyze_spectrum(&reference, window_size)?, None)?;
        let candidate_harmonics =
            find_harmonics(&analyze_spectrum(&candidate, window_size)?, None)?;
        print_harmonic_table(&reference_harmonics, &candidate_harmonics);
        report["spectrum"] = json!({
            "window_size": window_size,
            "reference": reference_harmonics,
            "candidate": candidate_harmonics,
        });
    }

    if args.analysis.timing()
        && let Some(gate_path) = &args.gate
    {
        let gate = load_audio(gate_path)?;
        let reference_events = envelope_with_gate(&reference, &gate)?;
        let candidate_events = envelope_with_gate(&candidate, &gate)?;

        heading("Envelope Timing (reference)");
        print_events(&reference_events);
        println!();
        heading("Envelope Timing (candidate)");
        print_events(&candidate_events);
        println!();

        report["timing"] = json!({
            "gate": gate_path.display().to_string(),
            "reference": reference_events,
            "candidate": candidate_events,
        });
    }

    if let Some(output) = &args.output {
        write_json(output, &report)?;
    }

    Ok(())
}

fn print_harmonic_table(reference: &HarmonicAnalysis, candidate: &HarmonicAnalysis) {
    heading("Harmonics");
    println!(
        "  Fundamental: {:.1} Hz (reference), {:.1} Hz (candidate)",
        reference.fundamental_hz, candidate.fundamental_hz
    );
    println!(
        "  {:>2}  {:>10}  {:>9}  {:>10}  {:>9}  {:>8}",
        "n", "Ref (Hz)", "Ref (dB)", "Cand (Hz)", "Cand (dB)", "Diff"
    );
    for (r, c) in reference.harmonics.iter().zip(&candidate.harmonics) {
        println!(
            "  {:>2}  {:>10.1}  {:>9.1}  {:>10.1}  {:>9.1}  {:>+8.1}",
            r.harmonic,
            r.frequency_hz,
            r.magnitude_db,
            c.frequency_hz,
            c.magnitude_db,
            c.magnitude_db - r.magnitude_db
        );
    }
    println!();
}
