//! Feature extraction commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::json;
use tribecal_analysis::{analyze_spectrum, estimate_transfer_function, find_harmonics};

use super::common::{
    envelope_with_gate, heading, load_audio, load_config, print_events, write_json,
};

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(subcommand)]
    command: AnalyzeCommand,
}

#[derive(Subcommand)]
enum AnalyzeCommand {
    /// Averaged spectrum and harmonic content of an audio file
    Spectrum {
        /// Input WAV file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Analysis window (defaults to the configured size)
        #[arg(long)]
        window_size: Option<usize>,

        /// Fundamental frequency in Hz (default: loudest bin)
        #[arg(long)]
        fundamental: Option<f32>,

        /// Configuration file supplying the default window size
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Attack and decay timing of each gated note
    Envelope {
        /// Input WAV file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Gate track (WAV) marking held notes
        #[arg(long)]
        gate: PathBuf,

        /// Output JSON file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transfer function and -3 dB cutoff between two files
    Transfer {
        /// Input (dry) WAV file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output (filtered) WAV file
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,

        /// Output JSON file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    match args.command {
        AnalyzeCommand::Spectrum {
            input,
            window_size,
            fundamental,
            config,
            output,
        } => run_spectrum(
            &input,
            window_size,
            fundamental,
            config.as_deref(),
            output.as_deref(),
        ),
        AnalyzeCommand::Envelope {
            input,
            gate,
            output,
        } => run_envelope(&input, &gate, output.as_deref()),
        AnalyzeCommand::Transfer {
            input,
            output_file,
            output,
        } => run_transfer(&input, &output_file, output.as_deref()),
    }
}

fn run_spectrum(
    input: &Path,
    window_size: Option<usize>,
    fundamental: Option<f32>,
    config: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let window_size = match window_size {
        Some(size) => size,
        None => load_config(config)?.window_size,
    };

    println!("Spectrum Analysis");
    println!("=================");
    println!("  File: {}", input.display());

    let info = tribecal_io::read_wav_info(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    println!(
        "  Format: {:?}, {} channel(s), {} frames",
        info.format, info.channels, info.num_frames
    );

    let buffer = load_audio(input)?;
    let spectrum = analyze_spectrum(&buffer, window_size)?;
    let harmonics = find_harmonics(&spectrum, fundamental)?;

    println!(
        "  {} samples ({:.2}s) at {} Hz, window {} ({:.2} Hz bins)",
        buffer.len(),
        buffer.duration_secs(),
        buffer.sample_rate(),
        spectrum.window_size,
        spectrum.bin_width()
    );
    println!();

    heading("Harmonics");
    println!("  Fundamental: {:.1} Hz", harmonics.fundamental_hz);
    for entry in &harmonics.harmonics {
        println!(
            "  H{}: {:>9.1} Hz  {:>7.1} dB",
            entry.harmonic, entry.frequency_hz, entry.magnitude_db
        );
    }
    println!();

    if let Some(output) = output {
        write_json(
            output,
            &json!({
                "file": input.display().to_string(),
                "sample_rate": buffer.sample_rate(),
                "channels": info.channels,
                "format": info.format,
                "harmonics": harmonics,
                "spectrum": spectrum,
            }),
        )?;
    }

    Ok(())
}

fn run_envelope(input: &Path, gate: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    println!("Envelope Timing");
    println!("===============");
    println!("  File: {}", input.display());
    println!("  Gate: {}", gate.display());
    println!();

    let buffer = load_audio(input)?;
    let gate_buffer = load_audio(gate)?;
    let events = envelope_with_gate(&buffer, &gate_buffer)?;

    heading("Notes");
    print_events(&events);
    println!();

    if let Some(output) = output {
        write_json(
            output,
            &json!({
                "file": input.display().to_string(),
                "gate": gate.display().to_string(),
                "sample_rate": buffer.sample_rate(),
                "events": events,
            }),
        )?;
    }

    Ok(())
}

fn run_transfer(input: &Path, output_file: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    println!("Transfer Function");
    println!("=================");
    println!("  Input:  {}", input.display());
    println!("  Output: {}", output_file.display());

    let dry = load_audio(input)?;
    let wet = load_audio(output_file)?;
    let len = dry.len().min(wet.len());
    let feature = estimate_transfer_function(&dry.truncated(len), &wet.truncated(len))?;

    println!(
        "  {} samples at {} Hz ({:.2} Hz resolution)",
        len,
        dry.sample_rate(),
        feature.spectrum.bin_width()
    );
    println!();

    heading("Cutoff");
    match feature.cutoff_hz {
        Some(cutoff) => println!("  -3 dB point: {cutoff:.1} Hz"),
        None => println!("  No -3 dB point found (flat response)"),
    }
    println!();

    if let Some(output) = output {
        write_json(
            output,
            &json!({
                "input": input.display().to_string(),
                "output": output_file.display().to_string(),
                "transfer_function": feature,
            }),
        )?;
    }

    Ok(())
}
