//! Non-regression check of the emulator against the stored corpus.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tribecal_calibrate::{check_regression, load_regression_corpus};

use super::common::{heading, load_config, metric, write_json};
use crate::renderer::CommandRenderer;

#[derive(Args)]
pub struct RegressArgs {
    /// Regression corpus directory (params_*.json + audio_*.wav)
    #[arg(value_name = "REFERENCE_DIR")]
    reference_dir: PathBuf,

    /// Emulator command, invoked as `CMD <out.wav> <p0> <p1> ...`
    #[arg(long, value_name = "CMD")]
    render_cmd: String,

    /// Minimum spectral correlation to pass (default: configured threshold)
    #[arg(long)]
    threshold: Option<f64>,

    /// Configuration file (default: user config, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON results (optional)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: RegressArgs) -> anyhow::Result<()> {
    let threshold = match args.threshold {
        Some(t) => t,
        None => load_config(args.config.as_deref())?.thresholds.regression,
    };
    let renderer = CommandRenderer::parse(&args.render_cmd)?;
    let corpus = load_regression_corpus(&args.reference_dir).with_context(|| {
        format!("failed to load corpus from {}", args.reference_dir.display())
    })?;

    println!("Regression Check");
    println!("================");
    println!("  Corpus:    {}", args.reference_dir.display());
    println!("  Threshold: {threshold}");
    println!();

    if corpus.is_empty() {
        println!("No regression cases found");
        return Ok(());
    }

    let results = check_regression(&corpus, &renderer, threshold);

    heading("Cases");
    for result in &results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        let note = if result.finite { "" } else { " (non-finite render)" };
        println!(
            "  [{status}] {}: {}{note}",
            result.stem,
            metric(result.spectral_correlation)
        );
    }
    println!();

    if let Some(output) = &args.output {
        write_json(output, &results)?;
    }

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} regression cases failed", results.len());
    }
    println!("All {} regression cases passed", results.len());
    Ok(())
}
