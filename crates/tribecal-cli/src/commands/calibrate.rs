//! Batch calibration of a recordings directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tribecal_calibrate::{
    BatchReport, Calibrator, Diagnostic, NelderMead, REPORT_FILE_NAME, discover_recordings, save_report,
    write_regression_corpus,
};

use super::common::{WavDirectoryLoader, heading, load_config, metric};
use crate::renderer::CommandRenderer;

#[derive(Args)]
pub struct CalibrateArgs {
    /// Directory of reference recordings (*.wav)
    #[arg(value_name = "RECORDINGS_DIR")]
    recordings: PathBuf,

    /// Emulator command, invoked as `CMD <out.wav> <p0> <p1> ...`
    #[arg(long, value_name = "CMD")]
    render_cmd: String,

    /// Configuration file (default: user config, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write calibration_results.json
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Where to write the regression corpus
    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// Skip writing the regression corpus
    #[arg(long)]
    no_corpus: bool,

    /// Calibrate recordings concurrently (needs the `parallel` feature)
    #[arg(long)]
    parallel: bool,
}

pub fn run(args: CalibrateArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let renderer = CommandRenderer::parse(&args.render_cmd)?;

    let ids = discover_recordings(&args.recordings).with_context(|| {
        format!("failed to list recordings in {}", args.recordings.display())
    })?;

    println!("Calibration");
    println!("===========");
    println!("  Recordings: {}", args.recordings.display());
    println!("  Emulator:   {}", args.render_cmd);
    println!("  Start:      {:?}", config.initial_parameters);
    println!();

    if ids.is_empty() {
        println!("No .wav recordings found in {}", args.recordings.display());
        return Ok(());
    }

    let calibrator = Calibrator::with_minimizer(
        config.initial_parameters.clone(),
        NelderMead::new(config.optimizer),
    )
    .with_thresholds(config.thresholds);
    let loader = WavDirectoryLoader::new(&args.recordings);

    let report = calibrate_all(args.parallel, &calibrator, &ids, &loader, &renderer)?;

    heading("Results");
    for (id, record) in &report.records {
        let verdict = config.thresholds.classify(record.target_similarity);
        println!(
            "  {id}: {verdict} (spectral {}, params {:?})",
            metric(record.target_similarity),
            record.optimal_parameters
        );
    }
    println!();

    let advisories: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| !matches!(d, Diagnostic::Verdict { .. }))
        .collect();
    if !advisories.is_empty() {
        heading("Diagnostics");
        for diagnostic in advisories {
            println!("  {diagnostic}");
        }
        println!();
    }

    if !report.failures.is_empty() {
        heading("Skipped");
        for failure in &report.failures {
            println!("  {}: {}", failure.id, failure.error);
        }
        println!();
    }

    let results_dir = args.results_dir.unwrap_or(config.output.results_dir);
    let report_path = results_dir.join(REPORT_FILE_NAME);
    save_report(&report_path, &report.records)?;
    println!(
        "Calibrated {} of {} recordings; results saved to {}",
        report.records.len(),
        ids.len(),
        report_path.display()
    );

    if !args.no_corpus && !report.records.is_empty() {
        let reference_dir = args.reference_dir.unwrap_or(config.output.reference_dir);
        let summary = write_regression_corpus(
            &reference_dir,
            &report.records,
            &renderer,
            config.output.corpus_sample_rate,
        )?;
        println!(
            "Wrote {} regression cases to {}",
            summary.written.len(),
            reference_dir.display()
        );
        for failure in &summary.failures {
            println!("  Skipped {}: {}", failure.id, failure.error);
        }
    }

    Ok(())
}

fn calibrate_all(
    parallel: bool,
    calibrator: &Calibrator,
    ids: &[String],
    loader: &WavDirectoryLoader,
    renderer: &CommandRenderer,
) -> anyhow::Result<BatchReport> {
    if parallel {
        #[cfg(feature = "parallel")]
        {
            return Ok(calibrator.run_batch_parallel(ids, loader, renderer));
        }
        #[cfg(not(feature = "parallel"))]
        tracing::warn!("built without the parallel feature; calibrating sequentially");
    }

    let progress = ProgressBar::new(ids.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let report = calibrator.run_batch_with_progress(ids, loader, renderer, |id| {
        progress.set_message(id.to_string());
        progress.inc(1);
    });
    progress.finish_with_message("done");

    Ok(report)
}
