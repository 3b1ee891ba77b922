//! Tribecal CLI - calibrate a synthesizer emulator against hardware recordings.

mod commands;
mod renderer;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tribecal")]
#[command(author, version, about = "Synthesizer emulator calibration toolkit", long_about = None)]
struct Cli {
    /// Log optimizer and file activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a candidate rendering against a reference recording
    Compare(commands::compare::CompareArgs),

    /// Extract spectrum, envelope, or transfer-function features
    Analyze(commands::analyze::AnalyzeArgs),

    /// Fit emulator parameters to a directory of recordings
    Calibrate(commands::calibrate::CalibrateArgs),

    /// Re-render the regression corpus and check it still matches
    Regress(commands::regress::RegressArgs),

    /// Show or initialize the configuration file
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compare(args) => commands::compare::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Regress(args) => commands::regress::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
