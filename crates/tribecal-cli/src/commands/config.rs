//! Configuration file management.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use tribecal_config::{CalibrationConfig, default_config_file};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show {
        /// Configuration file (default: user config, then built-in defaults)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Write the default configuration
    Init {
        /// Destination (default: user config file)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { path } => {
            let config = CalibrationConfig::load_or_default(path.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommand::Init { path, force } => {
            let path = path.unwrap_or_else(default_config_file);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            CalibrationConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}
