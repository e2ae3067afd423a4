//! CLI command implementations for the substrate engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SubstrateConfig;
use crate::error::CliResult;

pub mod config;
pub mod inspect;
pub mod run;

/// Command-line interface to the substrate learning and plasticity core.
#[derive(Parser, Debug)]
#[command(
    name = "substrate",
    version,
    about = "Spike propagation, plasticity and reward engine for a hypergraph neural substrate"
)]
pub struct SubstrateCli {
    /// Configuration file path; defaults to the platform config directory.
    #[arg(short, long, global = true, env = "SUBSTRATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a brain for a fixed number of ticks.
    Run(run::RunCommand),
    /// Inspect a checkpoint file.
    Inspect(inspect::InspectCommand),
    /// Manage the configuration file.
    Config(config::ConfigCommand),
}

impl SubstrateCli {
    /// Execute the selected command.
    pub fn execute(self) -> CliResult<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => SubstrateConfig::default_config_path()?,
        };
        let config = SubstrateConfig::load_from_file(&config_path)?;

        match self.command {
            Commands::Run(cmd) => cmd.execute(&config),
            Commands::Inspect(cmd) => cmd.execute(),
            Commands::Config(cmd) => cmd.execute(),
        }
    }
}
