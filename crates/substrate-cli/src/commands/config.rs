//! Write or display the substrate configuration file.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::info;

use crate::config::SubstrateConfig;
use crate::error::CliResult;

/// Manage the substrate configuration file.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub sub: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Write a default configuration file.
    Init(ConfigInit),
    /// Print the effective configuration (defaults merged with the file, if any).
    Show(ConfigShow),
}

/// Write a default configuration file.
#[derive(Args, Debug)]
pub struct ConfigInit {
    /// Destination path; defaults to the platform config directory.
    pub path: Option<PathBuf>,
}

/// Print the effective configuration.
#[derive(Args, Debug)]
pub struct ConfigShow {
    /// Path to read; defaults to the platform config directory.
    pub path: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn execute(self) -> CliResult<()> {
        match self.sub {
            ConfigSubcommand::Init(cmd) => cmd.execute(),
            ConfigSubcommand::Show(cmd) => cmd.execute(),
        }
    }
}

impl ConfigInit {
    pub fn execute(self) -> CliResult<()> {
        let path = match self.path {
            Some(path) => path,
            None => SubstrateConfig::default_config_path()?,
        };
        SubstrateConfig::default().save_to_file(&path)?;
        info!("wrote default configuration to {}", path.display());
        Ok(())
    }
}

impl ConfigShow {
    pub fn execute(self) -> CliResult<()> {
        let path = match self.path {
            Some(path) => path,
            None => SubstrateConfig::default_config_path()?,
        };
        let config = SubstrateConfig::load_from_file(&path)?;
        print!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }
}
