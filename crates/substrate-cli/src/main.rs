//! Substrate CLI binary entry point.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use substrate_cli::commands::SubstrateCli;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let cli = SubstrateCli::parse();

    if let Err(err) = cli.execute() {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
}
