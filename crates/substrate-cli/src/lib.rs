//! Command-line interface to the substrate learning and plasticity core.
//!
//! Wires a [`substrate_runtime::Brain`] to CLI flags, a TOML configuration
//! file, and the environment, following the CLI > env > file > built-in
//! default precedence. The binary (`src/main.rs`) wires up logging and
//! argument parsing, calling [`SubstrateCli::execute`].

pub mod commands;
pub mod config;
pub mod error;

pub use commands::SubstrateCli;
