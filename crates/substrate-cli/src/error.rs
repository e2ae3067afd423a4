//! Error handling for the substrate CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Core error surfaced from `substrate-core`
    #[error("core error: {0}")]
    Core(#[from] substrate_core::CoreError),

    /// Runtime error surfaced from `substrate-runtime`
    #[error("runtime error: {0}")]
    Runtime(#[from] substrate_runtime::RuntimeError),

    /// Storage error surfaced from `substrate-storage`
    #[error("storage error: {0}")]
    Storage(#[from] substrate_storage::StorageError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("invalid config file: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Invalid command arguments
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Process exit code for this error, per the engine's fatal/recoverable
    /// split: a dropped spike, a corrupt checkpoint, or a guardrail budget
    /// overflow is fatal and must surface a non-zero exit; everything else
    /// recovers locally and never reaches this point.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Runtime(err) if err.is_fatal() => 1,
            Self::Storage(err) if err.is_corrupt() => 2,
            _ => 1,
        }
    }
}
