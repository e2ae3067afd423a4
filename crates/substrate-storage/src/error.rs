//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by the telemetry sink and checkpoint codec.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Invalid magic number in a checkpoint container.
    #[error("invalid magic number: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Expected magic number.
        expected: [u8; 4],
        /// Magic number actually found.
        found: [u8; 4],
    },

    /// Checkpoint version newer than this reader supports.
    #[error("unsupported checkpoint version: {version}, supported up to {supported}")]
    UnsupportedVersion {
        /// Version found in the container.
        version: u32,
        /// Highest version this build can read.
        supported: u32,
    },

    /// CRC32 integrity check failed.
    #[error("checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Checksum recorded in the container.
        expected: u32,
        /// Checksum computed over the body on load.
        computed: u32,
    },

    /// Container is truncated or otherwise malformed.
    #[error("malformed checkpoint container: {reason}")]
    Malformed {
        /// Description of the malformation.
        reason: String,
    },

    /// Failed to encode or decode a checkpoint section.
    #[error("codec error: {0}")]
    Codec(#[from] Box<bincode::ErrorKind>),

    /// I/O error while reading or writing a checkpoint file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Construct a [`StorageError::Malformed`] from any displayable reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Whether this error means the checkpoint is corrupt (as opposed to
    /// an I/O failure that might succeed on retry).
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::UnsupportedVersion { .. }
                | Self::ChecksumMismatch { .. }
                | Self::Malformed { .. }
                | Self::Codec(_)
        )
    }
}
