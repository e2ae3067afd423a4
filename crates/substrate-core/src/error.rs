//! Error types for the core crate.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = core::result::Result<T, CoreError>;

/// Errors raised by identifier, region and connectivity bookkeeping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// An input vector's length did not match the target region's neuron
    /// count. Surfaced immediately to the caller; no side effects.
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch {
        /// Expected vector length.
        expected: usize,
        /// Actual vector length supplied.
        actual: usize,
    },

    /// Two regions attempted to claim the same neuron ID.
    #[error("regions '{a}' and '{b}' have overlapping neuron ranges")]
    OverlappingRegions {
        /// Name of the first region.
        a: String,
        /// Name of the second region.
        b: String,
    },

    /// A region name was registered twice.
    #[error("region name '{name}' is already in use")]
    DuplicateRegionName {
        /// The duplicated name.
        name: String,
    },

    /// A connectivity pass referenced a neuron ID outside any region.
    #[error("neuron {neuron_id} is not owned by any region")]
    UnownedNeuron {
        /// The neuron ID that could not be resolved.
        neuron_id: u32,
    },

    /// A connectivity pass would exceed the configured fan-out cap.
    #[error("fan-out cap exceeded for neuron {neuron_id}: {attempted} > {cap}")]
    FanOutExceeded {
        /// The source neuron ID.
        neuron_id: u32,
        /// The fan-out that was attempted.
        attempted: u32,
        /// The configured cap.
        cap: u32,
    },

    /// A projection was planned with a density outside `(0, 1]`.
    #[error("invalid projection density {density}: must be in (0, 1]")]
    InvalidDensity {
        /// The out-of-range density that was supplied.
        density: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_display() {
        let err = CoreError::ShapeMismatch {
            expected: 4,
            actual: 2,
        };
        assert!(err.to_string().contains("expected 4"));
    }
}
