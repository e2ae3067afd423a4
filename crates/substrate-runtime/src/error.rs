//! Error types for the spike propagation, plasticity and reward engine.

use thiserror::Error;

use substrate_core::CoreError;
use substrate_storage::StorageError;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while building or stepping a brain.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A connectivity or region error surfaced from `substrate-core`.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A checkpoint or telemetry error surfaced from `substrate-storage`.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// An edge referenced a neuron id outside the store's range.
    #[error("neuron {neuron_id} does not exist")]
    InvalidNeuronId {
        /// The neuron id that does not exist.
        neuron_id: u32,
    },

    /// A weight or eligibility lookup referenced a synapse id outside the
    /// store's range.
    #[error("synapse {synapse_id} does not exist")]
    InvalidSynapseId {
        /// The synapse id that does not exist.
        synapse_id: u64,
    },

    /// `add_edge` was called with `pre == post`.
    #[error("self-loops are not permitted (neuron {neuron_id})")]
    SelfLoop {
        /// The neuron id that would have formed a self-loop.
        neuron_id: u32,
    },

    /// `add_edge` would push a source neuron's fan-out past the configured
    /// cap.
    #[error("fan-out cap exceeded for neuron {neuron_id}: {attempted} > {cap}")]
    FanOutExceeded {
        /// The source neuron id.
        neuron_id: u32,
        /// The fan-out that was attempted.
        attempted: u32,
        /// The configured cap.
        cap: u32,
    },

    /// A constructor parameter failed validation.
    #[error("invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name.
        parameter: String,
        /// Invalid value, rendered for display.
        value: String,
        /// Constraint description.
        constraint: String,
    },

    /// The spike bus could not deliver an event within its backpressure
    /// timeout. Fatal: the engine must abort the run.
    #[error("spike dropped for neuron {neuron_id} at {time}: bus backpressure timed out")]
    SpikeDropped {
        /// The neuron whose spike could not be delivered.
        neuron_id: u32,
        /// The time of the dropped spike, rendered for display.
        time: String,
    },

    /// A checkpoint failed its version or integrity check. Fatal: the
    /// in-memory state is left unchanged.
    #[error("checkpoint corrupt: {reason}")]
    CheckpointCorrupt {
        /// Description of the corruption.
        reason: String,
    },
}

impl RuntimeError {
    /// Construct an [`RuntimeError::InvalidParameter`].
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Whether this error is fatal to the run (must abort the tick loop),
    /// as opposed to one that is locally recovered.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SpikeDropped { .. } | Self::CheckpointCorrupt { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        let spike_dropped = RuntimeError::SpikeDropped {
            neuron_id: 1,
            time: "1ns".into(),
        };
        assert!(spike_dropped.is_fatal());

        let invalid = RuntimeError::invalid_parameter("tau", "0.0", "> 0.0");
        assert!(!invalid.is_fatal());
    }
}
