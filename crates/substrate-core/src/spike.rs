//! Spike event value type shared between the spike bus and telemetry sink.

use crate::{ids::NeuronId, time::Time};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single threshold-crossing event published by a neuron.
///
/// Spike events are ephemeral: they are created on an Inactive→Active
/// transition, forwarded over the spike bus, consumed by the learning
/// engine's STDP window and spike history, and otherwise dropped once they
/// age out of the bounded history window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikeEvent {
    /// The neuron that crossed threshold.
    pub neuron_id: NeuronId,
    /// Monotonic time of the crossing.
    pub timestamp: Time,
}

impl SpikeEvent {
    /// Create a new spike event.
    pub const fn new(neuron_id: NeuronId, timestamp: Time) -> Self {
        Self {
            neuron_id,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let s = SpikeEvent::new(NeuronId::new(3), Time::from_millis(10));
        assert_eq!(s.neuron_id, NeuronId::new(3));
        assert_eq!(s.timestamp, Time::from_millis(10));
    }
}
