//! Bounded channel forwarding spike events from the compute loop to the
//! learning engine without blocking it under normal load.
//!
//! Modeled on a single bounded `crossbeam` channel rather than a hidden
//! global callback (the teacher's prototype network.rs drives propagation
//! entirely in-process with no bus at all; this generalizes to an explicit,
//! engine-owned channel per spec's "no hidden globals" design note).
//! Backpressure is realized as a bounded send with a timeout: under normal
//! load the channel drains every tick and the send returns immediately; if
//! the consumer stalls long enough that the timeout elapses, the drop is
//! treated as fatal and surfaced as [`RuntimeError::SpikeDropped`].

use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use substrate_core::SpikeEvent;

use crate::error::{Result, RuntimeError};

/// Configuration for a [`SpikeBus`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeBusConfig {
    /// Channel capacity before a publish blocks.
    pub capacity: usize,
    /// How long a publish may block before being treated as a fatal drop.
    pub backpressure_timeout: Duration,
}

impl Default for SpikeBusConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            backpressure_timeout: Duration::from_millis(100),
        }
    }
}

/// The producing half, held by the compute loop.
#[derive(Debug, Clone)]
pub struct SpikeBusSender {
    tx: Sender<SpikeEvent>,
}

impl SpikeBusSender {
    /// Publish a spike event, blocking (backpressure) if the channel is
    /// momentarily full. Returns [`RuntimeError::SpikeDropped`] if the
    /// configured timeout elapses before the consumer drains the channel.
    pub fn publish(&self, event: SpikeEvent, timeout: Duration) -> Result<()> {
        match self.tx.send_timeout(event, timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) | Err(SendTimeoutError::Disconnected(_)) => {
                Err(RuntimeError::SpikeDropped {
                    neuron_id: event.neuron_id.raw(),
                    time: event.timestamp.to_string(),
                })
            }
        }
    }
}

/// The consuming half, held by the learning engine.
#[derive(Debug, Clone)]
pub struct SpikeBusReceiver {
    rx: Receiver<SpikeEvent>,
}

impl SpikeBusReceiver {
    /// Drain every spike event currently queued, without blocking.
    pub fn drain(&self) -> Vec<SpikeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block until either an event arrives or `timeout` elapses, then drain
    /// the rest non-blocking. Used by a tick loop that wants to wait briefly
    /// for in-flight spikes before proceeding.
    pub fn recv_batch(&self, timeout: Duration) -> Vec<SpikeEvent> {
        let mut events = Vec::new();
        match self.rx.recv_timeout(timeout) {
            Ok(event) => events.push(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return events,
        }
        events.extend(self.drain());
        events
    }
}

/// Construct a connected sender/receiver pair.
pub fn spike_bus(config: SpikeBusConfig) -> (SpikeBusSender, SpikeBusReceiver) {
    let (tx, rx) = bounded(config.capacity.max(1));
    (SpikeBusSender { tx }, SpikeBusReceiver { rx })
}
