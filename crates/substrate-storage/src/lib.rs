//! Telemetry sink and checkpoint codec for the substrate learning engine.
//!
//! This crate knows nothing about spike propagation or plasticity rules; it
//! persists the plain record types handed to it by `substrate-runtime` and
//! never blocks the compute loop while doing so.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod error;
pub mod telemetry;

pub use checkpoint::{Checkpoint, NeuronRecord, NeuronStateCode, RegionRecord, SynapseRecord};
pub use error::{Result, StorageError};
pub use telemetry::{
    InMemoryTelemetryStore, LearningStatsRow, RewardLogRow, SpikeLogRow, SubstrateStateRow,
    TelemetryConfig, TelemetryDropCounters, TelemetryReceiver, TelemetrySink,
};

/// Storage crate version for checkpoint forward-compatibility checks.
pub const STORAGE_VERSION: u32 = checkpoint::CURRENT_VERSION;
