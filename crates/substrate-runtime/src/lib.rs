//! Spike propagation, plasticity and reward engine for the substrate
//! learning core.
//!
//! This crate owns everything that runs on the single compute thread of a
//! brain: the dense neuron and synapse arenas, the spike bus connecting
//! them, the learning engine (Hebbian, STDP, three-factor, consolidation),
//! and the reward pipeline. It depends on `substrate-core` for shared value
//! types and `substrate-storage` for telemetry and checkpointing, but knows
//! nothing about the CLI surface built on top of it.

#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod guardrail;
pub mod kernel;
pub mod learning;
pub mod neuron_store;
pub mod reward;
pub mod spike_bus;
pub mod synapse_store;

pub use config::EngineConfig;
pub use engine::{Brain, BrainBuilder};
pub use error::{Result, RuntimeError};
pub use guardrail::{guard_weight, GuardrailCounters};
pub use kernel::{CpuKernel, KernelBackend};
pub use learning::{
    ConsolidationParams, HebbianParams, LearningEngine, LearningStats, StdpParams, ThreeFactorParams,
};
pub use neuron_store::{NeuronPhase, NeuronStore, NeuronStoreConfig};
pub use reward::{
    ActionDecision, ActionFilter, GatedActionCounters, RewardAccumulator, RewardPipeline, RewardPipelineConfig,
    RewardWeights,
};
pub use spike_bus::{spike_bus, SpikeBusConfig, SpikeBusReceiver, SpikeBusSender};
pub use synapse_store::{ConsolidationState, SynapseStore, SynapseStoreConfig};

/// Version of the runtime engine, bumped whenever a persisted field or wire
/// format changes meaning.
pub const RUNTIME_VERSION: u32 = 1;
