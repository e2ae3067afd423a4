//! Aggregate engine configuration: every tunable named across spec §4/§5/§6,
//! each with a `Default` matching the documented default.

use substrate_storage::TelemetryConfig;

use crate::learning::{ConsolidationParams, HebbianParams, StdpParams, ThreeFactorParams};
use crate::neuron_store::NeuronStoreConfig;
use crate::reward::RewardPipelineConfig;
use crate::spike_bus::SpikeBusConfig;
use crate::synapse_store::SynapseStoreConfig;

/// Number of worker threads the `rayon` pool should use, defaulting to the
/// host's available parallelism capped at 8 per spec §5.
fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(1)
}

/// Aggregate configuration for a [`crate::engine::Brain`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Synapse store bounds and fan-out cap.
    pub synapse_store: SynapseStoreConfig,
    /// Neuron dynamics parameters.
    pub neuron_store: NeuronStoreConfig,
    /// Spike bus capacity and backpressure timeout.
    pub spike_bus: SpikeBusConfig,
    /// Hebbian learning rate.
    pub hebbian: HebbianParams,
    /// STDP amplitudes, time constants and window.
    pub stdp: StdpParams,
    /// Three-factor reward-modulated plasticity parameters.
    pub three_factor: ThreeFactorParams,
    /// Consolidation sweep cadence and classification threshold.
    pub consolidation: ConsolidationParams,
    /// Reward component weights and delivery cadence.
    pub reward: RewardPipelineConfig,
    /// Telemetry stream cadences and channel capacities.
    pub telemetry: TelemetryConfig,
    /// Simulated milliseconds advanced per tick.
    pub tick_dt_ms: f32,
    /// Worker threads available to the `rayon` pool used by parallel sweeps.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            synapse_store: SynapseStoreConfig::default(),
            neuron_store: NeuronStoreConfig::default(),
            spike_bus: SpikeBusConfig::default(),
            hebbian: HebbianParams::default(),
            stdp: StdpParams::default(),
            three_factor: ThreeFactorParams::default(),
            consolidation: ConsolidationParams::default(),
            reward: RewardPipelineConfig::default(),
            telemetry: TelemetryConfig::default(),
            tick_dt_ms: 1.0,
            worker_threads: default_worker_threads(),
        }
    }
}

impl EngineConfig {
    /// Validate every sub-configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.synapse_store.validate()?;
        self.neuron_store.validate()?;
        self.stdp.validate()?;
        if self.tick_dt_ms <= 0.0 {
            return Err(crate::error::RuntimeError::invalid_parameter(
                "tick_dt_ms",
                self.tick_dt_ms.to_string(),
                "> 0.0",
            ));
        }
        if self.worker_threads == 0 {
            return Err(crate::error::RuntimeError::invalid_parameter(
                "worker_threads",
                "0",
                "> 0",
            ));
        }
        Ok(())
    }
}
