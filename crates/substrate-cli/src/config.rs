//! Configuration management for the substrate CLI
//!
//! `SubstrateConfig` is the serializable, human-editable form of every
//! tunable the engine exposes. It is loaded from a TOML file (if present),
//! then overridden field-by-field by environment variables and finally by
//! explicit CLI flags, matching the CLI > env > file > built-in default
//! precedence.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use substrate_runtime::{
    ConsolidationParams, EngineConfig, HebbianParams, NeuronStoreConfig, RewardPipelineConfig,
    RewardWeights, SpikeBusConfig, StdpParams, SynapseStoreConfig, ThreeFactorParams,
};
use substrate_storage::TelemetryConfig;

use crate::error::{CliError, CliResult};

/// Hebbian and STDP learning rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Master enable switch; when `false` the Hebbian rate is forced to 0
    /// regardless of `hebbian_rate`.
    pub enabled: bool,
    /// Hebbian learning rate (η_H).
    pub hebbian_rate: f32,
    /// STDP potentiation amplitude (A+).
    pub stdp_a_plus: f32,
    /// STDP depression amplitude (A-).
    pub stdp_a_minus: f32,
    /// STDP potentiation time constant, ms (τ+).
    pub stdp_tau_plus_ms: f32,
    /// STDP depression time constant, ms (τ-).
    pub stdp_tau_minus_ms: f32,
    /// STDP pairing window, ms.
    pub stdp_window_ms: f32,
    /// Maximum magnitude of a single STDP weight update.
    pub stdp_dw_max: f32,
    /// Three-factor reward gain (κ).
    pub kappa: f32,
    /// Eligibility trace decay per tick (λ).
    pub lambda: f32,
    /// Eligibility trace accumulation rate (η_e).
    pub eta_e: f32,
    /// Consolidation sweep interval, ms.
    pub consolidation_interval_ms: u64,
    /// Minimum weight trend to classify a synapse as potentiated/depressed.
    pub consolidation_trend_epsilon: f32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        let hebbian = HebbianParams::default();
        let stdp = StdpParams::default();
        let three_factor = ThreeFactorParams::default();
        let consolidation = ConsolidationParams::default();
        Self {
            enabled: true,
            hebbian_rate: hebbian.eta_h,
            stdp_a_plus: stdp.a_plus,
            stdp_a_minus: stdp.a_minus,
            stdp_tau_plus_ms: stdp.tau_plus_ms,
            stdp_tau_minus_ms: stdp.tau_minus_ms,
            stdp_window_ms: stdp.window_ms,
            stdp_dw_max: stdp.dw_max,
            kappa: three_factor.kappa,
            lambda: three_factor.lambda,
            eta_e: three_factor.eta_e,
            consolidation_interval_ms: consolidation.interval_ms,
            consolidation_trend_epsilon: consolidation.trend_epsilon,
        }
    }
}

/// Reward component weights and shaping bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Weight on the teacher-embedding similarity component.
    pub teacher_weight: f32,
    /// Weight on the novelty component.
    pub novelty_weight: f32,
    /// Weight on the survival component.
    pub survival_weight: f32,
    /// Weight on the externally supplied task component.
    pub task_weight: f32,
    /// Shaped reward clamp magnitude. Informational only: `R_MAX` is a
    /// fixed constant in `substrate-core`, not a runtime-tunable bound; a
    /// value here that disagrees with the compiled-in constant is rejected
    /// at load time rather than silently ignored.
    pub r_max: f32,
    /// Minimum interval, ms, between delivered shaped rewards.
    pub delivery_interval_ms: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        let weights = RewardWeights::default();
        Self {
            teacher_weight: weights.teacher,
            novelty_weight: weights.novelty,
            survival_weight: weights.survival,
            task_weight: weights.task,
            r_max: substrate_core::reward::R_MAX,
            delivery_interval_ms: RewardPipelineConfig::default().delivery_interval_ms,
        }
    }
}

/// Telemetry and spike-bus cadences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Interval, ms, between `learning_stats`/`substrate_states` rows.
    pub memdb_interval_ms: u64,
    /// Interval, ms, between `reward_log` rows.
    pub reward_interval_ms: u64,
    /// Bounded telemetry channel capacity per stream.
    pub telemetry_channel_capacity: usize,
    /// Whether the optional spike ring buffer is enabled.
    pub spike_log_enabled: bool,
    /// Capacity of the spike ring buffer, when enabled.
    pub spike_log_capacity: usize,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        let telemetry = TelemetryConfig::default();
        Self {
            memdb_interval_ms: telemetry.memdb_interval_ms,
            reward_interval_ms: telemetry.reward_interval_ms,
            telemetry_channel_capacity: telemetry.channel_capacity,
            spike_log_enabled: telemetry.spike_log_enabled,
            spike_log_capacity: telemetry.spike_log_capacity,
        }
    }
}

/// Neuron dynamics, synapse bounds and spike-bus sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Simulated milliseconds advanced per tick.
    pub tick_dt_ms: f32,
    /// Leaky decay time constant, ms.
    pub tau_decay_ms: f32,
    /// Refractory period, ms.
    pub refractory_period_ms: f32,
    /// Lower bound for any synapse weight.
    pub w_min: f32,
    /// Upper bound for any synapse weight.
    pub w_max: f32,
    /// Maximum outgoing edges permitted from a single neuron.
    pub fan_out_cap: u32,
    /// Spike bus channel capacity before a publish blocks.
    pub spike_bus_capacity: usize,
    /// How long, ms, a spike publish may block before a fatal drop.
    pub spike_bus_backpressure_timeout_ms: u64,
    /// Worker threads available to the parallel Hebbian/STDP sweeps.
    pub worker_threads: usize,
}

impl Default for EngineTuning {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            tick_dt_ms: engine.tick_dt_ms,
            tau_decay_ms: engine.neuron_store.tau_decay_ms,
            refractory_period_ms: engine.neuron_store.refractory_period_ms,
            w_min: engine.synapse_store.w_min,
            w_max: engine.synapse_store.w_max,
            fan_out_cap: engine.synapse_store.fan_out_cap,
            spike_bus_capacity: engine.spike_bus.capacity,
            spike_bus_backpressure_timeout_ms: engine.spike_bus.backpressure_timeout.as_millis() as u64,
            worker_threads: engine.worker_threads,
        }
    }
}

/// Full substrate engine configuration, as loaded from a TOML file and
/// overridden by environment and CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SubstrateConfig {
    /// Learning rule rates and cadence.
    pub learning: LearningConfig,
    /// Reward weighting and cadence.
    pub reward: RewardConfig,
    /// Telemetry and spike-log cadences.
    pub cadence: CadenceConfig,
    /// Neuron/synapse/spike-bus sizing.
    pub engine: EngineTuning,
}

impl SubstrateConfig {
    /// Load configuration from a TOML file, or fall back to defaults if the
    /// file does not exist.
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(CliError::from)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The default configuration file path under the user's config directory.
    pub fn default_config_path() -> CliResult<std::path::PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("could not determine config directory"))?;
        Ok(config_dir.join("substrate").join("config.toml"))
    }

    /// Convert to the runtime's aggregate [`EngineConfig`], validating that
    /// `reward.r_max` agrees with the compiled-in constant.
    pub fn to_engine_config(&self) -> CliResult<EngineConfig> {
        if (self.reward.r_max - substrate_core::reward::R_MAX).abs() > f32::EPSILON {
            return Err(CliError::config(format!(
                "r_max {} does not match the compiled-in shaping bound {}; R_MAX is not runtime-tunable",
                self.reward.r_max,
                substrate_core::reward::R_MAX
            )));
        }

        let hebbian_rate = if self.learning.enabled { self.learning.hebbian_rate } else { 0.0 };

        Ok(EngineConfig {
            synapse_store: SynapseStoreConfig {
                w_min: self.engine.w_min,
                w_max: self.engine.w_max,
                fan_out_cap: self.engine.fan_out_cap,
            },
            neuron_store: NeuronStoreConfig {
                tau_decay_ms: self.engine.tau_decay_ms,
                refractory_period_ms: self.engine.refractory_period_ms,
            },
            spike_bus: SpikeBusConfig {
                capacity: self.engine.spike_bus_capacity,
                backpressure_timeout: Duration::from_millis(self.engine.spike_bus_backpressure_timeout_ms),
            },
            hebbian: HebbianParams { eta_h: hebbian_rate },
            stdp: StdpParams {
                a_plus: self.learning.stdp_a_plus,
                a_minus: self.learning.stdp_a_minus,
                tau_plus_ms: self.learning.stdp_tau_plus_ms,
                tau_minus_ms: self.learning.stdp_tau_minus_ms,
                window_ms: self.learning.stdp_window_ms,
                dw_max: self.learning.stdp_dw_max,
            },
            three_factor: ThreeFactorParams {
                kappa: self.learning.kappa,
                lambda: self.learning.lambda,
                eta_e: self.learning.eta_e,
            },
            consolidation: ConsolidationParams {
                interval_ms: self.learning.consolidation_interval_ms,
                trend_epsilon: self.learning.consolidation_trend_epsilon,
            },
            reward: RewardPipelineConfig {
                weights: RewardWeights {
                    teacher: self.reward.teacher_weight,
                    novelty: self.reward.novelty_weight,
                    survival: self.reward.survival_weight,
                    task: self.reward.task_weight,
                },
                delivery_interval_ms: self.reward.delivery_interval_ms,
            },
            telemetry: TelemetryConfig {
                memdb_interval_ms: self.cadence.memdb_interval_ms,
                reward_interval_ms: self.cadence.reward_interval_ms,
                channel_capacity: self.cadence.telemetry_channel_capacity,
                spike_log_enabled: self.cadence.spike_log_enabled,
                spike_log_capacity: self.cadence.spike_log_capacity,
            },
            tick_dt_ms: self.engine.tick_dt_ms,
            worker_threads: self.engine.worker_threads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = SubstrateConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: SubstrateConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn default_config_converts_to_a_valid_engine_config() {
        let engine = SubstrateConfig::default().to_engine_config().unwrap();
        engine.validate().unwrap();
    }

    #[test]
    fn mismatched_r_max_is_rejected() {
        let mut config = SubstrateConfig::default();
        config.reward.r_max += 1.0;
        assert!(config.to_engine_config().is_err());
    }

    #[test]
    fn disabling_learning_zeroes_the_hebbian_rate() {
        let mut config = SubstrateConfig::default();
        config.learning.enabled = false;
        let engine = config.to_engine_config().unwrap();
        assert_eq!(engine.hebbian.eta_h, 0.0);
    }
}
