//! The brain: wires the neuron store, synapse store, spike bus, learning
//! engine and reward pipeline together behind a single per-tick entry point.
//!
//! Generalizes the teacher's `SNNNetwork`/`NetworkBuilder` pair (HashMap
//! storage, a `step()` method driving delayed-spike delivery then
//! plasticity) onto the dense-arena stores, the explicit spike bus, and the
//! full learning/reward pipeline this engine adds.

use std::path::Path;

use substrate_core::connectivity::{ConnectivityConfig, ConnectivityManager};
use substrate_core::region::{Region, RegionSet};
use substrate_core::reward::RewardKind;
use substrate_core::{NeuronId, RegionId, Time};

use substrate_storage::telemetry::{
    LearningStatsRow, RewardLogRow, SpikeLogRow, SubstrateStateRow, TelemetryReceiver, TelemetrySink,
};

use crate::config::EngineConfig;
use crate::error::{Result, RuntimeError};
use crate::kernel::{CpuKernel, KernelBackend};
use crate::learning::LearningEngine;
use crate::neuron_store::NeuronStore;
use crate::reward::{ActionDecision, ActionFilter, RewardPipeline};
use crate::spike_bus::{spike_bus, SpikeBusReceiver, SpikeBusSender};
use crate::synapse_store::SynapseStore;

/// Incrementally assembles the region layout and neuron population before
/// the dense stores are allocated, mirroring the teacher's `NetworkBuilder`.
pub struct BrainBuilder {
    config: EngineConfig,
    regions: RegionSet,
    thresholds: Vec<f32>,
}

impl BrainBuilder {
    /// Start building a brain with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            regions: RegionSet::new(),
            thresholds: Vec::new(),
        }
    }

    /// Add a region of `count` neurons, each with the given firing
    /// threshold, returning its assigned ID.
    pub fn add_region(&mut self, name: impl Into<String>, count: u32, threshold: f32) -> Result<RegionId> {
        let first = NeuronId::new(self.thresholds.len() as u32);
        self.thresholds.extend(std::iter::repeat_n(threshold, count as usize));
        let id = RegionId::new(self.regions.len() as u32);
        let region = Region::new(id, name, first, count);
        self.regions.add(region).map_err(RuntimeError::from)
    }

    /// Finalize the region/neuron layout into a running [`Brain`], along
    /// with the receiving end of its telemetry sink.
    pub fn build(self, run_id: u64) -> Result<(Brain, TelemetryReceiver)> {
        self.config.validate()?;
        let num_neurons = self.thresholds.len() as u32;
        let neurons = NeuronStore::new(self.thresholds, self.config.neuron_store)?;
        let synapses = SynapseStore::new(num_neurons, self.config.synapse_store)?;
        let (spike_tx, spike_rx) = spike_bus(self.config.spike_bus);
        let learning = LearningEngine::new(
            num_neurons,
            self.config.hebbian,
            self.config.stdp,
            self.config.three_factor,
            self.config.consolidation,
        )?;
        let reward = RewardPipeline::new(self.config.reward);
        let (telemetry, telemetry_rx) = TelemetrySink::new(self.config.telemetry);

        let fan_out_cap = self.config.synapse_store.fan_out_cap;
        #[cfg(feature = "parallel")]
        let worker_pool = build_worker_pool(self.config.worker_threads)?;
        let brain = Brain {
            config: self.config,
            regions: self.regions,
            connectivity: ConnectivityManager::new(fan_out_cap),
            neurons,
            synapses,
            spike_tx,
            spike_rx,
            learning,
            reward,
            telemetry,
            kernel: Box::new(CpuKernel),
            run_id,
            step: 0,
            now: Time::ZERO,
            last_assembly_count: 0,
            last_binding_count: 0,
            #[cfg(feature = "parallel")]
            worker_pool,
        };
        log::info!(
            "brain built: run_id={run_id}, {} regions, {num_neurons} neurons",
            brain.regions.len()
        );
        Ok((brain, telemetry_rx))
    }
}

/// A running instance of the learning and plasticity core.
pub struct Brain {
    config: EngineConfig,
    regions: RegionSet,
    connectivity: ConnectivityManager,
    neurons: NeuronStore,
    synapses: SynapseStore,
    spike_tx: SpikeBusSender,
    spike_rx: SpikeBusReceiver,
    learning: LearningEngine,
    reward: RewardPipeline,
    telemetry: TelemetrySink,
    kernel: Box<dyn KernelBackend>,
    run_id: u64,
    step: u64,
    now: Time,
    last_assembly_count: u64,
    last_binding_count: u64,
    #[cfg(feature = "parallel")]
    worker_pool: rayon::ThreadPool,
}

#[cfg(feature = "parallel")]
fn build_worker_pool(worker_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads)
        .build()
        .map_err(|e| RuntimeError::invalid_parameter("worker_threads", worker_threads.to_string(), e.to_string()))
}

impl Brain {
    /// Current tick counter.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Current simulated time.
    pub fn now(&self) -> Time {
        self.now
    }

    /// Running learning statistics.
    pub fn learning_stats(&self) -> &crate::learning::LearningStats {
        self.learning.stats()
    }

    /// Replace the compute kernel used for the per-tick neuron sweep.
    pub fn set_kernel(&mut self, kernel: Box<dyn KernelBackend>) {
        self.kernel = kernel;
    }

    /// Install an action filter on the reward pipeline.
    pub fn set_action_filter(&mut self, filter: Box<dyn ActionFilter>) {
        self.reward.set_action_filter(filter);
    }

    /// Wire a capped, density-sampled projection from `source` to `target`,
    /// honoring the connectivity manager's cumulative fan-out cap. Returns
    /// the number of synapses created.
    pub fn connect_regions(
        &mut self,
        source: RegionId,
        target: RegionId,
        config: ConnectivityConfig,
        seed: u64,
        initial_weight: f32,
        plastic: bool,
    ) -> Result<usize> {
        let source_region = self
            .regions
            .get(source)
            .cloned()
            .ok_or_else(|| RuntimeError::invalid_parameter("source", source.to_string(), "must name an existing region"))?;
        let target_region = self
            .regions
            .get(target)
            .cloned()
            .ok_or_else(|| RuntimeError::invalid_parameter("target", target.to_string(), "must name an existing region"))?;

        let pairs = self.connectivity.plan_projection(&source_region, &target_region, config, seed)?;
        for &(pre, post) in &pairs {
            self.synapses.add_edge(pre, post, initial_weight, plastic)?;
        }
        log::debug!(
            "wired {} synapses from region `{}` to region `{}`",
            pairs.len(),
            source_region.name(),
            target_region.name()
        );
        Ok(pairs.len())
    }

    /// Add a single directed edge directly, bypassing connectivity planning.
    pub fn add_synapse(&mut self, pre: NeuronId, post: NeuronId, initial_weight: f32, plastic: bool) -> Result<substrate_core::SynapseId> {
        self.synapses.add_edge(pre, post, initial_weight, plastic)
    }

    /// Inject external input into every neuron of a named region. `values`
    /// must have exactly as many entries as the region has neurons.
    pub fn set_region_input(&mut self, region_name: &str, values: &[f32]) -> Result<()> {
        let region = self
            .regions
            .get_by_name(region_name)
            .ok_or_else(|| RuntimeError::invalid_parameter("region_name", region_name, "must name an existing region"))?;
        region.validate_input_len(values)?;
        for (neuron, &value) in region.neuron_ids().zip(values.iter()) {
            self.neurons.add_pending_input(neuron, value)?;
        }
        Ok(())
    }

    /// Set a named region's attention gain, clamped to its configured
    /// ceiling.
    pub fn set_attention_gain(&mut self, region: RegionId, gain: f32) -> Result<()> {
        let region = self
            .regions
            .get_mut(region)
            .ok_or_else(|| RuntimeError::invalid_parameter("region", region.to_string(), "must name an existing region"))?;
        region.config.set_attention_gain(gain);
        Ok(())
    }

    /// Queue a reward component contribution for the next delivery tick.
    pub fn contribute_reward(&self, kind: RewardKind, value: f32) {
        self.reward.contribute(kind, value);
    }

    /// Evaluate a proposed action against the installed action filter.
    pub fn check_action(&mut self, action: &str) -> ActionDecision {
        self.reward.check_action(action)
    }

    /// Advance the brain by one tick: deliver any pending shaped reward,
    /// run the neuron sweep, publish spikes to the bus, apply learning, run
    /// consolidation if due, and emit telemetry on their independent
    /// cadences.
    pub fn tick(&mut self) -> Result<()> {
        self.step += 1;
        let dt_ns = (self.config.tick_dt_ms as f64 * 1_000_000.0) as u64;
        self.now = self.now + Time::from_nanos(dt_ns);
        log::trace!("tick step={} now={}ms", self.step, self.now.millis());

        let shaped_reward = self.reward.maybe_deliver(self.now, self.step);
        let pending_reward = shaped_reward.as_ref().map(|r| r.value);

        if let Some(shaped) = &shaped_reward {
            if self.telemetry.reward_cadence_ready(self.now) {
                let components = shaped
                    .components
                    .iter()
                    .map(|c| (component_name(c.kind), c.weight, c.value))
                    .collect();
                self.telemetry.send_reward_log(RewardLogRow {
                    run_id: self.run_id,
                    step: self.step,
                    timestamp: self.now,
                    shaped_value: shaped.value,
                    components,
                    source_tag: "engine".into(),
                });
            }
        }

        let spikes = self.kernel.process_neurons(self.config.tick_dt_ms, self.now, &mut self.neurons, &self.synapses);

        for &spike in &spikes {
            self.spike_tx.publish(spike, self.config.spike_bus.backpressure_timeout)?;
            self.telemetry.record_spike(SpikeLogRow {
                run_id: self.run_id,
                neuron_id: spike.neuron_id.raw(),
                timestamp: spike.timestamp,
            });
        }
        let drained = self.spike_rx.drain();

        let now = self.now;
        let dt_ms = self.config.tick_dt_ms;
        let neurons = &self.neurons;
        let regions = &self.regions;
        let learning = &mut self.learning;
        let synapses = &mut self.synapses;
        #[allow(unused_mut)]
        let mut learning_tick = || learning.tick(now, dt_ms, pending_reward, &drained, |n| neurons.activation(n), regions, synapses);

        #[cfg(feature = "parallel")]
        self.worker_pool.install(learning_tick)?;
        #[cfg(not(feature = "parallel"))]
        learning_tick()?;

        if self.learning.consolidation_due(self.now) {
            self.learning.consolidate(self.now, &mut self.synapses);
        }

        if self.telemetry.memdb_cadence_ready(self.now) {
            let stats = self.learning.stats();
            self.telemetry.send_learning_stats(LearningStatsRow {
                run_id: self.run_id,
                step: self.step,
                timestamp: self.now,
                hebbian_updates: stats.hebbian_updates,
                stdp_updates: stats.stdp_updates,
                reward_updates: stats.reward_updates,
                avg_weight_delta: stats.avg_weight_delta(),
                potentiated_count: stats.potentiated_synapses,
                depressed_count: stats.depressed_synapses,
                active_count: stats.active_synapses,
                metabolic_energy: stats.metabolic_energy,
                guardrail_rejections: self.synapses.guardrail_rejections(),
            });
            let state_row = self.substrate_state_snapshot();
            self.telemetry.send_substrate_state(state_row);
        }

        Ok(())
    }

    /// Aggregate population metrics for the `substrate_states` telemetry
    /// stream: coherence (mean per-neuron activation normalized by
    /// threshold), the count of regions whose mean normalized activation
    /// crosses the co-activity threshold ("assemblies"), and the count of
    /// well-potentiated cross-region synapses ("bindings").
    fn substrate_state_snapshot(&mut self) -> SubstrateStateRow {
        const ASSEMBLY_THRESHOLD: f32 = 0.5;
        const BINDING_WEIGHT_FRACTION: f32 = 0.5;

        let mut coherence_sum = 0.0f32;
        let mut coherence_n = 0u32;
        let mut assembly_count = 0u64;

        for region in self.regions.iter() {
            let mut region_sum = 0.0f32;
            let mut region_n = 0u32;
            for neuron in region.neuron_ids() {
                let threshold = self.neurons.threshold(neuron).max(f32::EPSILON);
                let ratio = (self.neurons.activation(neuron) / threshold).clamp(0.0, 1.0);
                region_sum += ratio;
                region_n += 1;
            }
            coherence_sum += region_sum;
            coherence_n += region_n;
            if region_n > 0 && region_sum / region_n as f32 >= ASSEMBLY_THRESHOLD {
                assembly_count += 1;
            }
        }
        let coherence = if coherence_n > 0 { coherence_sum / coherence_n as f32 } else { 0.0 };

        let binding_weight_floor = BINDING_WEIGHT_FRACTION * self.config.synapse_store.w_max;
        let binding_count = self
            .synapses
            .ids()
            .filter(|&id| {
                let pre_region = self.regions.region_of(self.synapses.pre_of(id)).map(Region::id);
                let post_region = self.regions.region_of(self.synapses.post_of(id)).map(Region::id);
                pre_region != post_region && self.synapses.weight(id) >= binding_weight_floor
            })
            .count() as u64;

        let growth_velocity = (assembly_count as i64 - self.last_assembly_count as i64)
            + (binding_count as i64 - self.last_binding_count as i64);
        self.last_assembly_count = assembly_count;
        self.last_binding_count = binding_count;

        SubstrateStateRow {
            run_id: self.run_id,
            step: self.step,
            timestamp: self.now,
            coherence,
            assembly_count,
            binding_count,
            growth_velocity,
        }
    }

    /// Save a full checkpoint to `path`.
    #[cfg(feature = "serde")]
    pub fn save_checkpoint(&self, path: impl AsRef<Path>) -> Result<()> {
        let checkpoint = checkpoint::to_checkpoint(self);
        substrate_storage::checkpoint::save(&checkpoint, path).map_err(RuntimeError::from)
    }

    /// Restore a brain from a checkpoint previously written by
    /// [`Self::save_checkpoint`]. The region/neuron/synapse layout is
    /// rebuilt from the checkpoint itself; `config` supplies the tunables
    /// that are not part of persisted state (rates are restored from the
    /// checkpoint's `engine_params` blob).
    #[cfg(feature = "serde")]
    pub fn load_checkpoint(path: impl AsRef<Path>, config: EngineConfig) -> Result<(Brain, TelemetryReceiver)> {
        let loaded = substrate_storage::checkpoint::load(path).map_err(RuntimeError::from)?;
        checkpoint::from_checkpoint(loaded, config)
    }
}

fn component_name(kind: RewardKind) -> &'static str {
    match kind {
        RewardKind::Teacher => "teacher",
        RewardKind::Novelty => "novelty",
        RewardKind::Survival => "survival",
        RewardKind::Task => "task",
    }
}

#[cfg(feature = "serde")]
mod checkpoint {
    use serde::{Deserialize, Serialize};

    use substrate_core::{NeuronId as CoreNeuronId, RegionId as CoreRegionId, Time};
    use substrate_storage::checkpoint::{Checkpoint, NeuronRecord, NeuronStateCode, RegionRecord, SynapseRecord};

    use crate::neuron_store::NeuronStore;
    use crate::reward::RewardPipeline;
    use crate::spike_bus::spike_bus;
    use crate::synapse_store::{ConsolidationState, SynapseStore};
    use substrate_core::region::{Region, RegionSet};
    use substrate_storage::telemetry::TelemetrySink;

    use super::*;

    /// Opaque encoding of the tunables that are persisted across a
    /// checkpoint save/resume, distinct from [`EngineConfig`] so that
    /// storage-crate-independent config structs never need a serde derive.
    #[derive(Serialize, Deserialize)]
    struct EngineParamsBlob {
        hebbian_eta_h: f32,
        stdp_a_plus: f32,
        stdp_a_minus: f32,
        stdp_tau_plus_ms: f32,
        stdp_tau_minus_ms: f32,
        stdp_window_ms: f32,
        stdp_dw_max: f32,
        three_factor_kappa: f32,
        three_factor_lambda: f32,
        three_factor_eta_e: f32,
        consolidation_interval_ms: u64,
        consolidation_trend_epsilon: f32,
    }

    impl EngineParamsBlob {
        fn from_config(config: &EngineConfig) -> Self {
            Self {
                hebbian_eta_h: config.hebbian.eta_h,
                stdp_a_plus: config.stdp.a_plus,
                stdp_a_minus: config.stdp.a_minus,
                stdp_tau_plus_ms: config.stdp.tau_plus_ms,
                stdp_tau_minus_ms: config.stdp.tau_minus_ms,
                stdp_window_ms: config.stdp.window_ms,
                stdp_dw_max: config.stdp.dw_max,
                three_factor_kappa: config.three_factor.kappa,
                three_factor_lambda: config.three_factor.lambda,
                three_factor_eta_e: config.three_factor.eta_e,
                consolidation_interval_ms: config.consolidation.interval_ms,
                consolidation_trend_epsilon: config.consolidation.trend_epsilon,
            }
        }

        fn apply_to(&self, config: &mut EngineConfig) {
            config.hebbian.eta_h = self.hebbian_eta_h;
            config.stdp.a_plus = self.stdp_a_plus;
            config.stdp.a_minus = self.stdp_a_minus;
            config.stdp.tau_plus_ms = self.stdp_tau_plus_ms;
            config.stdp.tau_minus_ms = self.stdp_tau_minus_ms;
            config.stdp.window_ms = self.stdp_window_ms;
            config.stdp.dw_max = self.stdp_dw_max;
            config.three_factor.kappa = self.three_factor_kappa;
            config.three_factor.lambda = self.three_factor_lambda;
            config.three_factor.eta_e = self.three_factor_eta_e;
            config.consolidation.interval_ms = self.consolidation_interval_ms;
            config.consolidation.trend_epsilon = self.consolidation_trend_epsilon;
        }
    }

    fn consolidation_code(state: ConsolidationState) -> u8 {
        match state {
            ConsolidationState::Active => 0,
            ConsolidationState::Potentiated => 1,
            ConsolidationState::Depressed => 2,
        }
    }

    fn consolidation_from_code(code: u8) -> ConsolidationState {
        match code {
            1 => ConsolidationState::Potentiated,
            2 => ConsolidationState::Depressed,
            _ => ConsolidationState::Active,
        }
    }

    pub(super) fn to_checkpoint(brain: &Brain) -> Checkpoint {
        let regions = brain
            .regions
            .iter()
            .map(|r| RegionRecord {
                id: r.id().raw(),
                name: r.name().to_string(),
                first_neuron: r.first_neuron().raw(),
                neuron_count: r.neuron_count(),
                hebbian_enabled: r.config.hebbian_enabled,
                attention_gain: r.config.attention_gain,
                gain_max: r.config.gain_max,
            })
            .collect();

        let neurons = (0..brain.neurons.len())
            .map(|i| {
                let id = CoreNeuronId::new(i as u32);
                NeuronRecord {
                    id: i as u32,
                    activation: brain.neurons.activation(id),
                    threshold: brain.neurons.threshold(id),
                    refractory_until_nanos: brain.neurons.refractory_until(id).nanos(),
                    fire_count: brain.neurons.fire_count(id),
                    last_spike_time_nanos: brain.neurons.last_spike_time(id).nanos(),
                    state: if brain.neurons.is_refractory(id) {
                        NeuronStateCode::Refractory
                    } else {
                        NeuronStateCode::Inactive
                    },
                }
            })
            .collect();

        let synapses = brain
            .synapses
            .ids()
            .map(|id| SynapseRecord {
                id: id.raw(),
                pre: brain.synapses.pre_of(id).raw(),
                post: brain.synapses.post_of(id).raw(),
                weight: brain.synapses.weight(id),
                plastic: brain.synapses.is_plastic(id),
                last_update_time_nanos: brain.synapses.last_update(id).nanos(),
                eligibility_trace: brain.synapses.eligibility(id),
                consolidation_state: consolidation_code(brain.synapses.consolidation_state(id)),
            })
            .collect();

        let engine_params = bincode::serialize(&EngineParamsBlob::from_config(&brain.config)).unwrap_or_default();

        Checkpoint {
            run_id: brain.run_id,
            step: brain.step,
            timestamp_nanos: brain.now.nanos(),
            regions,
            neurons,
            synapses,
            engine_params,
            rng_state: Vec::new(),
        }
    }

    pub(super) fn from_checkpoint(checkpoint: Checkpoint, mut config: EngineConfig) -> Result<(Brain, TelemetryReceiver)> {
        if let Ok(blob) = bincode::deserialize::<EngineParamsBlob>(&checkpoint.engine_params) {
            blob.apply_to(&mut config);
        }
        config.validate()?;

        let mut regions = RegionSet::new();
        for record in &checkpoint.regions {
            let mut region = Region::new(
                CoreRegionId::new(record.id),
                record.name.clone(),
                CoreNeuronId::new(record.first_neuron),
                record.neuron_count,
            );
            region.config.hebbian_enabled = record.hebbian_enabled;
            region.config.gain_max = record.gain_max;
            region.config.set_attention_gain(record.attention_gain);
            regions.add(region).map_err(RuntimeError::from)?;
        }

        let thresholds: Vec<f32> = checkpoint.neurons.iter().map(|n| n.threshold).collect();
        let mut neurons = NeuronStore::new(thresholds, config.neuron_store)?;
        for record in &checkpoint.neurons {
            let id = CoreNeuronId::new(record.id);
            neurons.restore(
                id,
                record.activation,
                matches!(record.state, NeuronStateCode::Refractory),
                Time::from_nanos(record.refractory_until_nanos),
                record.fire_count,
                Time::from_nanos(record.last_spike_time_nanos),
            )?;
        }

        let mut synapses = SynapseStore::new(neurons.len() as u32, config.synapse_store)?;
        for record in &checkpoint.synapses {
            let id = synapses.add_edge(
                CoreNeuronId::new(record.pre),
                CoreNeuronId::new(record.post),
                record.weight,
                record.plastic,
            )?;
            synapses.restore(
                id,
                record.weight,
                Time::from_nanos(record.last_update_time_nanos),
                record.eligibility_trace,
                consolidation_from_code(record.consolidation_state),
            )?;
        }

        let (spike_tx, spike_rx) = spike_bus(config.spike_bus);
        let learning = LearningEngine::new(neurons.len() as u32, config.hebbian, config.stdp, config.three_factor, config.consolidation)?;
        let reward = RewardPipeline::new(config.reward);
        let (telemetry, telemetry_rx) = TelemetrySink::new(config.telemetry);

        let fan_out_cap = config.synapse_store.fan_out_cap;
        #[cfg(feature = "parallel")]
        let worker_pool = build_worker_pool(config.worker_threads)?;
        let brain = Brain {
            config,
            regions,
            connectivity: ConnectivityManager::new(fan_out_cap),
            neurons,
            synapses,
            spike_tx,
            spike_rx,
            learning,
            reward,
            telemetry,
            kernel: Box::new(CpuKernel),
            run_id: checkpoint.run_id,
            step: checkpoint.step,
            now: checkpoint.timestamp(),
            last_assembly_count: 0,
            last_binding_count: 0,
            #[cfg(feature = "parallel")]
            worker_pool,
        };
        Ok((brain, telemetry_rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_brain() -> Brain {
        let mut builder = BrainBuilder::new(EngineConfig::default());
        let region = builder.add_region("sensory", 2, 0.5).unwrap();
        let (mut brain, _rx) = builder.build(1).unwrap();
        brain
            .connect_regions(
                region,
                region,
                ConnectivityConfig {
                    allow_self_loops: false,
                    density: 1.0,
                    fan_out_cap: 8,
                },
                42,
                0.5,
                true,
            )
            .unwrap();
        brain
    }

    #[test]
    fn tick_advances_time_and_step() {
        let mut brain = simple_brain();
        brain.tick().unwrap();
        assert_eq!(brain.step(), 1);
        assert!(brain.now().nanos() > 0);
    }

    #[test]
    fn region_input_drives_a_spike() {
        let mut brain = simple_brain();
        brain.set_region_input("sensory", &[1.0, 0.0]).unwrap();
        brain.tick().unwrap();
        // Neuron 0 fires and propagates into neuron 1's pending input; by
        // the second tick both neurons have nonzero activation, so the
        // Hebbian sweep should record at least one weight update.
        brain.tick().unwrap();
        assert!(brain.learning_stats().hebbian_updates > 0);
    }

    #[test]
    fn unknown_region_input_is_an_error() {
        let mut brain = simple_brain();
        let err = brain.set_region_input("nope", &[1.0, 0.0]);
        assert!(err.is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn checkpoint_round_trip_preserves_topology() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.bin");

        let mut brain = simple_brain();
        brain.set_region_input("sensory", &[1.0, 0.0]).unwrap();
        for _ in 0..3 {
            brain.tick().unwrap();
        }
        brain.save_checkpoint(&path).unwrap();

        let (restored, _rx) = Brain::load_checkpoint(&path, EngineConfig::default()).unwrap();
        assert_eq!(restored.step(), brain.step());
        assert_eq!(restored.synapses.len(), brain.synapses.len());
        assert_eq!(restored.neurons.len(), brain.neurons.len());
    }
}
