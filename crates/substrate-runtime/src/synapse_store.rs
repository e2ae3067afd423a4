//! Dense arena of directed, weighted, plastic edges.
//!
//! Generalizes the `HashMap<SynapseId, Synapse>` prototype style into flat
//! `Vec`-backed columns indexed by the synapse's dense id, with per-neuron
//! adjacency lists so learning kernels can iterate a neuron's incoming or
//! outgoing edges in amortized O(1) per edge.

use substrate_core::{NeuronId, SynapseId, Time};

use crate::error::{Result, RuntimeError};
use crate::guardrail::{guard_weight, GuardrailCounters};

/// A synapse's consolidation classification, updated only by the
/// consolidation sweep (never by the per-tick learning rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationState {
    /// Weight has not moved meaningfully since the last sweep.
    Active,
    /// Weight has been trending upward.
    Potentiated,
    /// Weight has been trending downward.
    Depressed,
}

/// Bounds and capacity configuration for a [`SynapseStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapseStoreConfig {
    /// Lower bound for any weight.
    pub w_min: f32,
    /// Upper bound for any weight.
    pub w_max: f32,
    /// Maximum outgoing edges permitted from a single neuron.
    pub fan_out_cap: u32,
}

impl Default for SynapseStoreConfig {
    fn default() -> Self {
        Self {
            w_min: 0.0,
            w_max: 1.0,
            fan_out_cap: 128,
        }
    }
}

impl SynapseStoreConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.w_min.partial_cmp(&self.w_max), Some(std::cmp::Ordering::Less)) {
            return Err(RuntimeError::invalid_parameter(
                "w_min/w_max",
                format!("{}/{}", self.w_min, self.w_max),
                "w_min < w_max",
            ));
        }
        if self.fan_out_cap == 0 {
            return Err(RuntimeError::invalid_parameter(
                "fan_out_cap",
                "0",
                "> 0",
            ));
        }
        Ok(())
    }
}

/// Dense storage of directed plastic edges.
#[derive(Debug)]
pub struct SynapseStore {
    config: SynapseStoreConfig,
    num_neurons: u32,
    pre: Vec<NeuronId>,
    post: Vec<NeuronId>,
    weight: Vec<f32>,
    plastic: Vec<bool>,
    last_update: Vec<Time>,
    eligibility: Vec<f32>,
    consolidation_state: Vec<ConsolidationState>,
    outgoing: Vec<Vec<SynapseId>>,
    incoming: Vec<Vec<SynapseId>>,
    fan_out: Vec<u32>,
    guardrail: GuardrailCounters,
}

impl SynapseStore {
    /// Construct an empty store sized for `num_neurons` neurons.
    pub fn new(num_neurons: u32, config: SynapseStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            num_neurons,
            pre: Vec::new(),
            post: Vec::new(),
            weight: Vec::new(),
            plastic: Vec::new(),
            last_update: Vec::new(),
            eligibility: Vec::new(),
            consolidation_state: Vec::new(),
            outgoing: vec![Vec::new(); num_neurons as usize],
            incoming: vec![Vec::new(); num_neurons as usize],
            fan_out: vec![0; num_neurons as usize],
            guardrail: GuardrailCounters::new(),
        })
    }

    fn validate_neuron(&self, id: NeuronId) -> Result<()> {
        if id.raw() >= self.num_neurons {
            return Err(RuntimeError::InvalidNeuronId { neuron_id: id.raw() });
        }
        Ok(())
    }

    /// Create a new directed edge, returning its dense id.
    ///
    /// Fails if `pre` or `post` is not a valid neuron id, if `pre == post`,
    /// or if `pre`'s outgoing fan-out would exceed the configured cap.
    pub fn add_edge(&mut self, pre: NeuronId, post: NeuronId, initial_weight: f32, plastic: bool) -> Result<SynapseId> {
        self.validate_neuron(pre)?;
        self.validate_neuron(post)?;
        if pre == post {
            return Err(RuntimeError::SelfLoop { neuron_id: pre.raw() });
        }
        let current_fan_out = self.fan_out[pre.index()];
        if current_fan_out >= self.config.fan_out_cap {
            return Err(RuntimeError::FanOutExceeded {
                neuron_id: pre.raw(),
                attempted: current_fan_out + 1,
                cap: self.config.fan_out_cap,
            });
        }

        let id = SynapseId::new(self.weight.len() as u64);
        let clamped = guard_weight(initial_weight, 0.0, self.config.w_min, self.config.w_max, &self.guardrail);
        self.pre.push(pre);
        self.post.push(post);
        self.weight.push(clamped);
        self.plastic.push(plastic);
        self.last_update.push(Time::ZERO);
        self.eligibility.push(0.0);
        self.consolidation_state.push(ConsolidationState::Active);
        self.outgoing[pre.index()].push(id);
        self.incoming[post.index()].push(id);
        self.fan_out[pre.index()] += 1;
        Ok(id)
    }

    /// Number of synapses in the store.
    pub fn len(&self) -> usize {
        self.weight.len()
    }

    /// Whether the store has no synapses.
    pub fn is_empty(&self) -> bool {
        self.weight.is_empty()
    }

    fn validate_synapse(&self, id: SynapseId) -> Result<()> {
        if id.index() >= self.weight.len() {
            return Err(RuntimeError::InvalidSynapseId { synapse_id: id.raw() });
        }
        Ok(())
    }

    /// The presynaptic neuron of `id`.
    pub fn pre_of(&self, id: SynapseId) -> NeuronId {
        self.pre[id.index()]
    }

    /// The postsynaptic neuron of `id`.
    pub fn post_of(&self, id: SynapseId) -> NeuronId {
        self.post[id.index()]
    }

    /// Current weight of `id`, already guardrail-clamped.
    pub fn weight(&self, id: SynapseId) -> f32 {
        self.weight[id.index()]
    }

    /// Whether `id` participates in plasticity.
    pub fn is_plastic(&self, id: SynapseId) -> bool {
        self.plastic[id.index()]
    }

    /// Timestamp of the last weight write to `id`.
    pub fn last_update(&self, id: SynapseId) -> Time {
        self.last_update[id.index()]
    }

    /// Current eligibility trace of `id`.
    pub fn eligibility(&self, id: SynapseId) -> f32 {
        self.eligibility[id.index()]
    }

    /// Set the eligibility trace of `id` directly (used by the three-factor
    /// rule's maintenance step; not guardrailed since eligibility is not a
    /// persisted weight).
    pub fn set_eligibility(&mut self, id: SynapseId, value: f32) {
        self.eligibility[id.index()] = if value.is_finite() { value } else { 0.0 };
    }

    /// Current consolidation classification of `id`.
    pub fn consolidation_state(&self, id: SynapseId) -> ConsolidationState {
        self.consolidation_state[id.index()]
    }

    /// Set the consolidation classification of `id`. Observation only;
    /// never called from a weight-update rule.
    pub fn set_consolidation_state(&mut self, id: SynapseId, state: ConsolidationState) {
        self.consolidation_state[id.index()] = state;
    }

    /// Write a weight through the guardrail.
    pub fn set_weight(&mut self, id: SynapseId, candidate: f32, now: Time) -> Result<()> {
        self.validate_synapse(id)?;
        let previous = self.weight[id.index()];
        self.weight[id.index()] = guard_weight(candidate, previous, self.config.w_min, self.config.w_max, &self.guardrail);
        self.last_update[id.index()] = now;
        Ok(())
    }

    /// Equivalent to `set_weight(id, weight(id) + dw, now)`.
    pub fn add_weight(&mut self, id: SynapseId, dw: f32, now: Time) -> Result<()> {
        self.validate_synapse(id)?;
        let candidate = self.weight[id.index()] + dw;
        self.set_weight(id, candidate, now)
    }

    /// Directly restore a synapse's persisted fields from a checkpoint,
    /// bypassing the guardrail: the value was already guardrail-clamped at
    /// save time, and re-clamping here would risk nudging it through a
    /// rejection path that increments counters for data that was never
    /// actually rejected.
    pub fn restore(
        &mut self,
        id: SynapseId,
        weight: f32,
        last_update: Time,
        eligibility: f32,
        consolidation_state: ConsolidationState,
    ) -> Result<()> {
        self.validate_synapse(id)?;
        let i = id.index();
        self.weight[i] = weight;
        self.last_update[i] = last_update;
        self.eligibility[i] = eligibility;
        self.consolidation_state[i] = consolidation_state;
        Ok(())
    }

    /// Outgoing edge ids from `pre`.
    pub fn outgoing_of(&self, pre: NeuronId) -> &[SynapseId] {
        &self.outgoing[pre.index()]
    }

    /// Incoming edge ids to `post`.
    pub fn incoming_of(&self, post: NeuronId) -> &[SynapseId] {
        &self.incoming[post.index()]
    }

    /// Iterate over every synapse id in dense order.
    pub fn ids(&self) -> impl Iterator<Item = SynapseId> + '_ {
        (0..self.weight.len() as u64).map(SynapseId::new)
    }

    /// Current outgoing fan-out recorded for `pre`.
    pub fn fan_out_of(&self, pre: NeuronId) -> u32 {
        self.fan_out[pre.index()]
    }

    /// Bounds and capacity this store was constructed with.
    pub fn config(&self) -> SynapseStoreConfig {
        self.config
    }

    /// Total number of weight writes rejected by the guardrail so far.
    pub fn guardrail_rejections(&self) -> u64 {
        self.guardrail.rejections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_edge_rejects_unknown_neuron() {
        let mut store = SynapseStore::new(2, SynapseStoreConfig::default()).unwrap();
        let err = store.add_edge(NeuronId::new(0), NeuronId::new(5), 0.1, true);
        assert!(matches!(err, Err(RuntimeError::InvalidNeuronId { neuron_id: 5 })));
    }

    #[test]
    fn add_edge_rejects_self_loop() {
        let mut store = SynapseStore::new(2, SynapseStoreConfig::default()).unwrap();
        let err = store.add_edge(NeuronId::new(0), NeuronId::new(0), 0.1, true);
        assert!(matches!(err, Err(RuntimeError::SelfLoop { neuron_id: 0 })));
    }

    #[test]
    fn add_edge_enforces_fan_out_cap() {
        let config = SynapseStoreConfig {
            fan_out_cap: 1,
            ..Default::default()
        };
        let mut store = SynapseStore::new(3, config).unwrap();
        store.add_edge(NeuronId::new(0), NeuronId::new(1), 0.1, true).unwrap();
        let err = store.add_edge(NeuronId::new(0), NeuronId::new(2), 0.1, true);
        assert!(matches!(err, Err(RuntimeError::FanOutExceeded { .. })));
    }

    #[test]
    fn weight_writes_pass_through_guardrail() {
        let mut store = SynapseStore::new(2, SynapseStoreConfig::default()).unwrap();
        let id = store.add_edge(NeuronId::new(0), NeuronId::new(1), 0.5, true).unwrap();
        store.set_weight(id, 10.0, Time::ZERO).unwrap();
        assert_eq!(store.weight(id), 1.0);

        store.set_weight(id, f32::NAN, Time::from_millis(1)).unwrap();
        assert_eq!(store.weight(id), 1.0);
        assert_eq!(store.guardrail_rejections(), 1);
    }

    #[test]
    fn add_weight_is_relative() {
        let mut store = SynapseStore::new(2, SynapseStoreConfig::default()).unwrap();
        let id = store.add_edge(NeuronId::new(0), NeuronId::new(1), 0.2, true).unwrap();
        store.add_weight(id, 0.1, Time::ZERO).unwrap();
        assert!((store.weight(id) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn adjacency_lists_are_consistent() {
        let mut store = SynapseStore::new(3, SynapseStoreConfig::default()).unwrap();
        let a = store.add_edge(NeuronId::new(0), NeuronId::new(1), 0.1, true).unwrap();
        let b = store.add_edge(NeuronId::new(0), NeuronId::new(2), 0.1, true).unwrap();
        assert_eq!(store.outgoing_of(NeuronId::new(0)), &[a, b]);
        assert_eq!(store.incoming_of(NeuronId::new(1)), &[a]);
        assert_eq!(store.incoming_of(NeuronId::new(2)), &[b]);
    }

    proptest! {
        #[test]
        fn weight_stays_bounded_and_finite_under_arbitrary_writes(
            initial in -1000.0f32..1000.0,
            deltas in prop::collection::vec(-1000.0f32..1000.0, 0..20),
        ) {
            let mut store = SynapseStore::new(2, SynapseStoreConfig::default()).unwrap();
            let id = store.add_edge(NeuronId::new(0), NeuronId::new(1), initial, true).unwrap();
            for dw in deltas {
                store.add_weight(id, dw, Time::ZERO).unwrap();
                let w = store.weight(id);
                prop_assert!(w.is_finite());
                prop_assert!(w >= store.config.w_min && w <= store.config.w_max);
            }
        }
    }
}
