//! Pluggable compute backend for the per-tick neuron sweep.
//!
//! A GPU or SIMD-accelerated kernel is out of scope; this trait exists so
//! one could be added later without touching [`crate::engine::Brain`]. The
//! only implementation shipped here is the reference CPU backend.

use substrate_core::{SpikeEvent, Time};

use crate::neuron_store::NeuronStore;
use crate::synapse_store::SynapseStore;

/// Advances every neuron by one tick, returning the spikes emitted.
pub trait KernelBackend: Send + Sync {
    /// Run one tick of neuron dynamics.
    fn process_neurons(&self, dt_ms: f32, now: Time, neurons: &mut NeuronStore, synapses: &SynapseStore) -> Vec<SpikeEvent>;
}

/// Reference implementation: calls [`NeuronStore::process`] directly,
/// single-threaded.
#[derive(Debug, Default)]
pub struct CpuKernel;

impl KernelBackend for CpuKernel {
    fn process_neurons(&self, dt_ms: f32, now: Time, neurons: &mut NeuronStore, synapses: &SynapseStore) -> Vec<SpikeEvent> {
        neurons.process(dt_ms, now, synapses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron_store::NeuronStoreConfig;
    use crate::synapse_store::SynapseStoreConfig;
    use substrate_core::NeuronId;

    #[test]
    fn cpu_kernel_matches_direct_process_call() {
        let synapses = SynapseStore::new(1, SynapseStoreConfig::default()).unwrap();
        let mut neurons = NeuronStore::new(vec![0.5], NeuronStoreConfig::default()).unwrap();
        neurons.add_pending_input(NeuronId::new(0), 1.0).unwrap();
        let spikes = CpuKernel.process_neurons(1.0, Time::from_millis(1), &mut neurons, &synapses);
        assert_eq!(spikes.len(), 1);
    }
}
