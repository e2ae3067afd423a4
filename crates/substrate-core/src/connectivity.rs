//! Connectivity manager: builds inter-region synapse sets honoring a
//! fan-out cap per source neuron.
//!
//! This module only *plans* connectivity — it returns `(pre, post)` pairs
//! for the caller (`substrate-runtime`'s synapse store) to instantiate with
//! actual weights, since only the synapse store can allocate dense
//! `SynapseId`s and apply the guardrail to initial weights.

use crate::{
    error::{CoreError, Result},
    ids::NeuronId,
    region::Region,
};

/// Configuration for a connectivity pass between two regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityConfig {
    /// Maximum number of outgoing synapses per source neuron, across the
    /// whole connectivity manager (not just this one pass).
    pub fan_out_cap: u32,
    /// Fraction of all possible `(pre, post)` pairs to wire, in `(0, 1]`.
    pub density: f32,
    /// Whether self-loops within a region (pre == post) are permitted.
    pub allow_self_loops: bool,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            fan_out_cap: 64,
            density: 0.1,
            allow_self_loops: false,
        }
    }
}

/// Tracks per-neuron outgoing fan-out across all connectivity passes made
/// through this manager, so a cap configured once is honored cumulatively.
#[derive(Debug, Default)]
pub struct ConnectivityManager {
    fan_out: std::collections::HashMap<NeuronId, u32>,
    cap: u32,
}

impl ConnectivityManager {
    /// Create a new connectivity manager with the given cumulative fan-out
    /// cap per source neuron.
    pub fn new(fan_out_cap: u32) -> Self {
        Self {
            fan_out: std::collections::HashMap::new(),
            cap: fan_out_cap,
        }
    }

    /// Current outgoing fan-out recorded for `neuron`.
    pub fn fan_out_of(&self, neuron: NeuronId) -> u32 {
        self.fan_out.get(&neuron).copied().unwrap_or(0)
    }

    /// Plan a deterministic, capped set of `(pre, post)` pairs connecting
    /// every neuron in `source` to a pseudo-random sample of neurons in
    /// `target`, honoring both the per-pass `density` and the manager's
    /// cumulative fan-out cap. `seed` makes the pass reproducible.
    pub fn plan_projection(
        &mut self,
        source: &Region,
        target: &Region,
        config: ConnectivityConfig,
        seed: u64,
    ) -> Result<Vec<(NeuronId, NeuronId)>> {
        if config.density <= 0.0 || config.density > 1.0 {
            return Err(CoreError::InvalidDensity {
                density: config.density,
            });
        }

        let mut rng = SplitMix64::new(seed);
        let targets: Vec<NeuronId> = target.neuron_ids().collect();
        let mut planned = Vec::new();

        for pre in source.neuron_ids() {
            let remaining_budget = self.cap.saturating_sub(self.fan_out_of(pre));
            if remaining_budget == 0 {
                continue;
            }

            let mut candidates: Vec<NeuronId> = targets
                .iter()
                .copied()
                .filter(|post| config.allow_self_loops || *post != pre)
                .collect();
            shuffle(&mut candidates, &mut rng);

            let want = ((candidates.len() as f32) * config.density).round() as usize;
            let take = want.min(remaining_budget as usize).min(candidates.len());

            for post in candidates.into_iter().take(take) {
                planned.push((pre, post));
                *self.fan_out.entry(pre).or_insert(0) += 1;
            }
        }

        Ok(planned)
    }
}

/// Small, dependency-free splittable PRNG used only for deterministic
/// connectivity sampling.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

fn shuffle<T>(items: &mut [T], rng: &mut SplitMix64) {
    for i in (1..items.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}
