//! Run a brain for a fixed number of ticks, optionally resuming from and
//! saving to a checkpoint.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use substrate_core::RegionId;
use substrate_runtime::{Brain, BrainBuilder};

use crate::config::SubstrateConfig;
use crate::error::{CliError, CliResult};

/// A region spec of the form `name:count:threshold`.
#[derive(Debug, Clone)]
pub struct RegionSpec {
    /// Region name, used by `--connect` and telemetry.
    pub name: String,
    /// Number of neurons in the region.
    pub count: u32,
    /// Firing threshold shared by every neuron in the region.
    pub threshold: f32,
}

impl std::str::FromStr for RegionSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [name, count, threshold] = parts.as_slice() else {
            return Err(format!("expected name:count:threshold, got `{s}`"));
        };
        Ok(Self {
            name: (*name).to_string(),
            count: count.parse().map_err(|e| format!("invalid count in `{s}`: {e}"))?,
            threshold: threshold.parse().map_err(|e| format!("invalid threshold in `{s}`: {e}"))?,
        })
    }
}

/// A projection spec of the form `source:target:density:weight:plastic`.
#[derive(Debug, Clone)]
pub struct ConnectSpec {
    /// Name of the source region.
    pub source: String,
    /// Name of the target region.
    pub target: String,
    /// Fraction of all possible pairs to wire, in `(0, 1]`.
    pub density: f32,
    /// Initial weight assigned to every created synapse.
    pub weight: f32,
    /// Whether the created synapses are eligible for learning.
    pub plastic: bool,
}

impl std::str::FromStr for ConnectSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [source, target, density, weight, plastic] = parts.as_slice() else {
            return Err(format!("expected source:target:density:weight:plastic, got `{s}`"));
        };
        Ok(Self {
            source: (*source).to_string(),
            target: (*target).to_string(),
            density: density.parse().map_err(|e| format!("invalid density in `{s}`: {e}"))?,
            weight: weight.parse().map_err(|e| format!("invalid weight in `{s}`: {e}"))?,
            plastic: plastic.parse().map_err(|e| format!("invalid plastic flag in `{s}`: {e}"))?,
        })
    }
}

/// Run a brain for a fixed number of ticks.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Number of ticks to run.
    #[arg(long, default_value = "1000")]
    pub steps: u64,

    /// Region to create, `name:count:threshold`. Repeatable.
    #[arg(long = "region", value_name = "NAME:COUNT:THRESHOLD")]
    pub regions: Vec<RegionSpec>,

    /// Inter-region projection to wire, `source:target:density:weight:plastic`. Repeatable.
    #[arg(long = "connect", value_name = "SOURCE:TARGET:DENSITY:WEIGHT:PLASTIC")]
    pub connections: Vec<ConnectSpec>,

    /// Seed for deterministic connectivity planning.
    #[arg(long, default_value = "1")]
    pub seed: u64,

    /// Run identifier stamped onto every telemetry row.
    #[arg(long, default_value = "1")]
    pub run_id: u64,

    /// Resume from a checkpoint instead of building fresh regions.
    #[arg(long = "load-state", env = "SUBSTRATE_LOAD_STATE")]
    pub load_state: Option<PathBuf>,

    /// Save a checkpoint after the run completes.
    #[arg(long = "save-state", env = "SUBSTRATE_SAVE_STATE")]
    pub save_state: Option<PathBuf>,

    /// Print per-tick learning and reward diagnostics to stderr.
    #[arg(long)]
    pub diagnostics: bool,
}

impl RunCommand {
    pub fn execute(self, config: &SubstrateConfig) -> CliResult<()> {
        let engine_config = config.to_engine_config()?;
        let fan_out_cap = engine_config.synapse_store.fan_out_cap;

        let mut brain = if let Some(path) = &self.load_state {
            info!("resuming from checkpoint {}", path.display());
            let (brain, _rx) = Brain::load_checkpoint(path, engine_config)?;
            brain
        } else {
            let mut builder = BrainBuilder::new(engine_config);
            let mut region_ids = std::collections::HashMap::new();
            for spec in &self.regions {
                let id = builder.add_region(spec.name.clone(), spec.count, spec.threshold)?;
                region_ids.insert(spec.name.clone(), id);
            }
            let (mut brain, _rx) = builder.build(self.run_id)?;
            for spec in &self.connections {
                let source = resolve_region(&region_ids, &spec.source)?;
                let target = resolve_region(&region_ids, &spec.target)?;
                brain.connect_regions(
                    source,
                    target,
                    substrate_core::ConnectivityConfig {
                        fan_out_cap,
                        density: spec.density,
                        allow_self_loops: false,
                    },
                    self.seed,
                    spec.weight,
                    spec.plastic,
                )?;
            }
            brain
        };

        for step in 0..self.steps {
            brain.tick()?;
            if self.diagnostics {
                let stats = brain.learning_stats();
                eprintln!(
                    "step={step} hebbian={} stdp={} reward={} active={} potentiated={} depressed={}",
                    stats.hebbian_updates,
                    stats.stdp_updates,
                    stats.reward_updates,
                    stats.active_synapses,
                    stats.potentiated_synapses,
                    stats.depressed_synapses,
                );
            }
        }

        if let Some(path) = &self.save_state {
            brain.save_checkpoint(path)?;
            info!("saved checkpoint to {}", path.display());
        }

        info!(
            "run complete: {} ticks, {} total learning updates",
            self.steps,
            brain.learning_stats().total_updates()
        );
        Ok(())
    }
}

fn resolve_region(
    region_ids: &std::collections::HashMap<String, RegionId>,
    name: &str,
) -> CliResult<RegionId> {
    region_ids
        .get(name)
        .copied()
        .ok_or_else(|| CliError::invalid_args(format!("unknown region `{name}` in --connect")))
}
