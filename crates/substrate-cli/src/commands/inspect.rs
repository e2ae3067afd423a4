//! Inspect a checkpoint file without running the engine.

use std::path::PathBuf;

use clap::Args;

use crate::error::CliResult;

/// Print region/neuron/synapse counts and run metadata from a checkpoint.
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Checkpoint file to inspect.
    pub path: PathBuf,
}

impl InspectCommand {
    pub fn execute(self) -> CliResult<()> {
        let checkpoint = substrate_storage::checkpoint::load(&self.path)?;
        println!("run_id: {}", checkpoint.run_id);
        println!("step: {}", checkpoint.step);
        println!("timestamp: {}", checkpoint.timestamp().millis());
        println!("regions: {}", checkpoint.regions.len());
        println!("neurons: {}", checkpoint.neuron_count());
        println!("synapses: {}", checkpoint.synapse_count());
        for region in &checkpoint.regions {
            println!("  region `{}`: {} neurons", region.name, region.neuron_count);
        }
        Ok(())
    }
}
