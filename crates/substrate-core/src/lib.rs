//! Core identifiers, regions and connectivity primitives for the substrate
//! learning engine.
//!
//! This crate has no notion of simulation time stepping or plasticity rules;
//! it owns only the shapes shared across the rest of the workspace: dense ID
//! newtypes, the value types that flow between components (spikes, reward
//! components, shaped reward), and the region/connectivity bookkeeping used
//! to wire a hypergraph of regions together.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod error;
pub mod ids;
pub mod region;
pub mod reward;
pub mod spike;
pub mod time;

pub use connectivity::{ConnectivityConfig, ConnectivityManager};
pub use error::{CoreError, Result};
pub use ids::{NeuronId, RegionId, SynapseId};
pub use region::{Region, RegionConfig};
pub use reward::{RewardComponent, RewardKind, ShapedReward, R_MAX};
pub use spike::SpikeEvent;
pub use time::Time;

/// Version of the core data model, bumped whenever a persisted field changes
/// meaning (not merely when fields are added).
pub const CORE_MODEL_VERSION: u32 = 1;
