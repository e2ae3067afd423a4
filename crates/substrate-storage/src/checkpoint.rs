//! Versioned binary checkpoint container.
//!
//! A checkpoint holds a read-only snapshot of every persistent field of a
//! running brain: region layout, neuron state, synapse topology and
//! weights, engine parameters, and RNG state. The container is
//! self-describing (magic + version) and integrity-checked (CRC32 over the
//! body), so a corrupt or foreign file is rejected before any field is
//! trusted.
//!
//! This crate does not know how a neuron or synapse store is represented in
//! memory — it only knows these plain record types. `substrate-runtime`
//! converts its live arenas to and from them at save/load time.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use substrate_core::{NeuronId, RegionId, SynapseId, Time};

use crate::error::{Result, StorageError};

const MAGIC: [u8; 4] = *b"SCKP";

/// Highest container version this build can read and the version it writes.
pub const CURRENT_VERSION: u32 = 1;

/// State of a single neuron at checkpoint time, mirroring the tri-state
/// machine of the neuron store (Inactive/Active/Refractory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeuronStateCode {
    /// Not currently spiking or refractory.
    Inactive,
    /// Threshold was crossed this step; propagation pending/in-flight.
    Active,
    /// Past threshold crossing, waiting out the refractory period.
    Refractory,
}

/// Persisted neuron fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronRecord {
    /// Dense neuron id.
    pub id: u32,
    /// Membrane activation in `[0, 1]`.
    pub activation: f32,
    /// Firing threshold.
    pub threshold: f32,
    /// Nanosecond timestamp at which refractoriness ends.
    pub refractory_until_nanos: u64,
    /// Total number of times this neuron has fired.
    pub fire_count: u64,
    /// Nanosecond timestamp of the most recent spike, if any.
    pub last_spike_time_nanos: u64,
    /// Current state machine position.
    pub state: NeuronStateCode,
}

/// Persisted synapse fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseRecord {
    /// Dense synapse id.
    pub id: u64,
    /// Presynaptic neuron id.
    pub pre: u32,
    /// Postsynaptic neuron id.
    pub post: u32,
    /// Synaptic weight, already guardrail-clamped.
    pub weight: f32,
    /// Whether this synapse participates in plasticity.
    pub plastic: bool,
    /// Nanosecond timestamp of the last weight write.
    pub last_update_time_nanos: u64,
    /// Reward-modulated eligibility trace.
    pub eligibility_trace: f32,
    /// Consolidation classification as of the last sweep (0 = active,
    /// 1 = potentiated, 2 = depressed).
    pub consolidation_state: u8,
}

/// Persisted region fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Region id.
    pub id: u32,
    /// Region name, unique within the brain.
    pub name: String,
    /// First neuron id owned by this region.
    pub first_neuron: u32,
    /// Number of neurons owned by this region.
    pub neuron_count: u32,
    /// Whether Hebbian updates are currently enabled for this region.
    pub hebbian_enabled: bool,
    /// Current attention gain.
    pub attention_gain: f32,
    /// Attention gain ceiling.
    pub gain_max: f32,
}

/// A full, self-contained checkpoint: every persistent field needed to
/// resume a run bit-exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Monotonically increasing identifier for the run this checkpoint was
    /// taken from.
    pub run_id: u64,
    /// Tick counter at the moment of the save.
    pub step: u64,
    /// Wall-clock nanoseconds at the moment of the save.
    pub timestamp_nanos: u64,
    /// All regions.
    pub regions: Vec<RegionRecord>,
    /// All neurons.
    pub neurons: Vec<NeuronRecord>,
    /// All synapses.
    pub synapses: Vec<SynapseRecord>,
    /// Opaque, runtime-defined encoding of engine parameters (learning
    /// rates, cadences, reward weights, ...). Treated as a blob here so this
    /// crate never needs to know the runtime's config schema.
    pub engine_params: Vec<u8>,
    /// Opaque, runtime-defined encoding of the deterministic PRNG state.
    pub rng_state: Vec<u8>,
}

impl Checkpoint {
    /// Timestamp of this checkpoint as a [`Time`].
    pub fn timestamp(&self) -> Time {
        Time::from_nanos(self.timestamp_nanos)
    }

    /// Number of neurons recorded in this checkpoint.
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Number of synapses recorded in this checkpoint.
    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }
}

/// Sanity-check an id decoded from a checkpoint before trusting it.
pub fn neuron_id(raw: u32) -> NeuronId {
    NeuronId::new(raw)
}

/// Sanity-check an id decoded from a checkpoint before trusting it.
pub fn synapse_id(raw: u64) -> SynapseId {
    SynapseId::new(raw)
}

/// Sanity-check an id decoded from a checkpoint before trusting it.
pub fn region_id(raw: u32) -> RegionId {
    RegionId::new(raw)
}

/// Encode a checkpoint into the versioned binary container format:
/// `magic(4) | version(u32) | body_len(u32) | crc32(u32) | body`.
pub fn encode(checkpoint: &Checkpoint) -> Result<Vec<u8>> {
    let body = bincode::serialize(checkpoint)?;
    let crc = crc32fast::hash(&body);

    let mut out = Vec::with_capacity(4 + 4 + 4 + 4 + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a checkpoint previously written by [`encode`], verifying the
/// magic number, version, and CRC32 before trusting any field.
pub fn decode(bytes: &[u8]) -> Result<Checkpoint> {
    if bytes.len() < 16 {
        return Err(StorageError::Malformed {
            reason: format!("container too short: {} bytes", bytes.len()),
        });
    }

    let found_magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if found_magic != MAGIC {
        return Err(StorageError::InvalidMagic {
            expected: MAGIC,
            found: found_magic,
        });
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version > CURRENT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            version,
            supported: CURRENT_VERSION,
        });
    }

    let body_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let expected_crc = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let body = bytes.get(16..16 + body_len).ok_or_else(|| StorageError::Malformed {
        reason: format!(
            "declared body length {body_len} exceeds container size {}",
            bytes.len().saturating_sub(16)
        ),
    })?;

    let computed_crc = crc32fast::hash(body);
    if computed_crc != expected_crc {
        return Err(StorageError::ChecksumMismatch {
            expected: expected_crc,
            computed: computed_crc,
        });
    }

    // bincode is a positional format: a body missing trailing fields hits
    // EOF rather than filling them with defaults, so schema growth needs a
    // version bump and explicit migration, not `#[serde(default)]`. See
    // `rejects_body_from_a_schema_with_fewer_fields` below.
    let checkpoint: Checkpoint = bincode::deserialize(body)?;
    Ok(checkpoint)
}

/// Save a checkpoint to `path`, overwriting any existing file.
pub fn save(checkpoint: &Checkpoint, path: impl AsRef<Path>) -> Result<()> {
    let bytes = encode(checkpoint)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Load a checkpoint previously written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<Checkpoint> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Checkpoint {
        Checkpoint {
            run_id: 7,
            step: 1000,
            timestamp_nanos: 123_456_789,
            regions: vec![RegionRecord {
                id: 0,
                name: "sensory".into(),
                first_neuron: 0,
                neuron_count: 4,
                hebbian_enabled: true,
                attention_gain: 1.0,
                gain_max: 2.0,
            }],
            neurons: vec![NeuronRecord {
                id: 0,
                activation: 0.3,
                threshold: 0.8,
                refractory_until_nanos: 0,
                fire_count: 2,
                last_spike_time_nanos: 100,
                state: NeuronStateCode::Inactive,
            }],
            synapses: vec![SynapseRecord {
                id: 0,
                pre: 0,
                post: 1,
                weight: 0.42,
                plastic: true,
                last_update_time_nanos: 50,
                eligibility_trace: 0.1,
                consolidation_state: 0,
            }],
            engine_params: vec![1, 2, 3],
            rng_state: vec![9, 9, 9],
        }
    }

    #[test]
    fn round_trips_bit_exact() {
        let original = sample();
        let bytes = encode(&original).unwrap();
        let restored = decode(&bytes).unwrap();
        assert_eq!(original.run_id, restored.run_id);
        assert_eq!(original.step, restored.step);
        assert_eq!(original.regions, restored.regions);
        assert_eq!(original.neurons, restored.neurons);
        assert_eq!(original.synapses, restored.synapses);
        assert_eq!(original.engine_params, restored.engine_params);
        assert_eq!(original.rng_state, restored.rng_state);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0] = 0;
        assert!(matches!(decode(&bytes), Err(StorageError::InvalidMagic { .. })));
    }

    #[test]
    fn rejects_truncated_body() {
        let mut bytes = encode(&sample()).unwrap();
        bytes.truncate(bytes.len() - 4);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut bytes = encode(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            decode(&bytes),
            Err(StorageError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn rejects_future_version() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[4..8].copy_from_slice(&(CURRENT_VERSION + 1).to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(StorageError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_body_from_a_schema_with_fewer_fields() {
        // Stands in for a body written before `engine_params`/`rng_state`
        // existed. bincode has no field-presence markers, so a short body
        // is indistinguishable from truncation: decode must reject it
        // rather than silently defaulting the missing tail.
        #[derive(Serialize)]
        struct OldCheckpoint {
            run_id: u64,
            step: u64,
            timestamp_nanos: u64,
            regions: Vec<RegionRecord>,
            neurons: Vec<NeuronRecord>,
            synapses: Vec<SynapseRecord>,
        }

        let old = OldCheckpoint {
            run_id: 7,
            step: 1000,
            timestamp_nanos: 123_456_789,
            regions: vec![],
            neurons: vec![],
            synapses: vec![],
        };

        let body = bincode::serialize(&old).unwrap();
        let crc = crc32fast::hash(&body);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&body);

        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn save_and_load_round_trip_via_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.bin");
        let original = sample();
        save(&original, &path).unwrap();
        let restored = load(&path).unwrap();
        assert_eq!(original.neurons, restored.neurons);
    }
}
