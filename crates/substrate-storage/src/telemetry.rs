//! Telemetry sink: decoupled-cadence, best-effort persistence of learning
//! statistics, substrate state snapshots, reward provenance, and (optionally)
//! a recent-spike ring buffer.
//!
//! The compute loop is authoritative and must never stall on telemetry. Each
//! stream is a bounded, lock-free `crossbeam` queue shared between the
//! producing sink and a consuming receiver; on overflow the oldest queued
//! row is dropped and a per-stream counter increments, rather than blocking
//! the producer or growing without bound.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;

use substrate_core::Time;

/// A fixed-capacity, lock-free queue that drops the oldest entry on
/// overflow instead of blocking. Shared between a [`TelemetrySink`] and its
/// [`TelemetryReceiver`] via `Arc`.
struct BoundedRing<T> {
    queue: ArrayQueue<T>,
}

impl<T> BoundedRing<T> {
    fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            queue: ArrayQueue::new(capacity.max(1)),
        })
    }

    /// Push a row, evicting the oldest if at capacity. Returns `true` if a
    /// row was evicted to make room.
    fn push(&self, row: T) -> bool {
        match self.queue.push(row) {
            Ok(()) => false,
            Err(rejected) => {
                // Make room by evicting the oldest row, then retry. A
                // concurrent consumer may have already freed a slot, or a
                // concurrent producer may have raced us into it; either way
                // at most one row is dropped per call.
                let evicted = self.queue.pop().is_some();
                if self.queue.push(rejected).is_err() {
                    return true;
                }
                evicted
            }
        }
    }

    fn try_recv(&self) -> Option<T> {
        self.queue.pop()
    }
}

/// Receiving end of a single telemetry stream.
pub struct StreamReceiver<T> {
    ring: Arc<BoundedRing<T>>,
}

impl<T> StreamReceiver<T> {
    /// Pop the oldest queued row, if any.
    pub fn try_recv(&self) -> Option<T> {
        self.ring.try_recv()
    }
}

/// One row of the `learning_stats` stream (§4.6): run totals as of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningStatsRow {
    /// Run this row belongs to.
    pub run_id: u64,
    /// Tick at which these totals were observed.
    pub step: u64,
    /// Wall-clock time of observation.
    pub timestamp: Time,
    /// Cumulative Hebbian updates applied.
    pub hebbian_updates: u64,
    /// Cumulative STDP updates applied.
    pub stdp_updates: u64,
    /// Cumulative reward-modulated updates applied.
    pub reward_updates: u64,
    /// Running average weight delta magnitude.
    pub avg_weight_delta: f32,
    /// Synapses currently classified potentiated by consolidation.
    pub potentiated_count: u64,
    /// Synapses currently classified depressed by consolidation.
    pub depressed_count: u64,
    /// Synapses currently classified active (stable) by consolidation.
    pub active_count: u64,
    /// Estimated metabolic energy expenditure.
    pub metabolic_energy: f32,
    /// Guardrail rejections (non-finite weight writes) so far this run.
    pub guardrail_rejections: u64,
}

/// One row of the `substrate_states` stream (§4.6): an aggregated snapshot,
/// not a per-synapse dump.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstrateStateRow {
    /// Run this row belongs to.
    pub run_id: u64,
    /// Tick at which this snapshot was taken.
    pub step: u64,
    /// Wall-clock time of observation.
    pub timestamp: Time,
    /// Aggregate coherence metric across regions.
    pub coherence: f32,
    /// Current count of transient co-active assemblies.
    pub assembly_count: u64,
    /// Current count of cross-region binding events.
    pub binding_count: u64,
    /// `Δassemblies + Δbindings` since the previous row.
    pub growth_velocity: i64,
}

/// One row of the `reward_log` stream (§4.6): shaped reward provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardLogRow {
    /// Run this row belongs to.
    pub run_id: u64,
    /// Tick at which the reward was delivered.
    pub step: u64,
    /// Wall-clock time of delivery.
    pub timestamp: Time,
    /// Final shaped scalar, already clamped to `[-R_MAX, R_MAX]`.
    pub shaped_value: f32,
    /// Per-component contributions, `(kind name, weight, value)`.
    pub components: Vec<(&'static str, f32, f32)>,
    /// Free-form source tag (e.g. `"episodic"`, `"streaming"`).
    pub source_tag: String,
}

/// One row of the optional `spike_log` ring buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeLogRow {
    /// Run this row belongs to.
    pub run_id: u64,
    /// Neuron that spiked.
    pub neuron_id: u32,
    /// Spike timestamp.
    pub timestamp: Time,
}

/// Per-stream drop counters, exposed so a `LearningStats` snapshot can
/// surface telemetry health without the compute loop depending on the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryDropCounters {
    /// Rows dropped from `learning_stats` due to channel overflow.
    pub learning_stats: u64,
    /// Rows dropped from `substrate_states` due to channel overflow.
    pub substrate_states: u64,
    /// Rows dropped from `reward_log` due to channel overflow.
    pub reward_log: u64,
    /// Rows dropped from `spike_log` due to channel overflow.
    pub spike_log: u64,
}

impl TelemetryDropCounters {
    /// Total rows dropped across all streams.
    pub fn total(&self) -> u64 {
        self.learning_stats + self.substrate_states + self.reward_log + self.spike_log
    }
}

/// Cadence configuration for the telemetry sink (§4.6: `memdb_interval_ms`
/// and `reward_interval_ms` are independent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryConfig {
    /// Interval, in milliseconds, between `learning_stats`/`substrate_states`
    /// rows.
    pub memdb_interval_ms: u64,
    /// Interval, in milliseconds, between `reward_log` rows.
    pub reward_interval_ms: u64,
    /// Bounded channel capacity per stream.
    pub channel_capacity: usize,
    /// Whether the optional spike ring buffer is enabled.
    pub spike_log_enabled: bool,
    /// Capacity of the spike ring buffer, when enabled.
    pub spike_log_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            memdb_interval_ms: 500,
            reward_interval_ms: 1000,
            channel_capacity: 1024,
            spike_log_enabled: false,
            spike_log_capacity: 4096,
        }
    }
}

/// Cadence gate: tracks the last emission time per stream and reports
/// whether enough simulated time has elapsed to emit again.
#[derive(Debug, Clone, Copy, Default)]
struct CadenceGate {
    interval_ms: u64,
    last_emitted_ms: Option<u64>,
}

impl CadenceGate {
    fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_emitted_ms: None,
        }
    }

    fn ready(&mut self, now: Time) -> bool {
        let now_ms = now.millis();
        match self.last_emitted_ms {
            None => {
                self.last_emitted_ms = Some(now_ms);
                true
            }
            Some(last) if now_ms.saturating_sub(last) >= self.interval_ms => {
                self.last_emitted_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }
}

/// Producer-side handle held by the compute loop. Never blocks: every send
/// is an in-place push, and overflow drops the oldest queued row.
pub struct TelemetrySink {
    config: TelemetryConfig,
    memdb_gate: CadenceGate,
    reward_gate: CadenceGate,

    learning_stats: Arc<BoundedRing<LearningStatsRow>>,
    substrate_states: Arc<BoundedRing<SubstrateStateRow>>,
    reward_log: Arc<BoundedRing<RewardLogRow>>,
    spike_log: Option<Arc<BoundedRing<SpikeLogRow>>>,

    drops: TelemetryDropCounters,
}

/// Consumer-side handle held by whatever durable store drains the sink
/// (a file writer, an in-memory `Vec` in tests, a remote collector, ...).
pub struct TelemetryReceiver {
    /// Receiving end of `learning_stats`.
    pub learning_stats: StreamReceiver<LearningStatsRow>,
    /// Receiving end of `substrate_states`.
    pub substrate_states: StreamReceiver<SubstrateStateRow>,
    /// Receiving end of `reward_log`.
    pub reward_log: StreamReceiver<RewardLogRow>,
    /// Receiving end of `spike_log`, if enabled.
    pub spike_log: Option<StreamReceiver<SpikeLogRow>>,
}

impl TelemetrySink {
    /// Build a sink/receiver pair wired together with bounded rings sized
    /// per `config.channel_capacity`.
    pub fn new(config: TelemetryConfig) -> (Self, TelemetryReceiver) {
        let learning_stats = BoundedRing::new(config.channel_capacity);
        let substrate_states = BoundedRing::new(config.channel_capacity);
        let reward_log = BoundedRing::new(config.channel_capacity);
        let spike_log = if config.spike_log_enabled {
            Some(BoundedRing::new(config.spike_log_capacity))
        } else {
            None
        };

        let sink = Self {
            memdb_gate: CadenceGate::new(config.memdb_interval_ms),
            reward_gate: CadenceGate::new(config.reward_interval_ms),
            config,
            learning_stats: learning_stats.clone(),
            substrate_states: substrate_states.clone(),
            reward_log: reward_log.clone(),
            spike_log: spike_log.clone(),
            drops: TelemetryDropCounters::default(),
        };
        let receiver = TelemetryReceiver {
            learning_stats: StreamReceiver { ring: learning_stats },
            substrate_states: StreamReceiver { ring: substrate_states },
            reward_log: StreamReceiver { ring: reward_log },
            spike_log: spike_log.map(|ring| StreamReceiver { ring }),
        };
        (sink, receiver)
    }

    /// Drop counters accumulated so far.
    pub fn drop_counters(&self) -> TelemetryDropCounters {
        self.drops
    }

    /// Whether the MemoryDB cadence (`learning_stats` + `substrate_states`)
    /// has elapsed as of `now`. Advances the cadence gate as a side effect,
    /// so call this once per tick and reuse the result for both streams.
    pub fn memdb_cadence_ready(&mut self, now: Time) -> bool {
        self.memdb_gate.ready(now)
    }

    /// Whether the reward cadence has elapsed as of `now`. Advances the
    /// cadence gate as a side effect.
    pub fn reward_cadence_ready(&mut self, now: Time) -> bool {
        self.reward_gate.ready(now)
    }

    /// Enqueue a `learning_stats` row, unconditionally. Callers gate on
    /// [`Self::memdb_cadence_ready`] first.
    pub fn send_learning_stats(&mut self, row: LearningStatsRow) {
        if self.learning_stats.push(row) {
            self.drops.learning_stats += 1;
        }
    }

    /// Enqueue a `substrate_states` row, unconditionally. Callers gate on
    /// [`Self::memdb_cadence_ready`] first.
    pub fn send_substrate_state(&mut self, row: SubstrateStateRow) {
        if self.substrate_states.push(row) {
            self.drops.substrate_states += 1;
        }
    }

    /// Enqueue a `reward_log` row, unconditionally. Callers gate on
    /// [`Self::reward_cadence_ready`] first.
    pub fn send_reward_log(&mut self, row: RewardLogRow) {
        if self.reward_log.push(row) {
            self.drops.reward_log += 1;
        }
    }

    /// Record a spike into the ring buffer, if enabled. Unlike the other
    /// streams this is not cadence-gated; it is itself a bounded ring.
    pub fn record_spike(&mut self, row: SpikeLogRow) {
        if let Some(ring) = &self.spike_log {
            if ring.push(row) {
                self.drops.spike_log += 1;
            }
        }
    }

    /// Current cadence configuration.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

/// A simple in-process telemetry store used by tests and small standalone
/// runs: drains each stream into a bounded `VecDeque`, matching what a real
/// durable sink would do on its own consumer thread.
pub struct InMemoryTelemetryStore {
    /// Retained `learning_stats` rows, oldest first.
    pub learning_stats: VecDeque<LearningStatsRow>,
    /// Retained `substrate_states` rows, oldest first.
    pub substrate_states: VecDeque<SubstrateStateRow>,
    /// Retained `reward_log` rows, oldest first.
    pub reward_log: VecDeque<RewardLogRow>,
    /// Retained `spike_log` rows, oldest first.
    pub spike_log: VecDeque<SpikeLogRow>,
}

impl InMemoryTelemetryStore {
    /// Drain every currently queued row from `receiver` into this store.
    pub fn drain(receiver: &TelemetryReceiver) -> Self {
        let mut store = Self {
            learning_stats: VecDeque::new(),
            substrate_states: VecDeque::new(),
            reward_log: VecDeque::new(),
            spike_log: VecDeque::new(),
        };
        while let Some(row) = receiver.learning_stats.try_recv() {
            store.learning_stats.push_back(row);
        }
        while let Some(row) = receiver.substrate_states.try_recv() {
            store.substrate_states.push_back(row);
        }
        while let Some(row) = receiver.reward_log.try_recv() {
            store.reward_log.push_back(row);
        }
        if let Some(rx) = &receiver.spike_log {
            while let Some(row) = rx.try_recv() {
                store.spike_log.push_back(row);
            }
        }
        store
    }
}
