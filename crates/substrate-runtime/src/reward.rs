//! Reward pipeline: merges weighted reward components into a single shaped
//! scalar on its own delivery cadence, and optionally gates actions through
//! a policy/envelope/capability filter.
//!
//! The accumulator is a `parking_lot::Mutex`-protected running sum per
//! component kind rather than a true lock-free atomic-float structure;
//! contributions arrive at most a few times per tick from a handful of
//! producer threads, so a short-held mutex is the pragmatic choice the
//! teacher's own prototype reaches for elsewhere (its plasticity state is
//! single-threaded, guarded only where concurrent access is plausible).

use parking_lot::Mutex;

use substrate_core::reward::{RewardComponent, RewardKind, ShapedReward};
use substrate_core::Time;

fn kind_index(kind: RewardKind) -> usize {
    match kind {
        RewardKind::Teacher => 0,
        RewardKind::Novelty => 1,
        RewardKind::Survival => 2,
        RewardKind::Task => 3,
    }
}

const KINDS: [RewardKind; 4] = [
    RewardKind::Teacher,
    RewardKind::Novelty,
    RewardKind::Survival,
    RewardKind::Task,
];

/// Thread-safe sum-only accumulator for reward contributions arriving
/// between delivery ticks. Multiple contributions of the same kind within
/// one delivery window are summed; `drain` resets every kind to zero.
#[derive(Debug, Default)]
pub struct RewardAccumulator {
    totals: Mutex<[f32; 4]>,
}

impl RewardAccumulator {
    /// Construct a zeroed accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contribution. Non-finite values are ignored rather than
    /// poisoning the running sum.
    pub fn contribute(&self, kind: RewardKind, value: f32) {
        if !value.is_finite() {
            return;
        }
        let mut totals = self.totals.lock();
        totals[kind_index(kind)] += value;
    }

    /// Read and zero every running total.
    pub fn drain(&self) -> [f32; 4] {
        let mut totals = self.totals.lock();
        let out = *totals;
        *totals = [0.0; 4];
        out
    }
}

/// Per-kind weights applied at shaping time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardWeights {
    /// Weight on the teacher-embedding similarity component.
    pub teacher: f32,
    /// Weight on the novelty component.
    pub novelty: f32,
    /// Weight on the survival component.
    pub survival: f32,
    /// Weight on the externally supplied task component.
    pub task: f32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            teacher: RewardKind::Teacher.default_weight(),
            novelty: RewardKind::Novelty.default_weight(),
            survival: RewardKind::Survival.default_weight(),
            task: RewardKind::Task.default_weight(),
        }
    }
}

impl RewardWeights {
    fn weight_for(&self, kind: RewardKind) -> f32 {
        match kind {
            RewardKind::Teacher => self.teacher,
            RewardKind::Novelty => self.novelty,
            RewardKind::Survival => self.survival,
            RewardKind::Task => self.task,
        }
    }
}

/// Cadence configuration for reward delivery, independent of telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardPipelineConfig {
    /// Component weights.
    pub weights: RewardWeights,
    /// Minimum interval, in milliseconds, between delivered shaped rewards.
    pub delivery_interval_ms: u64,
}

impl Default for RewardPipelineConfig {
    fn default() -> Self {
        Self {
            weights: RewardWeights::default(),
            delivery_interval_ms: 100,
        }
    }
}

/// Reason an action was denied by an [`ActionFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDecision {
    /// Whether the action is permitted.
    pub ok: bool,
    /// Denied because it violates a standing policy.
    pub denied_policy: bool,
    /// Denied because it falls outside the current action envelope.
    pub denied_envelope: bool,
    /// Denied because the actor lacks the required capability.
    pub denied_capability: bool,
}

impl ActionDecision {
    /// An unconditionally permitted action.
    pub fn allow() -> Self {
        Self {
            ok: true,
            denied_policy: false,
            denied_envelope: false,
            denied_capability: false,
        }
    }
}

/// Optional veto applied to proposed actions before they are executed.
pub trait ActionFilter: Send + Sync {
    /// Evaluate whether `action` may proceed.
    fn evaluate(&self, action: &str) -> ActionDecision;
}

/// Running counts of actions denied by an [`ActionFilter`], by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatedActionCounters {
    /// Actions denied for violating policy.
    pub denied_policy: u64,
    /// Actions denied for falling outside the action envelope.
    pub denied_envelope: u64,
    /// Actions denied for lacking a required capability.
    pub denied_capability: u64,
}

impl GatedActionCounters {
    /// Total denied actions across all reasons.
    pub fn total_denied(&self) -> u64 {
        self.denied_policy + self.denied_envelope + self.denied_capability
    }
}

/// Merges accumulated reward contributions into a shaped scalar on its own
/// cadence, and optionally gates actions through an [`ActionFilter`].
pub struct RewardPipeline {
    config: RewardPipelineConfig,
    accumulator: RewardAccumulator,
    last_delivered_ms: Option<u64>,
    action_filter: Option<Box<dyn ActionFilter>>,
    gated: GatedActionCounters,
}

impl RewardPipeline {
    /// Construct a pipeline with the given configuration and no action
    /// filter.
    pub fn new(config: RewardPipelineConfig) -> Self {
        Self {
            config,
            accumulator: RewardAccumulator::new(),
            last_delivered_ms: None,
            action_filter: None,
            gated: GatedActionCounters::default(),
        }
    }

    /// Install an action filter, replacing any previous one.
    pub fn set_action_filter(&mut self, filter: Box<dyn ActionFilter>) {
        self.action_filter = Some(filter);
    }

    /// Contribute a raw component value, to be merged at the next delivery.
    pub fn contribute(&self, kind: RewardKind, value: f32) {
        self.accumulator.contribute(kind, value);
    }

    /// Evaluate a proposed action against the installed filter, if any.
    /// Actions are allowed unconditionally when no filter is installed.
    pub fn check_action(&mut self, action: &str) -> ActionDecision {
        let decision = match &self.action_filter {
            Some(filter) => filter.evaluate(action),
            None => ActionDecision::allow(),
        };
        if !decision.ok {
            if decision.denied_policy {
                self.gated.denied_policy += 1;
            }
            if decision.denied_envelope {
                self.gated.denied_envelope += 1;
            }
            if decision.denied_capability {
                self.gated.denied_capability += 1;
            }
        }
        decision
    }

    /// Counters of actions denied so far.
    pub fn gated_action_counters(&self) -> GatedActionCounters {
        self.gated
    }

    /// If the delivery cadence has elapsed as of `now`, drain the
    /// accumulator and return a shaped reward. Otherwise returns `None`,
    /// leaving contributions queued for the next call.
    pub fn maybe_deliver(&mut self, now: Time, step: u64) -> Option<ShapedReward> {
        let now_ms = now.millis();
        let ready = match self.last_delivered_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.delivery_interval_ms,
        };
        if !ready {
            return None;
        }
        self.last_delivered_ms = Some(now_ms);

        let totals = self.accumulator.drain();
        let components: Vec<RewardComponent> = KINDS
            .iter()
            .zip(totals.iter())
            .map(|(&kind, &value)| RewardComponent::new(kind, self.config.weights.weight_for(kind), value))
            .collect();
        Some(ShapedReward::shape(components, step, now))
    }
}
