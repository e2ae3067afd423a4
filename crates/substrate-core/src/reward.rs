//! Reward value types: per-component contributions and the merged scalar
//! delivered to the learning engine.
//!
//! The shaping computation itself lives in `substrate-runtime`'s reward
//! pipeline; this module only defines the shared value types so that the
//! storage layer can log them without depending on the runtime crate.

use crate::time::Time;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum absolute magnitude of a shaped reward.
pub const R_MAX: f32 = 2.0;

/// The kind of a reward component, used for provenance in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RewardKind {
    /// Cosine similarity of a student vector against a teacher embedding.
    Teacher,
    /// 1 minus cosine similarity against a running mean observation.
    Novelty,
    /// Negative hazard density plus a low-metabolic-stress bonus.
    Survival,
    /// Externally supplied task reward.
    Task,
}

impl RewardKind {
    /// Default weight for this component, per spec defaults. `Task` has no
    /// universal default since it varies per deployment.
    pub const fn default_weight(self) -> f32 {
        match self {
            RewardKind::Teacher => 0.6,
            RewardKind::Novelty => 0.1,
            RewardKind::Survival => 0.3,
            RewardKind::Task => 0.0,
        }
    }
}

/// A single weighted contribution to the shaped reward.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RewardComponent {
    /// Which component this is.
    pub kind: RewardKind,
    /// Non-negative weight applied to `value`.
    pub weight: f32,
    /// Raw component value, in `[-1, 1]` (`[0, 1]` for `Novelty`).
    pub value: f32,
}

impl RewardComponent {
    /// Create a new reward component. `weight` is clamped to be non-negative
    /// since negative weights would let a component flip sign, which is not
    /// a documented part of the shaping contract.
    pub fn new(kind: RewardKind, weight: f32, value: f32) -> Self {
        Self {
            kind,
            weight: weight.max(0.0),
            value,
        }
    }

    /// This component's contribution to the merged scalar, before clamping.
    pub fn contribution(&self) -> f32 {
        self.weight * self.value
    }
}

/// The merged, clamped reward delivered to the learning engine for a single
/// delivery cadence tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapedReward {
    /// The components that were merged to produce `value`.
    pub components: Vec<RewardComponent>,
    /// The merged scalar, clamped to `[-R_MAX, R_MAX]`.
    pub value: f32,
    /// The run step this reward corresponds to.
    pub step: u64,
    /// Delivery timestamp.
    pub timestamp: Time,
}

impl ShapedReward {
    /// Merge components into a clamped shaped reward.
    ///
    /// Non-finite contributions are treated as zero rather than poisoning
    /// the sum, matching the guardrail philosophy applied to weight writes:
    /// a single bad input must not corrupt an otherwise valid reward.
    pub fn shape(components: Vec<RewardComponent>, step: u64, timestamp: Time) -> Self {
        let sum: f32 = components
            .iter()
            .map(RewardComponent::contribution)
            .filter(|v| v.is_finite())
            .sum();
        let value = sum.clamp(-R_MAX, R_MAX);
        Self {
            components,
            value,
            step,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_to_r_max() {
        let components = vec![
            RewardComponent::new(RewardKind::Teacher, 10.0, 1.0),
            RewardComponent::new(RewardKind::Survival, 10.0, 1.0),
        ];
        let shaped = ShapedReward::shape(components, 0, Time::ZERO);
        assert_eq!(shaped.value, R_MAX);
    }

    #[test]
    fn clamps_to_negative_r_max() {
        let components = vec![RewardComponent::new(RewardKind::Survival, 10.0, -1.0)];
        let shaped = ShapedReward::shape(components, 0, Time::ZERO);
        assert_eq!(shaped.value, -R_MAX);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let c = RewardComponent::new(RewardKind::Task, -1.0, 1.0);
        assert_eq!(c.weight, 0.0);
        assert_eq!(c.contribution(), 0.0);
    }

    #[test]
    fn non_finite_contribution_is_ignored() {
        let components = vec![
            RewardComponent {
                kind: RewardKind::Teacher,
                weight: 0.6,
                value: f32::NAN,
            },
            RewardComponent::new(RewardKind::Survival, 0.3, 0.5),
        ];
        let shaped = ShapedReward::shape(components, 0, Time::ZERO);
        assert!(shaped.value.is_finite());
        assert_eq!(shaped.value, 0.15);
    }

    #[test]
    fn default_weights_match_spec() {
        assert_eq!(RewardKind::Teacher.default_weight(), 0.6);
        assert_eq!(RewardKind::Novelty.default_weight(), 0.1);
        assert_eq!(RewardKind::Survival.default_weight(), 0.3);
    }

    proptest! {
        #[test]
        fn shaped_reward_always_within_r_max(
            weights in prop::collection::vec(0.0f32..5.0, 4),
            values in prop::collection::vec(-5.0f32..5.0, 4),
        ) {
            let kinds = [RewardKind::Teacher, RewardKind::Novelty, RewardKind::Survival, RewardKind::Task];
            let components: Vec<RewardComponent> = kinds
                .iter()
                .zip(weights)
                .zip(values)
                .map(|((&kind, weight), value)| RewardComponent::new(kind, weight, value))
                .collect();
            let shaped = ShapedReward::shape(components, 0, Time::ZERO);
            prop_assert!(shaped.value.is_finite());
            prop_assert!(shaped.value >= -R_MAX && shaped.value <= R_MAX);
        }
    }
}
