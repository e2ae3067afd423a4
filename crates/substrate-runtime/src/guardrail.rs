//! Numerical guardrail applied to every synaptic weight write.
//!
//! This is the only path through which a weight may change: clamp to
//! `[w_min, w_max]`, and if the clamped value is not finite, keep the
//! previous value and count the rejection instead of poisoning the store.

use std::sync::atomic::{AtomicU64, Ordering};

/// Clamp a candidate weight to `[w_min, w_max]`, returning `previous`
/// unchanged (and incrementing `counters`) if the result would not be
/// finite.
pub fn guard_weight(candidate: f32, previous: f32, w_min: f32, w_max: f32, counters: &GuardrailCounters) -> f32 {
    let clamped = candidate.clamp(w_min, w_max);
    if clamped.is_finite() {
        clamped
    } else {
        counters.rejections.fetch_add(1, Ordering::Relaxed);
        previous
    }
}

/// Per-run counters for guardrail activity, shared between the synapse
/// store and the checkpoint codec's weight-restoration path.
#[derive(Debug, Default)]
pub struct GuardrailCounters {
    rejections: AtomicU64,
}

impl GuardrailCounters {
    /// Construct a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rejected (non-finite) weight writes so far.
    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_within_bounds() {
        let counters = GuardrailCounters::new();
        assert_eq!(guard_weight(5.0, 0.0, 0.0, 1.0, &counters), 1.0);
        assert_eq!(guard_weight(-5.0, 0.0, 0.0, 1.0, &counters), 0.0);
        assert_eq!(counters.rejections(), 0);
    }

    #[test]
    fn rejects_non_finite_and_counts() {
        let counters = GuardrailCounters::new();
        let result = guard_weight(f32::NAN, 0.3, 0.0, 1.0, &counters);
        assert_eq!(result, 0.3);
        assert_eq!(counters.rejections(), 1);

        let result = guard_weight(f32::INFINITY, 0.3, 0.0, 1.0, &counters);
        // clamp(NaN/inf, min, max): inf.clamp(0,1) is finite (1.0) in Rust,
        // so this path actually clamps rather than rejects. NAN is the only
        // candidate that survives clamp() as non-finite.
        assert_eq!(result, 1.0);
        assert_eq!(counters.rejections(), 1);
    }
}
