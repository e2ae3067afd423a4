//! Monotonic time representation shared by the runtime and storage layers.

use core::fmt;
use core::ops::{Add, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A monotonic instant, represented as nanoseconds since the start of the
/// run. Spike, reward and telemetry timestamps are all `Time` values so that
/// ordering comparisons never need a unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Time(pub u64);

impl Time {
    /// Zero time, the start of a run.
    pub const ZERO: Self = Self(0);

    /// Construct a `Time` from a nanosecond count.
    pub const fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    /// Construct a `Time` from a millisecond count.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000_000))
    }

    /// Nanoseconds since the start of the run.
    pub const fn nanos(&self) -> u64 {
        self.0
    }

    /// Milliseconds since the start of the run (truncating).
    pub const fn millis(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Elapsed time since an earlier instant, saturating at zero.
    pub fn elapsed_since(&self, earlier: Time) -> Time {
        Time(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl Add<Time> for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time(self.0.saturating_add(rhs.0))
    }
}

impl Sub<Time> for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_conversion() {
        let t = Time::from_millis(5);
        assert_eq!(t.nanos(), 5_000_000);
        assert_eq!(t.millis(), 5);
    }

    #[test]
    fn elapsed_saturates_at_zero() {
        let earlier = Time::from_millis(10);
        let later = Time::from_millis(3);
        assert_eq!(later.elapsed_since(earlier), Time::ZERO);
    }

    #[test]
    fn ordering_is_monotonic() {
        assert!(Time::from_millis(1) < Time::from_millis(2));
    }
}
