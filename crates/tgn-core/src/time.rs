//! Simulation time model.
//!
//! Time is an absolute signed count of nanoseconds since the start of the
//! run.  Integer time keeps sample-boundary arithmetic exact: the number of
//! fading samples between two instants is an integer division, never a
//! floating-point estimate.

use std::fmt;
use std::ops::{Add, Mul, Sub};

/// An absolute simulation time (or a duration) in nanoseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const NANOSECOND: SimTime = SimTime(1);
    pub const MICROSECOND: SimTime = SimTime(1_000);
    pub const MILLISECOND: SimTime = SimTime(1_000_000);
    pub const SECOND: SimTime = SimTime(1_000_000_000);

    #[inline]
    pub fn from_nanos(nanos: i64) -> SimTime {
        SimTime(nanos)
    }

    #[inline]
    pub fn from_micros(micros: i64) -> SimTime {
        SimTime(micros * Self::MICROSECOND.0)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> SimTime {
        SimTime(millis * Self::MILLISECOND.0)
    }

    /// Convert floating-point seconds, rounding to the nearest nanosecond.
    #[inline]
    pub fn from_secs_f64(secs: f64) -> SimTime {
        SimTime((secs * Self::SECOND.0 as f64).round() as i64)
    }

    #[inline]
    pub fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::SECOND.0 as f64
    }

    /// Whole `interval`s elapsed from `start` to `self` (floor division).
    ///
    /// # Panics
    /// Panics if `interval` is not positive.
    #[inline]
    pub fn intervals_since(self, start: SimTime, interval: SimTime) -> i64 {
        assert!(interval.0 > 0, "interval must be positive, got {interval}");
        (self.0 - start.0).div_euclid(interval.0)
    }
}

impl Add for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl Sub for SimTime {
    type Output = SimTime;
    #[inline]
    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 - rhs.0)
    }
}

impl Mul<i64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn mul(self, rhs: i64) -> SimTime {
        SimTime(self.0 * rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}s", self.as_secs_f64())
    }
}
