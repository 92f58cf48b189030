//! Tick-based time used by the scheduler, the debounce window and the idle hooks

use core::fmt;

/// Scheduler tick period. All tick/millisecond conversions assume it.
pub const TICK_PERIOD_MS: u32 = 1;

/// A span of scheduler ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u32);

impl Ticks {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u32::MAX);

    /// Create a span from a raw tick count
    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Create a span from milliseconds, rounding down to whole ticks
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis / TICK_PERIOD_MS)
    }

    /// Get the raw tick count
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Convert to milliseconds
    pub const fn as_millis(self) -> u32 {
        self.0.saturating_mul(TICK_PERIOD_MS)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ticks", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ticks {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ticks", self.0);
    }
}

/// A point on the scheduler's monotonic tick counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant(u64);

impl Instant {
    pub const ZERO: Self = Self(0);

    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Advance by `ticks`
    pub const fn after(self, ticks: Ticks) -> Self {
        Self(self.0.saturating_add(ticks.0 as u64))
    }

    /// Ticks from `self` until `later`, zero if `later` already passed
    pub fn until(self, later: Instant) -> Ticks {
        let delta = later.0.saturating_sub(self.0);
        Ticks(u32::try_from(delta).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Instant {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{}", self.0);
    }
}

/// How long a blocking call may suspend the calling task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Fail immediately instead of blocking
    NoWait,
    /// Block for at most this many ticks
    After(Ticks),
    /// Block until the condition holds
    Forever,
}

impl Timeout {
    /// Absolute deadline for a call made at `now`; `None` means no deadline
    pub const fn deadline(self, now: Instant) -> Option<Instant> {
        match self {
            Timeout::NoWait => Some(now),
            Timeout::After(ticks) => Some(now.after(ticks)),
            Timeout::Forever => None,
        }
    }

    pub const fn is_no_wait(self) -> bool {
        matches!(self, Timeout::NoWait | Timeout::After(Ticks(0)))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Timeout {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Timeout::NoWait => defmt::write!(fmt, "NoWait"),
            Timeout::After(ticks) => defmt::write!(fmt, "After({})", ticks),
            Timeout::Forever => defmt::write!(fmt, "Forever"),
        }
    }
}

/// Macro to create compile-time tick spans
#[macro_export]
macro_rules! ticks {
    ($value:literal ms) => {
        $crate::Ticks::from_millis($value)
    };
    ($value:literal ticks) => {
        $crate::Ticks::new($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_relative_to_now() {
        let now = Instant::from_ticks(100);
        assert_eq!(Timeout::After(Ticks(5)).deadline(now), Some(Instant::from_ticks(105)));
        assert_eq!(Timeout::NoWait.deadline(now), Some(now));
        assert_eq!(Timeout::Forever.deadline(now), None);
    }

    #[test]
    fn until_saturates_for_past_instants() {
        let now = Instant::from_ticks(10);
        assert_eq!(now.until(Instant::from_ticks(4)), Ticks::ZERO);
        assert_eq!(now.until(Instant::from_ticks(14)), Ticks(4));
    }
}
