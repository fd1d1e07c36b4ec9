// Interval Store Domain Model

use super::error::{DomainError, Result};
use serde::Serialize;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default minutes between dispatch cycles
pub const DEFAULT_INTERVAL_MINUTES: u64 = 10;

/// Positive number of minutes between dispatch cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IntervalMinutes(NonZeroU64);

impl IntervalMinutes {
    pub fn new(minutes: u64) -> Result<Self> {
        NonZeroU64::new(minutes)
            .map(Self)
            .ok_or(DomainError::IntervalNonPositive(0))
    }

    /// Parse a user-supplied argument.
    ///
    /// Surrounding whitespace is ignored. Anything that is not an integer
    /// (including a missing argument or a value too large to represent) is
    /// "not a number"; zero and negatives are "non-positive".
    pub fn parse(arg: Option<&str>) -> Result<Self> {
        let raw = arg.map(str::trim).unwrap_or_default();
        let value: i64 = raw
            .parse()
            .map_err(|_| DomainError::IntervalNotANumber(raw.to_string()))?;

        if value <= 0 {
            return Err(DomainError::IntervalNonPositive(value));
        }
        Self::new(value as u64)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Wall-clock length of one interval, `minutes * unit`
    pub fn to_duration(self, unit: Duration) -> Duration {
        unit.saturating_mul(u32::try_from(self.get()).unwrap_or(u32::MAX))
    }
}

impl Default for IntervalMinutes {
    fn default() -> Self {
        Self(NonZeroU64::MIN.saturating_add(DEFAULT_INTERVAL_MINUTES - 1))
    }
}

impl fmt::Display for IntervalMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared, atomically replaceable interval.
///
/// Backed by a single `AtomicU64` so a read always sees a whole value, either
/// the one before or the one after a concurrent write.
#[derive(Debug)]
pub struct IntervalStore {
    minutes: AtomicU64,
}

impl IntervalStore {
    pub fn new(initial: IntervalMinutes) -> Self {
        Self {
            minutes: AtomicU64::new(initial.get()),
        }
    }

    pub fn current(&self) -> IntervalMinutes {
        // Only `new` and `replace` write, and both take a non-zero value
        let raw = self.minutes.load(Ordering::Acquire);
        IntervalMinutes(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Swap in a new interval, returning the previous one
    pub fn replace(&self, next: IntervalMinutes) -> IntervalMinutes {
        let prev = self.minutes.swap(next.get(), Ordering::AcqRel);
        IntervalMinutes(NonZeroU64::new(prev).unwrap_or(NonZeroU64::MIN))
    }
}

impl Default for IntervalStore {
    fn default() -> Self {
        Self::new(IntervalMinutes::default())
    }
}
