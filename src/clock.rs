//! Time sources.
//!
//! Every expiry decision reads the time through [`Clock`], so tests can
//! drive deadlines deterministically with [`ManualClock`].

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Debug + Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Monotonic clock reported as UTC.
///
/// Wall time is sampled once, at construction. Later readings add the
/// [`Instant`] elapsed since then, so a step of the system clock neither
/// stretches nor cuts short a running lock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    anchor: DateTime<Utc>,
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Utc::now(),
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        to_offset(self.started.elapsed())
            .and_then(|elapsed| self.anchor.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Clock that only moves when told to.
///
/// Time never goes backwards: [`ManualClock::advance`] takes an unsigned
/// duration and [`ManualClock::set`] ignores earlier instants.
///
/// # Example
///
/// ```rust
/// use seatlock::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::at_epoch();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(61));
/// assert_eq!((clock.now() - start).num_seconds(), 61);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Clock starting at the Unix epoch ("t = 0").
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Move time forward. Saturates instead of overflowing.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let advanced = chrono::Duration::from_std(by)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta));
        *now = advanced.unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Jump to `instant` if it is not earlier than the current time.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if instant > *now {
            *now = instant;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at_epoch()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Convert a configured interval into a chrono offset.
pub(crate) fn to_offset(duration: Duration) -> Option<chrono::Duration> {
    chrono::Duration::from_std(duration).ok()
}
