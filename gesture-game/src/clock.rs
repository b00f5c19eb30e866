//! Wall-clock abstraction so timestamps can be pinned in tests and simulations.
use chrono::{DateTime, TimeDelta, Utc};
use std::cell::Cell;

use crate::numbers::i64_to_f64;

/// Source of "now" for session stamps and statistics.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock forward by `secs` seconds (millisecond resolution).
    pub fn advance_secs(&self, secs: f64) {
        self.now.set(self.now.get() + secs_to_delta(secs));
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Seconds elapsed from `start` to `end`, never negative.
#[must_use]
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = (end - start).num_milliseconds();
    (i64_to_f64(millis) / 1000.0).max(0.0)
}

fn secs_to_delta(secs: f64) -> TimeDelta {
    if !secs.is_finite() || secs <= 0.0 {
        return TimeDelta::zero();
    }
    let millis = crate::numbers::floor_f64_to_i64((secs * 1000.0).round());
    TimeDelta::try_milliseconds(millis).unwrap_or_else(TimeDelta::zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_in_millis() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.advance_secs(1.25);
        assert!((seconds_between(start, clock.now()) - 1.25).abs() < 1e-9);
        clock.advance_secs(-5.0);
        assert!((seconds_between(start, clock.now()) - 1.25).abs() < 1e-9);
    }

    #[test]
    fn elapsed_is_never_negative() {
        let clock = ManualClock::default();
        let later = clock.now() + TimeDelta::seconds(3);
        assert!(seconds_between(later, clock.now()).abs() < f64::EPSILON);
    }
}
