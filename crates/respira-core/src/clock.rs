//! Time sources.
//!
//! The session timer never reads the wall clock directly: it asks a
//! [`Clock`] for "now" when it stamps session start/end, suspend/resume and
//! the completion cooldown. Hosts drive ticks themselves; [`Ticker`] helps a
//! frame-driven host fire at most one tick per elapsed second.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock. Clones share the same instant, so a test can keep one
/// handle and give another to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(at.timestamp_millis())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.set(self.now_ms.get() + by.num_milliseconds());
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now_ms.set(at.timestamp_millis());
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(DateTime::<Utc>::default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_ms.get())
            .single()
            .unwrap_or_default()
    }
}

/// Gate that lets through at most one tick per elapsed second.
#[derive(Debug, Clone, Default)]
pub struct Ticker {
    last_fired: Option<DateTime<Utc>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a tick should fire at `now`. The first call always
    /// fires and arms the gate.
    pub fn due(&mut self, now: DateTime<Utc>) -> bool {
        match self.last_fired {
            Some(last) if now - last < Duration::seconds(1) => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }

    /// Forget the last firing, e.g. after the timer was paused.
    pub fn rearm(&mut self) {
        self.last_fired = None;
    }
}

/// `secs` as a chrono duration, saturating at [`Duration::MAX`] where
/// chrono's range ends.
pub(crate) fn saturating_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Whole seconds between two instants, floored, never negative.
pub(crate) fn whole_seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}
