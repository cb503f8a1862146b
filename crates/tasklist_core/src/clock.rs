//! Wall-clock source for task timestamps and indicator deadlines.
//!
//! `ManualClock` only moves when told to, which keeps store and indicator
//! tests deterministic.

use std::cell::Cell;
use std::rc::Rc;

/// Millisecond wall clock.
pub trait Clock {
    /// Current time in Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock.
///
/// Clones share the same time cell, so a test can keep one handle while the
/// store owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn advance_by(&self, ms: i64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock};

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::starting_at(100);
        let handle = clock.clone();
        handle.advance_by(250);
        assert_eq!(clock.now_ms(), 350);
    }
}
