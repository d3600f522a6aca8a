use core::time::Duration;
use std::time::Instant;

use crate::{SystemClock, TimeSource};

/// A monotonic time source anchored to the wall clock once, at construction.
///
/// This avoids wall-clock adjustments (e.g., NTP steps) while still aligning
/// readings to the Unix epoch: each reading is the wall time captured at
/// construction plus the [`Instant`] elapsed since then. Readings never go
/// backward, at the cost of drifting from the wall clock over long uptimes.
///
/// Clones share the same anchor.
#[derive(Copy, Clone, Debug)]
pub struct MonotonicClock {
    anchor_wall: Duration,
    anchor_instant: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock at the current system time.
    pub fn new() -> Self {
        Self::anchored_at(SystemClock.current_time())
    }

    /// Anchors a new clock at an explicit wall time (since the Unix epoch).
    pub fn anchored_at(wall: Duration) -> Self {
        Self {
            anchor_wall: wall,
            anchor_instant: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_time(&self) -> Duration {
        self.anchor_wall + self.anchor_instant.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_never_go_backward() {
        let clock = MonotonicClock::new();
        let mut last = clock.current_time();
        for _ in 0..10_000 {
            let now = clock.current_time();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn starts_at_its_anchor() {
        let anchor = Duration::from_secs(1_700_000_000);
        let clock = MonotonicClock::anchored_at(anchor);
        let now = clock.current_time();
        assert!(now >= anchor);
        assert!(now - anchor < Duration::from_secs(5));
    }
}
