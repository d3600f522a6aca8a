use core::time::Duration;
use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};

use crate::TimeSource;

/// A clock that only moves when told to.
///
/// Useful for tests and simulations: it can be stepped forward, set to an
/// arbitrary reading, or rolled back to exercise the rollback policy. Clones
/// share the same reading, so a test can keep a handle while a generator owns
/// another.
///
/// ```
/// use core::time::Duration;
/// use nextid::{ManualClock, TimeSource};
///
/// let clock = ManualClock::at(Duration::from_millis(100));
/// let handle = clock.clone();
/// handle.rewind(Duration::from_millis(30));
/// assert_eq!(clock.current_time(), Duration::from_millis(70));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `now` (since the Unix epoch).
    pub fn at(now: Duration) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(to_nanos(now))),
        }
    }

    /// Sets the reading to `now`.
    pub fn set(&self, now: Duration) {
        self.nanos.store(to_nanos(now), Ordering::Release);
    }

    /// Moves the reading forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(to_nanos(by), Ordering::AcqRel);
    }

    /// Moves the reading backward by `by`, stopping at the Unix epoch.
    pub fn rewind(&self, by: Duration) {
        let by = to_nanos(by);
        let _ = self
            .nanos
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(by))
            });
    }
}

impl TimeSource for ManualClock {
    fn current_time(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

fn to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
