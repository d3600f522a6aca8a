use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// The operating system's wall clock.
///
/// Readings follow NTP corrections and manual adjustments, so they can move
/// backward. Generators detect that and refuse to issue IDs until the clock
/// catches up; see [`Error::ClockRollback`](crate::Error::ClockRollback).
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_time(&self) -> Duration {
        // A clock before 1970 reads as the Unix epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}
