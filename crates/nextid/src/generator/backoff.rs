use core::time::Duration;
use std::time::Instant;

use crate::{
    config::GeneratorConfig,
    error::{Error, Result},
    generator::PendingCause,
};

/// Shortest sleep between polls, so a zero hint does not turn into a hot spin.
pub(crate) const MIN_BACKOFF: Duration = Duration::from_micros(50);

/// Tracks how long one call has been waiting and decides whether it may keep
/// waiting.
///
/// Rollback policy: a clock that is further behind than `max_wait` fails fast
/// with [`Error::ClockRollback`]. A smaller rollback is waited out, but the
/// call gives up with the same error once its total wait reaches `max_wait`.
/// An exhausted sequence is waited out for at most `max_wait` plus one time
/// unit before the call fails with [`Error::ClockStalled`].
#[derive(Debug)]
pub(crate) struct WaitBudget {
    started: Instant,
    max_wait: Duration,
    time_unit: Duration,
    deadline: Option<Instant>,
}

impl WaitBudget {
    pub(crate) fn new(config: &GeneratorConfig, deadline: Option<Instant>) -> Self {
        Self {
            started: Instant::now(),
            max_wait: config.max_wait(),
            time_unit: config.time_unit(),
            deadline,
        }
    }

    /// Returns how long to sleep before polling again, or the error that ends
    /// the call.
    pub(crate) fn next_sleep(&self, yield_for: Duration, cause: PendingCause) -> Result<Duration> {
        let waited = self.started.elapsed();
        match cause {
            PendingCause::ClockBehind { .. } => {
                if yield_for > self.max_wait || waited >= self.max_wait {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(?cause, ?yield_for, ?waited, "clock rollback exceeds tolerance");
                    return Err(Error::ClockRollback { behind: yield_for });
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(?cause, ?yield_for, "clock behind last issued tick, waiting");
            }
            PendingCause::SequenceExhausted => {
                if waited >= self.max_wait + self.time_unit {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(?waited, "clock stalled while sequence exhausted");
                    return Err(Error::ClockStalled { waited });
                }
                #[cfg(feature = "tracing")]
                tracing::trace!(?yield_for, "sequence exhausted, waiting for next tick");
            }
        }

        let sleep = yield_for.max(MIN_BACKOFF);
        if let Some(deadline) = self.deadline {
            if Instant::now() + sleep > deadline {
                return Err(Error::DeadlineExceeded);
            }
        }
        Ok(sleep)
    }
}
