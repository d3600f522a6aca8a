use core::time::Duration;

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `nextid` can emit.
///
/// Construction failures are wrapped in [`Error::Config`]. Everything else is
/// a per-call outcome of generating an ID; see [`Error::is_transient`] and
/// [`Error::is_fatal`] for how callers are expected to react.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The generator could not be built from the supplied configuration.
    #[error("invalid generator configuration: {0}")]
    Config(#[from] ConfigError),

    /// The clock is behind the last issued tick and did not catch up within
    /// the configured maximum wait.
    ///
    /// `behind` is how far the clock still had to travel to reach the last
    /// issued tick when the generator gave up.
    #[error("clock moved backward; {behind:?} behind the last issued tick")]
    ClockRollback {
        /// Distance between the current clock reading and the start of the
        /// last issued tick.
        behind: Duration,
    },

    /// The current tick no longer fits into the timestamp field.
    ///
    /// The epoch/layout combination has been exhausted. This is returned on
    /// every call from then on; the instance must be reconfigured.
    #[error("timestamp tick {tick} exceeds the layout maximum of {max}")]
    TimestampOverflow {
        /// The tick derived from the current clock reading.
        tick: u64,
        /// The largest tick the timestamp field can hold.
        max: u64,
    },

    /// The caller's deadline would pass before the generator could issue an
    /// ID. No generator state was changed.
    #[error("deadline exceeded while waiting to issue an ID")]
    DeadlineExceeded,

    /// The sequence for the current tick is exhausted and the clock did not
    /// advance to the next tick within the wait budget.
    #[error("clock did not advance after waiting {waited:?}")]
    ClockStalled {
        /// Total time spent waiting inside the call.
        waited: Duration,
    },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled mutexes do not poison, and this
    /// variant is never produced.
    #[error("generator lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Returns `true` for per-call failures a caller may retry.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ClockRollback { .. } | Self::DeadlineExceeded | Self::ClockStalled { .. }
        )
    }

    /// Returns `true` when the generator instance can no longer issue IDs.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::TimestampOverflow { .. } | Self::LockPoisoned
        )
    }
}

/// Reasons a [`GeneratorConfig`](crate::GeneratorConfig) or
/// [`Layout`](crate::Layout) is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The three field widths add up to more than 63 bits.
    #[error("bit widths total {total}, at most 63 are usable")]
    LayoutTooWide {
        /// Sum of the timestamp, machine ID and sequence widths.
        total: u32,
    },

    /// The timestamp or sequence field was given zero bits.
    #[error("the {field} field needs at least one bit")]
    ZeroWidth {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The machine ID does not fit into its field.
    #[error("machine ID {machine_id} exceeds the layout maximum of {max}")]
    MachineIdOutOfRange {
        /// The configured machine ID.
        machine_id: u64,
        /// The largest machine ID the layout can hold.
        max: u64,
    },

    /// The time unit is zero.
    #[error("time unit must be greater than zero")]
    ZeroTimeUnit,

    /// The epoch is later than the clock reading at construction.
    #[error("epoch {epoch:?} is later than the current time {now:?}")]
    EpochInFuture {
        /// Configured epoch, relative to the Unix epoch.
        epoch: Duration,
        /// Clock reading at construction, relative to the Unix epoch.
        now: Duration,
    },

    /// The clock is already past the last representable tick.
    #[error("current tick {tick} is past the layout maximum of {max}")]
    EpochExhausted {
        /// The tick derived from the clock at construction.
        tick: u64,
        /// The largest tick the timestamp field can hold.
        max: u64,
    },
}

#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_recovery_policy() {
        assert!(Error::DeadlineExceeded.is_transient());
        assert!(
            Error::ClockRollback {
                behind: Duration::from_millis(5)
            }
            .is_transient()
        );
        assert!(Error::TimestampOverflow { tick: 2, max: 1 }.is_fatal());
        assert!(Error::from(ConfigError::ZeroTimeUnit).is_fatal());
        assert!(!Error::LockPoisoned.is_transient());
    }

    #[test]
    fn config_errors_render_their_context() {
        let err = Error::from(ConfigError::MachineIdOutOfRange {
            machine_id: 300,
            max: 255,
        });
        assert_eq!(
            err.to_string(),
            "invalid generator configuration: machine ID 300 exceeds the layout maximum of 255"
        );
    }
}
