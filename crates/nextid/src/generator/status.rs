use core::time::Duration;

use crate::id::SnowflakeId;

/// Represents the result of one non-blocking attempt to generate an ID.
///
/// This type models the outcome of
/// [`SnowflakeGenerator::try_poll_id`](crate::SnowflakeGenerator::try_poll_id):
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means no ID can be issued right now. The
///   generator state is untouched; retry after `yield_for`.
///
/// The blocking and async drivers turn `Pending` into bounded waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// No ID could be generated yet.
    Pending {
        /// Time until the condition in `cause` is expected to clear.
        yield_for: Duration,
        /// Why the generator is waiting.
        cause: PendingCause,
    },
}

/// Why a poll returned [`IdGenStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCause {
    /// Every sequence value of the current tick has been issued.
    SequenceExhausted,
    /// The clock reads a tick earlier than the last issued one.
    ClockBehind {
        /// Number of ticks between the clock and the last issued tick.
        behind_ticks: u64,
    },
}
