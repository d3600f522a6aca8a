use core::cmp::Ordering;
use core::time::Duration;

use crate::{
    config::GeneratorConfig,
    generator::{IdGenStatus, PendingCause},
};

/// The last issued tick and the sequence used within it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TickState {
    pub(crate) tick: u64,
    pub(crate) sequence: u64,
}

/// Outcome of advancing a [`TickState`] to a fresh clock reading.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Commit this state and issue it.
    Issue(TickState),
    /// The sequence of `last` is used up.
    Exhausted { last: u64 },
    /// The clock reads `now`, earlier than `last`.
    Behind { last: u64, now: u64 },
}

/// Computes the next state. `None` means no ID has been issued yet.
pub(crate) fn step(prev: Option<TickState>, now: u64, max_sequence: u64) -> Step {
    let Some(prev) = prev else {
        return Step::Issue(TickState {
            tick: now,
            sequence: 0,
        });
    };
    match now.cmp(&prev.tick) {
        Ordering::Greater => Step::Issue(TickState {
            tick: now,
            sequence: 0,
        }),
        Ordering::Equal if prev.sequence < max_sequence => Step::Issue(TickState {
            tick: now,
            sequence: prev.sequence + 1,
        }),
        Ordering::Equal => Step::Exhausted { last: prev.tick },
        Ordering::Less => Step::Behind {
            last: prev.tick,
            now,
        },
    }
}

/// Status for a tick whose sequence is used up: wait for the next tick.
pub(crate) fn exhausted(config: &GeneratorConfig, last: u64, now: Duration) -> IdGenStatus {
    IdGenStatus::Pending {
        yield_for: config.until_tick(last.saturating_add(1), now),
        cause: PendingCause::SequenceExhausted,
    }
}

/// Status for a clock reading behind the last issued tick: wait until the
/// clock reaches it again.
#[cold]
#[inline(never)]
pub(crate) fn clock_behind(
    config: &GeneratorConfig,
    last: u64,
    tick: u64,
    now: Duration,
) -> IdGenStatus {
    debug_assert!(last > tick);
    IdGenStatus::Pending {
        yield_for: config.until_tick(last, now),
        cause: PendingCause::ClockBehind {
            behind_ticks: last - tick,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_SEQ: u64 = 3;

    fn state(tick: u64, sequence: u64) -> TickState {
        TickState { tick, sequence }
    }

    #[test]
    fn first_id_starts_at_sequence_zero() {
        assert_eq!(step(None, 0, MAX_SEQ), Step::Issue(state(0, 0)));
        assert_eq!(step(None, 42, MAX_SEQ), Step::Issue(state(42, 0)));
    }

    #[test]
    fn same_tick_increments_sequence() {
        assert_eq!(step(Some(state(5, 0)), 5, MAX_SEQ), Step::Issue(state(5, 1)));
        assert_eq!(step(Some(state(5, 2)), 5, MAX_SEQ), Step::Issue(state(5, 3)));
    }

    #[test]
    fn same_tick_at_max_sequence_is_exhausted() {
        assert_eq!(
            step(Some(state(5, MAX_SEQ)), 5, MAX_SEQ),
            Step::Exhausted { last: 5 }
        );
    }

    #[test]
    fn newer_tick_resets_sequence() {
        assert_eq!(step(Some(state(5, MAX_SEQ)), 6, MAX_SEQ), Step::Issue(state(6, 0)));
        assert_eq!(step(Some(state(5, 1)), 90, MAX_SEQ), Step::Issue(state(90, 0)));
    }

    #[test]
    fn older_tick_is_behind() {
        assert_eq!(
            step(Some(state(5, 0)), 2, MAX_SEQ),
            Step::Behind { last: 5, now: 2 }
        );
    }

    #[test]
    fn pending_reports_wait_until_the_relevant_tick() {
        let config = GeneratorConfig::default();
        let now = config.tick_start(5) + Duration::from_millis(4);

        assert_eq!(
            exhausted(&config, 5, now),
            IdGenStatus::Pending {
                yield_for: Duration::from_millis(6),
                cause: PendingCause::SequenceExhausted,
            }
        );

        let now = config.tick_start(2) + Duration::from_millis(1);
        assert_eq!(
            clock_behind(&config, 5, 2, now),
            IdGenStatus::Pending {
                yield_for: Duration::from_millis(29),
                cause: PendingCause::ClockBehind { behind_ticks: 3 },
            }
        );
    }
}
