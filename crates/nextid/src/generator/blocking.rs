use std::time::Instant;

use crate::{
    error::Result,
    generator::{IdGenStatus, SnowflakeGenerator, WaitBudget},
    id::SnowflakeId,
};

/// Blocking ID generation on top of [`SnowflakeGenerator::try_poll_id`].
///
/// Pending polls are turned into short thread sleeps. Every wait is bounded by
/// the generator's [`max_wait`](crate::GeneratorConfig::max_wait), and
/// optionally by a caller deadline. A call that gives up leaves the generator
/// state exactly as it found it.
pub trait SnowflakeGeneratorExt: SnowflakeGenerator {
    /// Generates the next ID, sleeping through sequence exhaustion and small
    /// clock rollbacks.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRollback`](crate::Error::ClockRollback) if the clock is
    ///   behind by more than the tolerance, or does not catch up in time.
    /// - [`Error::ClockStalled`](crate::Error::ClockStalled) if the clock never
    ///   reaches the next tick after the sequence is exhausted.
    /// - Any error from [`SnowflakeGenerator::try_poll_id`].
    fn next_id(&self) -> Result<SnowflakeId> {
        block_on_next_id(self, None)
    }

    /// Like [`Self::next_id`], but gives up with
    /// [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded) rather than
    /// sleep past `deadline`.
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`].
    fn next_id_until(&self, deadline: Instant) -> Result<SnowflakeId> {
        block_on_next_id(self, Some(deadline))
    }
}

impl<G> SnowflakeGeneratorExt for G where G: SnowflakeGenerator + ?Sized {}

fn block_on_next_id<G>(generator: &G, deadline: Option<Instant>) -> Result<SnowflakeId>
where
    G: SnowflakeGenerator + ?Sized,
{
    let budget = WaitBudget::new(generator.config(), deadline);
    loop {
        match generator.try_poll_id()? {
            IdGenStatus::Ready { id } => return Ok(id),
            IdGenStatus::Pending { yield_for, cause } => {
                std::thread::sleep(budget.next_sleep(yield_for, cause)?);
            }
        }
    }
}
