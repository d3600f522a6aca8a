use core::future::Future;
use std::time::Instant;

use super::SleepProvider;
use crate::{
    error::Result,
    generator::{IdGenStatus, SnowflakeGenerator, WaitBudget},
    id::SnowflakeId,
};

/// Extension trait for asynchronously generating Snowflake IDs.
///
/// This trait enables `SnowflakeGenerator` types to yield IDs in a
/// `Future`-based context by awaiting until the generator is ready to produce
/// a new ID. It applies the same bounded waiting policy as
/// [`SnowflakeGeneratorExt`](crate::SnowflakeGeneratorExt), sleeping with the
/// given [`SleepProvider`] instead of blocking the thread.
///
/// Dropping the returned future cancels the call. The generator state is only
/// ever changed by a poll that issues an ID, so a dropped or timed-out call
/// leaves no trace.
pub trait SnowflakeGeneratorAsyncExt: SnowflakeGenerator {
    /// Returns a future that resolves to the next available ID.
    ///
    /// If the generator is not ready to issue a new ID immediately, the future
    /// sleeps for the amount of time indicated by the generator and retries.
    ///
    /// # Errors
    ///
    /// - [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded) if a
    ///   sleep would cross `deadline`.
    /// - [`Error::ClockRollback`](crate::Error::ClockRollback) and
    ///   [`Error::ClockStalled`](crate::Error::ClockStalled) as for the
    ///   blocking driver.
    /// - Any error from [`SnowflakeGenerator::try_poll_id`].
    fn try_next_id_async<S>(
        &self,
        deadline: Option<Instant>,
    ) -> impl Future<Output = Result<SnowflakeId>> + Send
    where
        S: SleepProvider;
}

impl<G> SnowflakeGeneratorAsyncExt for G
where
    G: SnowflakeGenerator + Sync,
{
    fn try_next_id_async<S>(
        &self,
        deadline: Option<Instant>,
    ) -> impl Future<Output = Result<SnowflakeId>> + Send
    where
        S: SleepProvider,
    {
        async move {
            let budget = WaitBudget::new(self.config(), deadline);
            loop {
                let dur = match self.try_poll_id()? {
                    IdGenStatus::Ready { id } => return Ok(id),
                    IdGenStatus::Pending { yield_for, cause } => {
                        budget.next_sleep(yield_for, cause)?
                    }
                };
                S::sleep_for(dur).await;
            }
        }
    }
}
