use core::future::Future;
use std::time::Instant;

use super::{SleepProvider, SnowflakeGeneratorAsyncExt};
use crate::{error::Result, id::SnowflakeId};

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for use in async applications built on Tokio.
pub struct TokioSleep;

impl SleepProvider for TokioSleep {
    type Sleep = tokio::time::Sleep;

    fn sleep_for(dur: core::time::Duration) -> Self::Sleep {
        tokio::time::sleep(dur)
    }
}

/// Tokio-flavoured shorthand for [`SnowflakeGeneratorAsyncExt`].
pub trait SnowflakeGeneratorAsyncTokioExt: SnowflakeGeneratorAsyncExt {
    /// Returns a future that resolves to the next available ID, sleeping on
    /// Tokio's timer while the generator is pending.
    ///
    /// # Errors
    ///
    /// See [`SnowflakeGeneratorAsyncExt::try_next_id_async`].
    fn next_id_async(&self) -> impl Future<Output = Result<SnowflakeId>> + Send {
        self.try_next_id_async::<TokioSleep>(None)
    }

    /// Like [`Self::next_id_async`], but resolves to
    /// [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded) rather
    /// than sleep past `deadline`.
    ///
    /// # Errors
    ///
    /// See [`SnowflakeGeneratorAsyncExt::try_next_id_async`].
    fn next_id_async_until(
        &self,
        deadline: Instant,
    ) -> impl Future<Output = Result<SnowflakeId>> + Send {
        self.try_next_id_async::<TokioSleep>(Some(deadline))
    }
}

impl<G> SnowflakeGeneratorAsyncTokioExt for G where G: SnowflakeGeneratorAsyncExt {}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::sync::Arc;

    use super::*;
    use crate::{
        AtomicSnowflakeGenerator, DEFAULT_EPOCH, Error, GeneratorConfig, Layout,
        LockSnowflakeGenerator, ManualClock, MonotonicClock, SnowflakeGenerator, TimeSource,
    };

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test]
    async fn issues_sequential_ids_within_a_tick() {
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(20));
        let config = GeneratorConfig::builder().machine_id(5).build().unwrap();
        let generator = LockSnowflakeGenerator::new(config, clock).unwrap();

        for expected in 0..3 {
            let id = generator.next_id_async().await.unwrap();
            let parts = generator.config().decompose(id);
            assert_eq!((parts.timestamp, parts.machine_id, parts.sequence), (2, 5, expected));
        }
    }

    #[tokio::test]
    async fn deadline_is_reported_without_consuming_a_sequence() {
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(70));
        let config = GeneratorConfig::builder()
            .layout(Layout::new(39, 8, 1).unwrap())
            .build()
            .unwrap();
        let generator = AtomicSnowflakeGenerator::new(config, clock.clone()).unwrap();
        generator.next_id_async().await.unwrap();
        generator.next_id_async().await.unwrap();

        let result = generator
            .next_id_async_until(Instant::now() + ms(1))
            .await;
        assert_eq!(result, Err(Error::DeadlineExceeded));

        clock.advance(ms(10));
        let id = generator.next_id_async().await.unwrap();
        assert_eq!(generator.config().decompose(id).sequence, 0);
    }

    #[tokio::test]
    async fn rollback_beyond_tolerance_fails_fast() {
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(500));
        let config = GeneratorConfig::builder().max_wait(ms(50)).build().unwrap();
        let generator = LockSnowflakeGenerator::new(config, clock.clone()).unwrap();
        generator.next_id_async().await.unwrap();

        clock.rewind(ms(200));
        let result = generator.next_id_async().await;
        assert_eq!(result, Err(Error::ClockRollback { behind: ms(200) }));
    }

    async fn exhausted_sequence_resumes_on_the_next_tick<G>()
    where
        G: SnowflakeGenerator<Time = MonotonicClock> + Sync,
    {
        let clock = MonotonicClock::new();
        let config = GeneratorConfig::builder()
            .time_unit(ms(10))
            .layout(Layout::new(39, 8, 1).unwrap())
            .build()
            .unwrap();
        let generator = G::new(config.clone(), clock).unwrap();

        let now = clock.current_time();
        tokio::time::sleep(config.until_tick(config.tick_at(now) + 1, now)).await;
        let first = config.decompose(generator.next_id_async().await.unwrap());
        let second = config.decompose(generator.next_id_async().await.unwrap());
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!((first.sequence, second.sequence), (0, 1));

        let third = config.decompose(generator.next_id_async().await.unwrap());
        assert!(third.timestamp > second.timestamp);
        assert_eq!(third.sequence, 0);
        assert!(clock.current_time() >= config.tick_start(second.timestamp + 1));
    }

    #[tokio::test]
    async fn lock_generator_resumes_after_exhaustion() {
        exhausted_sequence_resumes_on_the_next_tick::<LockSnowflakeGenerator<MonotonicClock>>()
            .await;
    }

    #[tokio::test]
    async fn atomic_generator_resumes_after_exhaustion() {
        exhausted_sequence_resumes_on_the_next_tick::<AtomicSnowflakeGenerator<MonotonicClock>>()
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_receive_unique_ids() {
        const TASKS: usize = 16;
        const IDS_PER_TASK: usize = 4_096;

        let generator = Arc::new(
            AtomicSnowflakeGenerator::new(GeneratorConfig::default(), MonotonicClock::new())
                .unwrap(),
        );

        let handles: Vec<_> = (0..TASKS)
            .map(|_| {
                let generator = Arc::clone(&generator);
                tokio::spawn(async move {
                    let mut ids = Vec::with_capacity(IDS_PER_TASK);
                    for _ in 0..IDS_PER_TASK {
                        ids.push(generator.next_id_async().await.unwrap());
                    }
                    ids
                })
            })
            .collect();

        let mut all = Vec::with_capacity(TASKS * IDS_PER_TASK);
        for handle in handles {
            let ids = handle.await.unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            all.extend(ids);
        }
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), TASKS * IDS_PER_TASK);
    }
}
