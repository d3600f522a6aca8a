use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::GeneratorConfig,
    error::Result,
    generator::{
        IdGenStatus, Mutex, SnowflakeGenerator,
        state::{self, Step, TickState},
    },
    time::{SystemClock, TimeSource},
};

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued tick and sequence live behind a single [`Mutex`]. The clock
/// is read *inside* the critical section, so the read-compare-commit sequence
/// is one atomic unit and the order in which callers take the lock is the
/// order of the IDs they receive.
///
/// Cloning shares the underlying state: clones are handles to the same
/// generator, not independent generators.
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access across threads is important
///
/// ## See Also
/// - [`AtomicSnowflakeGenerator`]
///
/// [`AtomicSnowflakeGenerator`]: crate::AtomicSnowflakeGenerator
pub struct LockSnowflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<Option<TickState>>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<Option<TickState>>>,
    pub(crate) config: GeneratorConfig,
    pub(crate) time: T,
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockSnowflakeGenerator`] that has not issued any IDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the epoch is later
    /// than the clock's current reading or the clock is already past the
    /// layout's last tick.
    ///
    /// # Example
    /// ```
    /// use nextid::{GeneratorConfig, LockSnowflakeGenerator, SnowflakeGeneratorExt, SystemClock};
    ///
    /// let config = GeneratorConfig::builder().machine_id(5).build()?;
    /// let generator = LockSnowflakeGenerator::new(config, SystemClock)?;
    /// let first = generator.next_id()?;
    /// let second = generator.next_id()?;
    /// assert!(first < second);
    /// # Ok::<(), nextid::Error>(())
    /// ```
    pub fn new(config: GeneratorConfig, time: T) -> Result<Self> {
        config.validate(time.current_time())?;
        #[cfg(feature = "tracing")]
        tracing::debug!(?config, "lock generator ready");
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(None))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(None)),
            config,
            time,
        })
    }

    /// Attempts to generate the next ID without waiting.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: A new ID is available
    /// - `Ok(IdGenStatus::Pending { yield_for, cause })`: The sequence is
    ///   exhausted or the clock is behind; nothing was changed
    /// - `Err(e)`: the timestamp overflowed or the lock was poisoned
    ///
    /// # Errors
    /// - [`Error::TimestampOverflow`](crate::Error::TimestampOverflow)
    /// - [`Error::LockPoisoned`](crate::Error::LockPoisoned) (std mutex only)
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let mut last_issued = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let now = self.time.current_time();
        let tick = self.config.checked_tick_at(now)?;

        match state::step(*last_issued, tick, self.config.layout().max_sequence()) {
            Step::Issue(next) => {
                *last_issued = Some(next);
                Ok(IdGenStatus::Ready {
                    id: self.config.pack(next.tick, next.sequence),
                })
            }
            Step::Exhausted { last } => Ok(state::exhausted(&self.config, last, now)),
            Step::Behind { last, now: tick } => {
                Ok(state::clock_behind(&self.config, last, tick, now))
            }
        }
    }
}

impl<T> Clone for LockSnowflakeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
            time: self.time.clone(),
        }
    }
}

impl<T> SnowflakeGenerator for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    type Time = T;

    fn new(config: GeneratorConfig, time: T) -> Result<Self> {
        Self::new(config, time)
    }

    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.try_poll_id()
    }
}
