use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::GeneratorConfig,
    error::Result,
    generator::{
        IdGenStatus, SnowflakeGenerator,
        state::{self, Step, TickState},
    },
    time::{SystemClock, TimeSource},
};

/// Marks "no ID issued yet". Uses the reserved top bit, which no packed ID
/// ever sets.
const UNSET: u64 = 1 << 63;

/// A lock-free Snowflake ID generator suitable for multi-threaded environments.
///
/// The last issued ID is stored in an [`AtomicU64`] and advanced with a
/// compare-and-swap loop. The last tick and sequence are decoded from that ID,
/// so the whole state changes in a single atomic write: a caller either
/// commits a complete new state or retries against the winner's state.
///
/// Cloning shares the underlying state.
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access is sacrificed for higher throughput
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::LockSnowflakeGenerator
pub struct AtomicSnowflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<AtomicU64>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<AtomicU64>,
    pub(crate) config: GeneratorConfig,
    pub(crate) time: T,
}

impl<T> AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`AtomicSnowflakeGenerator`] that has not issued any IDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the epoch is later
    /// than the clock's current reading or the clock is already past the
    /// layout's last tick.
    ///
    /// # Example
    /// ```
    /// use nextid::{AtomicSnowflakeGenerator, GeneratorConfig, MonotonicClock, SnowflakeGenerator, SnowflakeGeneratorExt};
    ///
    /// let generator = AtomicSnowflakeGenerator::new(GeneratorConfig::default(), MonotonicClock::new())?;
    /// let id = generator.next_id()?;
    /// assert_eq!(generator.config().decompose(id).machine_id, 0);
    /// # Ok::<(), nextid::Error>(())
    /// ```
    pub fn new(config: GeneratorConfig, time: T) -> Result<Self> {
        config.validate(time.current_time())?;
        #[cfg(feature = "tracing")]
        tracing::debug!(?config, "atomic generator ready");
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(AtomicU64::new(UNSET))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(AtomicU64::new(UNSET)),
            config,
            time,
        })
    }

    /// Attempts to generate the next ID without waiting.
    ///
    /// Losing a CAS race is retried internally with a fresh clock reading;
    /// only exhaustion or a clock behind the last tick yields
    /// [`IdGenStatus::Pending`].
    ///
    /// # Errors
    /// - [`Error::TimestampOverflow`](crate::Error::TimestampOverflow)
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let layout = self.config.layout();
        loop {
            let current = self.state.load(Ordering::Acquire);
            let last_issued = (current != UNSET).then(|| {
                let parts = layout.unpack(current);
                TickState {
                    tick: parts.timestamp,
                    sequence: parts.sequence,
                }
            });

            let now = self.time.current_time();
            let tick = self.config.checked_tick_at(now)?;

            match state::step(last_issued, tick, layout.max_sequence()) {
                Step::Issue(next) => {
                    let id = self.config.pack(next.tick, next.sequence);
                    let committed = self.state.compare_exchange(
                        current,
                        id.to_raw(),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    );
                    if committed.is_ok() {
                        return Ok(IdGenStatus::Ready { id });
                    }
                    // Another caller committed first; re-read its state.
                    core::hint::spin_loop();
                }
                Step::Exhausted { last } => {
                    return Ok(state::exhausted(&self.config, last, now));
                }
                Step::Behind { last, now: tick } => {
                    return Ok(state::clock_behind(&self.config, last, tick, now));
                }
            }
        }
    }
}

impl<T> Clone for AtomicSnowflakeGenerator<T>
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

impl<T> SnowflakeGenerator for AtomicSnowflakeGenerator<T>
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
