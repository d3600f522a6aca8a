use crate::{config::GeneratorConfig, error::Result, generator::IdGenStatus, time::TimeSource};

/// A minimal interface for generating Snowflake IDs.
///
/// Implementations hold the last issued tick and sequence and advance them
/// atomically with respect to every other caller. A single call to
/// [`SnowflakeGenerator::try_poll_id`] never blocks; the
/// [`SnowflakeGeneratorExt`](crate::SnowflakeGeneratorExt) and async
/// extension traits layer bounded waiting on top.
pub trait SnowflakeGenerator {
    /// The clock this generator reads.
    type Time: TimeSource;

    /// Creates a new generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` is rejected
    /// against the clock's current reading.
    fn new(config: GeneratorConfig, time: Self::Time) -> Result<Self>
    where
        Self: Sized;

    /// The settings this generator was built with.
    fn config(&self) -> &GeneratorConfig;

    /// Attempts to generate the next ID without waiting.
    ///
    /// The returned [`IdGenStatus`] contains either:
    /// - the newly generated ID, or
    /// - how long to wait, and why, before trying again.
    ///
    /// # Errors
    ///
    /// - [`Error::TimestampOverflow`](crate::Error::TimestampOverflow) once
    ///   the clock is past the last representable tick.
    /// - [`Error::LockPoisoned`](crate::Error::LockPoisoned) if a lock-based
    ///   implementation's mutex is poisoned.
    fn try_poll_id(&self) -> Result<IdGenStatus>;
}
