use core::time::Duration;

use crate::{
    error::{ConfigError, Error, Result},
    id::SnowflakeId,
    layout::{Layout, Parts},
    time::DEFAULT_EPOCH,
};

/// Default granularity of the timestamp field.
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_millis(10);

/// Default upper bound on how long a single call may block.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(1);

/// Immutable settings of one generator instance.
///
/// Build one with [`GeneratorConfig::builder`]. Static checks happen in
/// [`GeneratorConfigBuilder::build`]; checks that need a clock reading (epoch
/// in the future, epoch range already exhausted) happen when a generator is
/// constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    epoch: Duration,
    machine_id: u64,
    time_unit: Duration,
    layout: Layout,
    max_wait: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            machine_id: 0,
            time_unit: DEFAULT_TIME_UNIT,
            layout: Layout::DEFAULT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl GeneratorConfig {
    /// Starts a builder seeded with the defaults: [`DEFAULT_EPOCH`], machine
    /// ID 0, [`DEFAULT_TIME_UNIT`], [`Layout::DEFAULT`] and
    /// [`DEFAULT_MAX_WAIT`].
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }

    /// The reference instant, as a duration since the Unix epoch.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    pub const fn machine_id(&self) -> u64 {
        self.machine_id
    }

    pub const fn time_unit(&self) -> Duration {
        self.time_unit
    }

    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Clock-rollback tolerance, and the bound on any single call's blocking
    /// time.
    pub const fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Checks the settings against a clock reading taken at construction.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self, now: Duration) -> Result<(), ConfigError> {
        self.validate_static()?;
        if self.epoch > now {
            return Err(ConfigError::EpochInFuture {
                epoch: self.epoch,
                now,
            });
        }
        let tick = self.tick_at(now);
        let max = self.layout.max_timestamp();
        if tick > max {
            return Err(ConfigError::EpochExhausted { tick, max });
        }
        Ok(())
    }

    fn validate_static(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        Layout::new(
            layout.timestamp_bits(),
            layout.machine_id_bits(),
            layout.sequence_bits(),
        )?;
        if self.time_unit.is_zero() {
            return Err(ConfigError::ZeroTimeUnit);
        }
        let max = self.layout.max_machine_id();
        if self.machine_id > max {
            return Err(ConfigError::MachineIdOutOfRange {
                machine_id: self.machine_id,
                max,
            });
        }
        Ok(())
    }

    /// Converts a clock reading into a tick count since the epoch, truncating.
    ///
    /// Readings before the epoch map to tick 0.
    pub fn tick_at(&self, now: Duration) -> u64 {
        let elapsed = now.saturating_sub(self.epoch).as_nanos();
        let tick = elapsed / self.time_unit.as_nanos();
        u64::try_from(tick).unwrap_or(u64::MAX)
    }

    /// Like [`Self::tick_at`], but rejects ticks the timestamp field cannot
    /// hold.
    pub(crate) fn checked_tick_at(&self, now: Duration) -> Result<u64> {
        let tick = self.tick_at(now);
        let max = self.layout.max_timestamp();
        if tick > max {
            return Err(Error::TimestampOverflow { tick, max });
        }
        Ok(tick)
    }

    /// The wall time (since the Unix epoch) at which `tick` begins.
    pub fn tick_start(&self, tick: u64) -> Duration {
        let nanos = self.epoch.as_nanos() + u128::from(tick) * self.time_unit.as_nanos();
        duration_from_nanos(nanos)
    }

    /// How long from `now` until `tick` begins; zero if it already has.
    pub(crate) fn until_tick(&self, tick: u64, now: Duration) -> Duration {
        self.tick_start(tick).saturating_sub(now)
    }

    /// Packs a tick and sequence with this generator's machine ID.
    pub const fn pack(&self, tick: u64, sequence: u64) -> SnowflakeId {
        SnowflakeId::from_components(&self.layout, tick, self.machine_id, sequence)
    }

    /// Splits an ID issued under this configuration into its fields.
    pub const fn decompose(&self, id: SnowflakeId) -> Parts {
        id.decompose(&self.layout)
    }

    /// The wall time (since the Unix epoch) at which `id`'s tick began.
    pub fn issued_at(&self, id: SnowflakeId) -> Duration {
        self.tick_start(self.decompose(id).timestamp)
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Clone, Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    /// Sets the epoch as a duration since the Unix epoch.
    pub fn epoch(mut self, epoch: Duration) -> Self {
        self.config.epoch = epoch;
        self
    }

    pub fn machine_id(mut self, machine_id: u64) -> Self {
        self.config.machine_id = machine_id;
        self
    }

    pub fn time_unit(mut self, time_unit: Duration) -> Self {
        self.config.time_unit = time_unit;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = max_wait;
        self
    }

    /// Finishes the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::LayoutTooWide`] or [`ConfigError::ZeroWidth`] if the
    ///   layout breaks the width rules of [`Layout::new`].
    /// - [`ConfigError::ZeroTimeUnit`] if the time unit is zero.
    /// - [`ConfigError::MachineIdOutOfRange`] if the machine ID does not fit
    ///   the layout.
    pub fn build(self) -> Result<GeneratorConfig, ConfigError> {
        self.config.validate_static()?;
        Ok(self.config)
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    #[allow(clippy::cast_possible_truncation)]
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    Duration::new(secs, subsec)
}
