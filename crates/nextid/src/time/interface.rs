use core::time::Duration;
use std::sync::Arc;

/// Default epoch: Wednesday, January 1, 2020 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_577_836_800_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
///
/// Pair it with [`Layout::TWITTER`](crate::Layout::TWITTER) and a 1ms time
/// unit to issue IDs in Twitter's format.
///
/// ```
/// use core::time::Duration;
/// use nextid::{
///     GeneratorConfig, Layout, LockSnowflakeGenerator, ManualClock, SnowflakeGeneratorExt,
///     TWITTER_EPOCH,
/// };
///
/// let config = GeneratorConfig::builder()
///     .epoch(TWITTER_EPOCH)
///     .time_unit(Duration::from_millis(1))
///     .layout(Layout::TWITTER)
///     .machine_id(1023)
///     .build()?;
/// let clock = ManualClock::at(TWITTER_EPOCH + Duration::from_secs(1));
/// let generator = LockSnowflakeGenerator::new(config, clock)?;
///
/// let id = generator.next_id()?;
/// assert_eq!(id.to_raw(), (1000 << 22) | (1023 << 12));
/// # Ok::<(), nextid::Error>(())
/// ```
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// A trait for time sources that return a wall-clock reading.
///
/// This abstraction allows you to plug in the system clock, a monotonic
/// timer, or a manually driven clock in tests.
///
/// Readings are the time elapsed since the Unix epoch. Generators convert them
/// into ticks relative to their own configured epoch.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use nextid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_time(&self) -> Duration {
///         Duration::from_millis(1234)
///     }
/// }
///
/// assert_eq!(FixedTime.current_time(), Duration::from_millis(1234));
/// ```
pub trait TimeSource {
    /// Returns the current time as a duration since 1970-01-01 UTC.
    fn current_time(&self) -> Duration;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_time(&self) -> Duration {
        (**self).current_time()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_time(&self) -> Duration {
        (**self).current_time()
    }
}
