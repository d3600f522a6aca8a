use core::time::Duration;
use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::DateTime;
use clap::{Parser, ValueEnum};
use nextid::{GeneratorConfig, Layout};

/// Runtime configuration for the `nextid-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. The
/// generator settings are fixed for the lifetime of the process; changing
/// them means restarting with a different (non-overlapping) configuration.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nextid-server",
    version,
    about = "An HTTP service for Snowflake-style IDs"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8888"))]
    pub server_addr: String,

    /// Reference instant for the timestamp field, in RFC 3339 form.
    ///
    /// Must not be later than the current time when the server starts.
    ///
    /// Environment variable: `EPOCH`
    #[arg(long, env = "EPOCH", default_value_t = String::from("2020-01-01T00:00:00Z"))]
    pub epoch: String,

    /// Discriminator for this instance. Two instances sharing an epoch and a
    /// layout must never share a machine ID.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(long, env = "MACHINE_ID", default_value_t = 0)]
    pub machine_id: u64,

    /// Granularity of the timestamp field, in milliseconds.
    ///
    /// Environment variable: `TIME_UNIT_MS`
    #[arg(long, env = "TIME_UNIT_MS", default_value_t = 10)]
    pub time_unit_ms: u64,

    /// Width of the timestamp field, in bits.
    ///
    /// Environment variable: `TIMESTAMP_BITS`
    #[arg(long, env = "TIMESTAMP_BITS", default_value_t = 39)]
    pub timestamp_bits: u8,

    /// Width of the machine ID field, in bits.
    ///
    /// Environment variable: `MACHINE_ID_BITS`
    #[arg(long, env = "MACHINE_ID_BITS", default_value_t = 8)]
    pub machine_id_bits: u8,

    /// Width of the sequence field, in bits.
    ///
    /// Environment variable: `SEQUENCE_BITS`
    #[arg(long, env = "SEQUENCE_BITS", default_value_t = 16)]
    pub sequence_bits: u8,

    /// Clock rollback tolerance, and the upper bound on how long one ID may
    /// wait on the clock, in milliseconds.
    ///
    /// Environment variable: `MAX_WAIT_MS`
    #[arg(long, env = "MAX_WAIT_MS", default_value_t = 1000)]
    pub max_wait_ms: u64,

    /// Per-request deadline, in milliseconds. A request that would have to
    /// wait past it fails instead.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 500)]
    pub request_timeout_ms: u64,

    /// Generator implementation.
    ///
    /// Environment variable: `GENERATOR`
    #[arg(long, env = "GENERATOR", value_enum, default_value_t = GeneratorKind::Lock)]
    pub generator: GeneratorKind,

    /// Time source.
    ///
    /// Environment variable: `CLOCK`
    #[arg(long, env = "CLOCK", value_enum, default_value_t = ClockKind::System)]
    pub clock: ClockKind,

    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    /// Mutex-guarded state; fair under contention.
    Lock,
    /// Lock-free compare-and-swap on a single word.
    Atomic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Reads the wall clock on every call.
    System,
    /// Wall clock sampled once at startup, advanced by a monotonic timer.
    Monotonic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub generator: GeneratorConfig,
    pub request_timeout: Duration,
    pub generator_kind: GeneratorKind,
    pub clock_kind: ClockKind,
    pub log_format: LogFormat,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_addr = args.server_addr.parse().with_context(|| {
            format!("SERVER_ADDR ({}) is not a socket address", args.server_addr)
        })?;

        let epoch = DateTime::parse_from_rfc3339(&args.epoch)
            .with_context(|| format!("EPOCH ({}) is not an RFC 3339 timestamp", args.epoch))?;
        let Ok(epoch_ms) = u64::try_from(epoch.timestamp_millis()) else {
            bail!("EPOCH ({}) precedes the Unix epoch", args.epoch);
        };

        if args.time_unit_ms == 0 {
            bail!("TIME_UNIT_MS must be greater than 0");
        }
        if args.request_timeout_ms == 0 {
            bail!("REQUEST_TIMEOUT_MS must be greater than 0");
        }

        let layout = Layout::new(args.timestamp_bits, args.machine_id_bits, args.sequence_bits)
            .context("invalid bit layout")?;
        let generator = GeneratorConfig::builder()
            .epoch(Duration::from_millis(epoch_ms))
            .machine_id(args.machine_id)
            .time_unit(Duration::from_millis(args.time_unit_ms))
            .layout(layout)
            .max_wait(Duration::from_millis(args.max_wait_ms))
            .build()
            .context("invalid generator configuration")?;

        Ok(Self {
            server_addr,
            generator,
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            generator_kind: args.generator,
            clock_kind: args.clock,
            log_format: args.log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextid::DEFAULT_EPOCH;

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = std::iter::once("nextid-server").chain(extra.iter().copied());
        let args = CliArgs::try_parse_from(argv)?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn defaults_match_the_library_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8888".parse().unwrap());
        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.generator.epoch(), DEFAULT_EPOCH);
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        assert_eq!(config.generator_kind, GeneratorKind::Lock);
        assert_eq!(config.clock_kind, ClockKind::System);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--machine-id",
            "1023",
            "--timestamp-bits",
            "41",
            "--machine-id-bits",
            "10",
            "--sequence-bits",
            "12",
            "--time-unit-ms",
            "1",
            "--generator",
            "atomic",
            "--clock",
            "monotonic",
        ])
        .unwrap();
        assert_eq!(config.generator.machine_id(), 1023);
        assert_eq!(config.generator.layout(), &Layout::TWITTER);
        assert_eq!(config.generator.time_unit(), Duration::from_millis(1));
        assert_eq!(config.generator_kind, GeneratorKind::Atomic);
        assert_eq!(config.clock_kind, ClockKind::Monotonic);
    }

    #[test]
    fn epoch_accepts_offsets() {
        let config = parse(&["--epoch", "2020-01-01T01:00:00+01:00"]).unwrap();
        assert_eq!(config.generator.epoch(), DEFAULT_EPOCH);
    }

    #[test]
    fn rejects_malformed_epoch() {
        assert!(parse(&["--epoch", "yesterday"]).is_err());
        assert!(parse(&["--epoch", "1969-12-31T23:59:59Z"]).is_err());
    }

    #[test]
    fn rejects_machine_id_outside_its_field() {
        assert!(parse(&["--machine-id", "256"]).is_err());
    }

    #[test]
    fn rejects_layout_wider_than_63_bits() {
        assert!(parse(&["--timestamp-bits", "40"]).is_err());
    }

    #[test]
    fn rejects_zero_durations() {
        assert!(parse(&["--time-unit-ms", "0"]).is_err());
        assert!(parse(&["--request-timeout-ms", "0"]).is_err());
    }
}
