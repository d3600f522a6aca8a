//! Snowflake-style 64-bit identifiers.
//!
//! An ID packs three fields, most significant first: a timestamp counted in
//! configurable time units since an epoch, a machine ID, and a per-tick
//! sequence. Bit 63 is never set, so every ID is also a valid non-negative
//! `i64`.
//!
//! ```text
//!  Bit Index:  63           63 62            24 23             16 15             0
//!              +--------------+----------------+-----------------+---------------+
//!  Field:      | reserved (1) | timestamp (39) |  machine ID (8) | sequence (16) |
//!              +--------------+----------------+-----------------+---------------+
//!              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
//! ```
//!
//! The widths above are the [`Layout::DEFAULT`]; any split totalling at most 63
//! bits is accepted.
//!
//! ```
//! use core::time::Duration;
//! use nextid::{GeneratorConfig, LockSnowflakeGenerator, ManualClock, SnowflakeGenerator, SnowflakeGeneratorExt, DEFAULT_EPOCH};
//!
//! let clock = ManualClock::at(DEFAULT_EPOCH + Duration::from_millis(20));
//! let config = GeneratorConfig::builder().machine_id(5).build()?;
//! let generator = LockSnowflakeGenerator::new(config, clock)?;
//!
//! let id = generator.next_id()?;
//! let parts = generator.config().decompose(id);
//! assert_eq!((parts.timestamp, parts.machine_id, parts.sequence), (2, 5, 0));
//! # Ok::<(), nextid::Error>(())
//! ```

mod config;
mod error;
#[cfg(feature = "async-tokio")]
mod futures;
mod generator;
mod id;
mod layout;
mod time;

pub use crate::config::*;
pub use crate::error::*;
#[cfg(feature = "async-tokio")]
pub use crate::futures::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::layout::*;
pub use crate::time::*;
