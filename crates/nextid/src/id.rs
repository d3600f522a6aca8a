use core::fmt;

use crate::layout::{Layout, Parts};

/// A packed 64-bit Snowflake-style identifier.
///
/// The value itself carries no layout; decode it with the [`Layout`] of the
/// generator that issued it. Ordering is plain integer ordering, which is
/// time ordering for IDs from one generator.
///
/// With the `serde` feature the ID serializes as a bare integer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Converts a raw integer into an ID.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Converts this ID into its raw integer representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Builds an ID from its fields.
    pub const fn from_components(
        layout: &Layout,
        timestamp: u64,
        machine_id: u64,
        sequence: u64,
    ) -> Self {
        Self::from_raw(layout.pack(timestamp, machine_id, sequence))
    }

    /// Splits this ID into its fields according to `layout`.
    pub const fn decompose(&self, layout: &Layout) -> Parts {
        layout.unpack(self.id)
    }

    /// Returns the ID as a signed integer. Lossless because bit 63 is never
    /// set by a generator.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Returns the ID as a zero-padded, 20-digit decimal string so that
    /// lexicographic order matches numeric order.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &self.id)
            .field("padded", &self.to_padded_string())
            .finish()
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_round_trip_through_layout() {
        let layout = Layout::DEFAULT;
        let id = SnowflakeId::from_components(&layout, 1_234_567, 42, 65_535);
        let parts = id.decompose(&layout);
        assert_eq!(parts.timestamp, 1_234_567);
        assert_eq!(parts.machine_id, 42);
        assert_eq!(parts.sequence, 65_535);
    }

    #[test]
    fn padded_string_sorts_like_the_integer() {
        let small = SnowflakeId::from_raw(9);
        let large = SnowflakeId::from_raw(10);
        assert_eq!(small.to_padded_string(), "00000000000000000009");
        assert!(small.to_padded_string() < large.to_padded_string());
        assert_eq!(large.to_string(), "10");
    }

    #[test]
    fn signed_view_is_lossless() {
        let layout = Layout::DEFAULT;
        let id = SnowflakeId::from_components(
            &layout,
            layout.max_timestamp(),
            layout.max_machine_id(),
            layout.max_sequence(),
        );
        assert!(id.to_i64() > 0);
        assert_eq!(id.to_i64() as u64, id.to_raw());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_bare_integer() {
        let id = SnowflakeId::from_raw(33_619_968);
        assert_eq!(serde_json::to_string(&id).unwrap(), "33619968");
        let back: SnowflakeId = serde_json::from_str("33619968").unwrap();
        assert_eq!(back, id);
    }
}
