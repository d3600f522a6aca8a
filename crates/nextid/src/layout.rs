use crate::error::ConfigError;

/// Number of bits available to the three fields. Bit 63 stays clear.
pub const USABLE_BITS: u32 = 63;

/// The bit split of a packed ID.
///
/// Fields are laid out most significant first: timestamp, machine ID,
/// sequence. The sequence occupies the low bits.
///
/// # Example
///
/// ```
/// use nextid::Layout;
///
/// let layout = Layout::new(39, 8, 16)?;
/// let raw = layout.pack(2, 5, 1);
/// let parts = layout.unpack(raw);
/// assert_eq!((parts.timestamp, parts.machine_id, parts.sequence), (2, 5, 1));
/// # Ok::<(), nextid::ConfigError>(())
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawLayout"))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    timestamp_bits: u8,
    machine_id_bits: u8,
    sequence_bits: u8,
}

/// Unchecked widths as they appear on the wire; every deserialized [`Layout`]
/// passes through [`Layout::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLayout {
    timestamp_bits: u8,
    machine_id_bits: u8,
    sequence_bits: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLayout> for Layout {
    type Error = ConfigError;

    fn try_from(raw: RawLayout) -> Result<Self, Self::Error> {
        Self::new(raw.timestamp_bits, raw.machine_id_bits, raw.sequence_bits)
    }
}

/// The three fields of a decoded ID.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parts {
    /// Time units elapsed since the epoch.
    pub timestamp: u64,
    /// The issuing generator's machine ID.
    pub machine_id: u64,
    /// Position within the tick.
    pub sequence: u64,
}

impl Default for Layout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Layout {
    /// 39 bits of timestamp, 8 bits of machine ID, 16 bits of sequence.
    ///
    /// At a 10ms time unit the timestamp field lasts roughly 174 years.
    pub const DEFAULT: Self = Self {
        timestamp_bits: 39,
        machine_id_bits: 8,
        sequence_bits: 16,
    };

    /// The Twitter split: 41 bits of timestamp, 10 bits of machine ID, 12 bits
    /// of sequence. Intended for a 1ms time unit.
    pub const TWITTER: Self = Self {
        timestamp_bits: 41,
        machine_id_bits: 10,
        sequence_bits: 12,
    };

    /// Creates a layout from explicit widths.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroWidth`] if the timestamp or sequence width is zero.
    ///   The machine ID may take zero bits for single-instance deployments.
    /// - [`ConfigError::LayoutTooWide`] if the widths total more than
    ///   [`USABLE_BITS`].
    pub const fn new(
        timestamp_bits: u8,
        machine_id_bits: u8,
        sequence_bits: u8,
    ) -> Result<Self, ConfigError> {
        if timestamp_bits == 0 {
            return Err(ConfigError::ZeroWidth { field: "timestamp" });
        }
        if sequence_bits == 0 {
            return Err(ConfigError::ZeroWidth { field: "sequence" });
        }
        let total = timestamp_bits as u32 + machine_id_bits as u32 + sequence_bits as u32;
        if total > USABLE_BITS {
            return Err(ConfigError::LayoutTooWide { total });
        }
        Ok(Self {
            timestamp_bits,
            machine_id_bits,
            sequence_bits,
        })
    }

    /// Skips the width checks.
    #[cfg(test)]
    pub(crate) const fn unchecked(
        timestamp_bits: u8,
        machine_id_bits: u8,
        sequence_bits: u8,
    ) -> Self {
        Self {
            timestamp_bits,
            machine_id_bits,
            sequence_bits,
        }
    }

    pub const fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    pub const fn machine_id_bits(&self) -> u8 {
        self.machine_id_bits
    }

    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    /// Returns the maximum possible value for the timestamp field.
    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits)
    }

    /// Returns the maximum possible value for the machine ID field.
    pub const fn max_machine_id(&self) -> u64 {
        mask(self.machine_id_bits)
    }

    /// Returns the maximum possible value for the sequence field.
    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    /// Number of bits to shift the timestamp to its position.
    pub const fn timestamp_shift(&self) -> u32 {
        self.machine_id_bits as u32 + self.sequence_bits as u32
    }

    /// Number of bits to shift the machine ID to its position.
    pub const fn machine_id_shift(&self) -> u32 {
        self.sequence_bits as u32
    }

    /// Packs the three fields into a raw ID. Out-of-range inputs are masked to
    /// their field width.
    pub const fn pack(&self, timestamp: u64, machine_id: u64, sequence: u64) -> u64 {
        let timestamp = (timestamp & self.max_timestamp()) << self.timestamp_shift();
        let machine_id = (machine_id & self.max_machine_id()) << self.machine_id_shift();
        let sequence = sequence & self.max_sequence();
        timestamp | machine_id | sequence
    }

    /// Splits a raw ID into its fields. Exact inverse of [`Self::pack`] for
    /// in-range inputs.
    pub const fn unpack(&self, raw: u64) -> Parts {
        Parts {
            timestamp: (raw >> self.timestamp_shift()) & self.max_timestamp(),
            machine_id: (raw >> self.machine_id_shift()) & self.max_machine_id(),
            sequence: raw & self.max_sequence(),
        }
    }
}

const fn mask(bits: u8) -> u64 {
    match 1u64.checked_shl(bits as u32) {
        Some(bound) => bound - 1,
        None => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_masks_and_shifts() {
        let layout = Layout::DEFAULT;
        assert_eq!(layout.max_timestamp(), (1 << 39) - 1);
        assert_eq!(layout.max_machine_id(), 255);
        assert_eq!(layout.max_sequence(), 65_535);
        assert_eq!(layout.timestamp_shift(), 24);
        assert_eq!(layout.machine_id_shift(), 16);
    }

    #[test]
    fn pack_places_fields_most_significant_first() {
        let layout = Layout::DEFAULT;
        let raw = layout.pack(2, 5, 3);
        assert_eq!(raw, (2 << 24) | (5 << 16) | 3);
    }

    #[test]
    fn unpack_inverts_pack_at_field_extremes() {
        for layout in [Layout::DEFAULT, Layout::TWITTER, Layout::new(1, 0, 62).unwrap()] {
            let parts = Parts {
                timestamp: layout.max_timestamp(),
                machine_id: layout.max_machine_id(),
                sequence: layout.max_sequence(),
            };
            let raw = layout.pack(parts.timestamp, parts.machine_id, parts.sequence);
            assert_eq!(raw >> 63, 0, "reserved bit must stay clear");
            assert_eq!(layout.unpack(raw), parts);
        }
    }

    #[test]
    fn pack_masks_out_of_range_fields() {
        let layout = Layout::DEFAULT;
        let raw = layout.pack(0, 256, 0);
        assert_eq!(layout.unpack(raw).machine_id, 0);
    }

    #[test]
    fn rejects_invalid_widths() {
        assert_eq!(
            Layout::new(40, 8, 16),
            Err(ConfigError::LayoutTooWide { total: 64 })
        );
        assert_eq!(
            Layout::new(0, 8, 16),
            Err(ConfigError::ZeroWidth { field: "timestamp" })
        );
        assert_eq!(
            Layout::new(39, 8, 0),
            Err(ConfigError::ZeroWidth { field: "sequence" })
        );
        assert!(Layout::new(47, 0, 16).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_enforces_the_width_rules() {
        let too_wide = r#"{"timestamp_bits":40,"machine_id_bits":8,"sequence_bits":16}"#;
        let err = serde_json::from_str::<Layout>(too_wide).unwrap_err();
        assert!(err.to_string().contains("64"), "{err}");

        let oversized = r#"{"timestamp_bits":1,"machine_id_bits":0,"sequence_bits":64}"#;
        assert!(serde_json::from_str::<Layout>(oversized).is_err());

        let zero = r#"{"timestamp_bits":0,"machine_id_bits":8,"sequence_bits":16}"#;
        assert!(serde_json::from_str::<Layout>(zero).is_err());

        let json = serde_json::to_string(&Layout::TWITTER).unwrap();
        assert_eq!(serde_json::from_str::<Layout>(&json).unwrap(), Layout::TWITTER);
    }

    #[test]
    fn masks_saturate_for_full_width_fields() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(63), u64::MAX >> 1);
        assert_eq!(mask(64), u64::MAX);
    }
}
