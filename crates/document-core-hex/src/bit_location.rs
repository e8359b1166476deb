//! Bit-granular locations.

use crate::error::{BinaryDocumentError, HexResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Number of bits in a byte.
pub const BITS_PER_BYTE: u8 = 8;

/// Number of bits in a nibble, one hex digit.
pub const BITS_PER_NIBBLE: u8 = 4;

/// A location inside a binary document: a byte index plus a bit offset within that byte.
///
/// Bit `0` is the most significant bit, so locations order the same way the bits are
/// displayed: the high nibble of a byte starts at bit 0, the low nibble at bit 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "(u64, u8)", into = "(u64, u8)")]
pub struct BitLocation {
    byte_index: u64,
    bit_index: u8,
}

impl BitLocation {
    /// The first bit of the first byte.
    pub const MIN: Self = Self {
        byte_index: 0,
        bit_index: 0,
    };

    /// The last bit of the last addressable byte.
    pub const MAX: Self = Self {
        byte_index: u64::MAX,
        bit_index: BITS_PER_BYTE - 1,
    };

    /// Create a location, rejecting bit indices outside `0..8`.
    pub fn new(byte_index: u64, bit_index: u8) -> HexResult<Self> {
        if bit_index >= BITS_PER_BYTE {
            return Err(BinaryDocumentError::InvalidBitIndex(bit_index));
        }
        Ok(Self {
            byte_index,
            bit_index,
        })
    }

    /// The first bit of `byte_index`.
    pub const fn at_byte(byte_index: u64) -> Self {
        Self {
            byte_index,
            bit_index: 0,
        }
    }

    /// Byte index.
    pub const fn byte_index(self) -> u64 {
        self.byte_index
    }

    /// Bit offset within the byte (`0` = most significant bit).
    pub const fn bit_index(self) -> u8 {
        self.bit_index
    }

    /// The same bit offset in another byte.
    pub const fn with_byte_index(self, byte_index: u64) -> Self {
        Self {
            byte_index,
            bit_index: self.bit_index,
        }
    }

    /// Returns `true` if the location is at the start of a byte.
    pub const fn is_byte_aligned(self) -> bool {
        self.bit_index == 0
    }

    /// Absolute bit position, if it fits into a `u64`.
    fn total_bits(self) -> Option<u64> {
        self.byte_index
            .checked_mul(u64::from(BITS_PER_BYTE))?
            .checked_add(u64::from(self.bit_index))
    }

    fn from_total_bits(bits: u64) -> Self {
        Self {
            byte_index: bits / u64::from(BITS_PER_BYTE),
            bit_index: (bits % u64::from(BITS_PER_BYTE)) as u8,
        }
    }

    /// Move forward by `bits`, saturating at [`BitLocation::MAX`].
    pub fn add_bits(self, bits: u64) -> Self {
        let bit_sum = u64::from(self.bit_index) + bits % u64::from(BITS_PER_BYTE);
        let bytes = bits / u64::from(BITS_PER_BYTE) + bit_sum / u64::from(BITS_PER_BYTE);
        match self.byte_index.checked_add(bytes) {
            Some(byte_index) => Self {
                byte_index,
                bit_index: (bit_sum % u64::from(BITS_PER_BYTE)) as u8,
            },
            None => Self::MAX,
        }
    }

    /// Move backward by `bits`, saturating at [`BitLocation::MIN`].
    pub fn subtract_bits(self, bits: u64) -> Self {
        match self.total_bits() {
            Some(total) => Self::from_total_bits(total.saturating_sub(bits)),
            // Bytes from 2^61 on have no u64 bit position, but no u64 of bits reaches below them.
            None => {
                let whole_bytes = bits / u64::from(BITS_PER_BYTE);
                let rest = (bits % u64::from(BITS_PER_BYTE)) as u8;
                let (byte_index, bit_index) = if rest > self.bit_index {
                    (
                        self.byte_index - whole_bytes - 1,
                        self.bit_index + BITS_PER_BYTE - rest,
                    )
                } else {
                    (self.byte_index - whole_bytes, self.bit_index - rest)
                };
                Self {
                    byte_index,
                    bit_index,
                }
            }
        }
    }

    /// Start of the containing byte.
    pub const fn align_down(self) -> Self {
        Self::at_byte(self.byte_index)
    }

    /// Start of the next byte unless already at the start of a byte.
    ///
    /// Saturates at the start of the last addressable byte.
    pub fn align_up(self) -> Self {
        if self.is_byte_aligned() {
            self
        } else {
            self.next_or_max()
        }
    }

    /// Start of the next byte, or the start of the last addressable byte if there is none.
    pub fn next_or_max(self) -> Self {
        Self::at_byte(self.byte_index.saturating_add(1))
    }

    /// Clamp into `[min, max]`.
    pub fn clamp_to(self, min: Self, max: Self) -> Self {
        self.max(min).min(max)
    }
}

impl Ord for BitLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.byte_index
            .cmp(&other.byte_index)
            .then_with(|| self.bit_index.cmp(&other.bit_index))
    }
}

impl PartialOrd for BitLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}:{}", self.byte_index, self.bit_index)
    }
}

impl TryFrom<(u64, u8)> for BitLocation {
    type Error = BinaryDocumentError;

    fn try_from((byte_index, bit_index): (u64, u8)) -> HexResult<Self> {
        Self::new(byte_index, bit_index)
    }
}

impl From<BitLocation> for (u64, u8) {
    fn from(location: BitLocation) -> Self {
        (location.byte_index, location.bit_index)
    }
}

impl From<u64> for BitLocation {
    fn from(byte_index: u64) -> Self {
        Self::at_byte(byte_index)
    }
}
