//! Half-open ranges of bits.

use crate::bit_location::BitLocation;
use std::fmt;

/// The range `[start, end)` of a binary document, used for selections and deletable ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitRange {
    start: BitLocation,
    end: BitLocation,
}

impl BitRange {
    /// Create a range between two locations, in either order.
    pub fn new(a: BitLocation, b: BitLocation) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// The whole bytes `[offset, offset + length)`.
    pub fn from_bytes(offset: u64, length: u64) -> Self {
        Self {
            start: BitLocation::at_byte(offset),
            end: BitLocation::at_byte(offset.saturating_add(length)),
        }
    }

    /// An empty range at `location`.
    pub fn empty(location: BitLocation) -> Self {
        Self {
            start: location,
            end: location,
        }
    }

    /// Inclusive start.
    pub fn start(&self) -> BitLocation {
        self.start
    }

    /// Exclusive end.
    pub fn end(&self) -> BitLocation {
        self.end
    }

    /// Returns `true` if the range covers no bits.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of bytes touched by the range, counting partially covered ones.
    pub fn byte_length(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.end.align_up().byte_index() - self.start.byte_index()
    }

    /// Returns `true` if `location` lies in `[start, end)`.
    pub fn contains(&self, location: BitLocation) -> bool {
        self.start <= location && location < self.end
    }

    /// Returns `true` if `other` lies completely inside this range.
    pub fn contains_range(&self, other: &BitRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the ranges share at least one bit.
    pub fn overlaps(&self, other: &BitRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The common part of both ranges, if they share at least one bit.
    pub fn intersect(&self, other: &BitRange) -> Option<BitRange> {
        self.overlaps(other).then(|| BitRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// The smallest byte-aligned range covering this one.
    pub fn align_to_bytes(&self) -> BitRange {
        BitRange {
            start: self.start.align_down(),
            end: self.end.align_up(),
        }
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(byte: u64, bit: u8) -> BitLocation {
        BitLocation::new(byte, bit).unwrap()
    }

    #[test]
    fn test_new_orders_endpoints() {
        let range = BitRange::new(loc(4, 0), loc(1, 4));
        assert_eq!(range.start(), loc(1, 4));
        assert_eq!(range.end(), loc(4, 0));
        assert_eq!(range.byte_length(), 3);
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = BitRange::from_bytes(2, 2);
        assert!(range.contains(loc(2, 0)));
        assert!(range.contains(loc(3, 7)));
        assert!(!range.contains(loc(4, 0)));
        assert!(range.contains_range(&BitRange::from_bytes(3, 1)));
        assert!(range.contains_range(&BitRange::empty(loc(4, 0))));
    }

    #[test]
    fn test_intersection() {
        let a = BitRange::from_bytes(0, 4);
        let b = BitRange::new(loc(3, 4), loc(8, 0));
        assert_eq!(a.intersect(&b), Some(BitRange::new(loc(3, 4), loc(4, 0))));
        assert_eq!(b.intersect(&a), a.intersect(&b));
        assert_eq!(a.intersect(&BitRange::from_bytes(4, 1)), None);
    }

    #[test]
    fn test_align_to_bytes() {
        let range = BitRange::new(loc(1, 4), loc(3, 4));
        assert_eq!(range.align_to_bytes(), BitRange::from_bytes(1, 3));
        assert_eq!(BitRange::empty(loc(2, 0)).align_to_bytes().byte_length(), 0);
        assert_eq!(range.to_string(), "[1:4, 3:4)");
    }
}
