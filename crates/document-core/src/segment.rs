//! Half-open offset ranges.
//!
//! Everything that refers to a stretch of text (lines, text segments, search results,
//! deletable regions) is described as `[offset, offset + length)` in character offsets.

use serde::{Deserialize, Serialize};

/// A value that describes a half-open range of characters.
pub trait Segment {
    /// Start offset of the range.
    fn offset(&self) -> usize;

    /// Number of characters covered by the range.
    fn length(&self) -> usize;

    /// Exclusive end offset.
    fn end_offset(&self) -> usize {
        self.offset() + self.length()
    }

    /// Returns `true` if `other` lies entirely inside this range.
    ///
    /// Boundaries are inclusive on both sides, so an empty range at `end_offset()` is contained.
    fn contains_segment(&self, other: &dyn Segment) -> bool {
        self.offset() <= other.offset() && other.end_offset() <= self.end_offset()
    }

    /// Returns `true` if `offset` is a valid caret position inside (or at the edges of) the range.
    fn contains_offset(&self, offset: usize) -> bool {
        self.offset() <= offset && offset <= self.end_offset()
    }

    /// Converts to a plain [`SimpleSegment`].
    fn to_simple(&self) -> SimpleSegment {
        SimpleSegment::new(self.offset(), self.length())
    }
}

/// An immutable `(offset, length)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SimpleSegment {
    /// Start offset.
    pub offset: usize,
    /// Length in characters.
    pub length: usize,
}

impl SimpleSegment {
    /// Create a segment from an offset and a length.
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Create a segment from a start and an exclusive end offset.
    ///
    /// `end` smaller than `start` yields an empty segment at `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            offset: start,
            length: end.saturating_sub(start),
        }
    }

    /// Exclusive end offset.
    pub const fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Returns `true` if the segment covers no characters.
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the intersection of two segments.
    ///
    /// Touching segments overlap in an empty segment at the shared boundary, as long as the
    /// boundary belongs to both: `(10, 10)` and `(9, 1)` overlap in `(10, 0)`, while `(10, 10)`
    /// and `(9, 0)` do not overlap at all and yield `None`.
    pub fn overlap(&self, other: &dyn Segment) -> Option<SimpleSegment> {
        let start = self.offset.max(other.offset());
        let end = self.end_offset().min(other.end_offset());
        if end < start {
            None
        } else {
            Some(SimpleSegment::new(start, end - start))
        }
    }

    /// Returns `true` if [`SimpleSegment::overlap`] would return a segment.
    pub fn overlaps(&self, other: &dyn Segment) -> bool {
        self.overlap(other).is_some()
    }
}

impl Segment for SimpleSegment {
    fn offset(&self) -> usize {
        self.offset
    }

    fn length(&self) -> usize {
        self.length
    }
}

impl From<std::ops::Range<usize>> for SimpleSegment {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::from_bounds(range.start, range.end)
    }
}

impl std::fmt::Display for SimpleSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Offset={}, Length={}]", self.offset, self.length)
    }
}
