//! Read-only sections.
//!
//! A [`ReadOnlySectionProvider`] answers two questions for editing commands: may text be
//! inserted at an offset, and which parts of a range may be deleted. The document consults the
//! provider selected by its [`ReadOnlyMode`] in [`crate::TextDocument::insert_checked`] and
//! [`crate::TextDocument::remove_deletable`]; plain `insert`/`remove` calls are never blocked.

use crate::segment::SimpleSegment;
use crate::segment_collection::{SegmentLayerId, TextSegmentCollection};
use serde::{Deserialize, Serialize};

/// Decides where text can be inserted and deleted.
pub trait ReadOnlySectionProvider {
    /// Returns `true` if text may be inserted at `offset`.
    fn can_insert(&self, offset: usize) -> bool;

    /// Parts of `segment` that may be deleted.
    ///
    /// The result must be in ascending order, non-overlapping, and inside `segment`.
    fn deletable_segments(&self, segment: SimpleSegment) -> Vec<SimpleSegment>;
}

/// Everything is editable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReadOnlySections;

impl ReadOnlySectionProvider for NoReadOnlySections {
    fn can_insert(&self, _offset: usize) -> bool {
        true
    }

    fn deletable_segments(&self, segment: SimpleSegment) -> Vec<SimpleSegment> {
        vec![segment]
    }
}

/// Nothing is editable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyDocument;

impl ReadOnlySectionProvider for ReadOnlyDocument {
    fn can_insert(&self, _offset: usize) -> bool {
        false
    }

    fn deletable_segments(&self, _segment: SimpleSegment) -> Vec<SimpleSegment> {
        Vec::new()
    }
}

/// Every segment of the collection is read-only.
///
/// Insertion is allowed at the boundaries of a read-only segment but not strictly inside it.
impl<T> ReadOnlySectionProvider for TextSegmentCollection<T> {
    fn can_insert(&self, offset: usize) -> bool {
        self.find_segments_containing(offset)
            .iter()
            .all(|s| !(s.start_offset() < offset && offset < s.end_offset()))
    }

    fn deletable_segments(&self, segment: SimpleSegment) -> Vec<SimpleSegment> {
        if segment.is_empty() && self.can_insert(segment.offset) {
            return vec![segment];
        }
        let mut result = Vec::new();
        let mut read_only_until = segment.offset;
        for read_only in self.find_overlapping_segments(segment.offset, segment.length) {
            let start = read_only.start_offset();
            if start > read_only_until {
                result.push(SimpleSegment::from_bounds(read_only_until, start));
            }
            read_only_until = read_only_until.max(read_only.end_offset());
        }
        if read_only_until < segment.end_offset() {
            result.push(SimpleSegment::from_bounds(read_only_until, segment.end_offset()));
        }
        result
    }
}

/// Which read-only provider a [`crate::TextDocument`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadOnlyMode {
    /// [`NoReadOnlySections`].
    #[default]
    None,
    /// [`ReadOnlyDocument`].
    Document,
    /// The segments of a document layer are read-only.
    Layer(SegmentLayerId),
}

/// Check that `deletable` is a valid answer for `requested`.
pub(crate) fn validate_deletable_segments(requested: SimpleSegment, deletable: &[SimpleSegment]) -> bool {
    let mut previous_end = requested.offset;
    for segment in deletable {
        if segment.offset < previous_end || segment.end_offset() > requested.end_offset() {
            return false;
        }
        previous_end = segment.end_offset();
    }
    true
}
