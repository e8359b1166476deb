//! How locations follow byte insertions and removals.

use crate::bit_location::BitLocation;
use serde::{Deserialize, Serialize};

/// What typing a nibble does to the byte under the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditingMode {
    /// Replace the nibble under the caret.
    #[default]
    Overwrite,
    /// Typing at the start of a byte inserts a new byte.
    Insert,
}

/// Where `location` ends up after `count` bytes were removed at `offset`.
///
/// Locations before the removal stay, locations after it move back by `count` bytes and keep
/// their bit offset, and locations inside it collapse onto the start of the removal.
pub fn location_after_removal(location: BitLocation, offset: u64, count: u64) -> BitLocation {
    let byte = location.byte_index();
    if byte < offset {
        location
    } else if byte - offset >= count {
        location.with_byte_index(byte - count)
    } else {
        BitLocation::at_byte(offset)
    }
}

/// Where the caret ends up after `count` bytes were removed at `offset`.
///
/// Like [`location_after_removal`], except that a caret whose byte was removed never lands past
/// the last remaining byte: removing the tail of the document puts it on the first bit of the
/// new last byte (or at the start of an empty document).
pub fn caret_after_removal(
    caret: BitLocation,
    offset: u64,
    count: u64,
    new_length: u64,
) -> BitLocation {
    let byte = caret.byte_index();
    let removed = byte >= offset && byte - offset < count;
    let moved = location_after_removal(caret, offset, count);
    if removed && moved.byte_index() >= new_length {
        BitLocation::at_byte(new_length.saturating_sub(1))
    } else {
        moved
    }
}

/// Where `location` ends up after `count` bytes were inserted at `offset`.
///
/// Locations in bytes at or after `offset` move forward by `count` bytes.
pub fn location_after_insertion(location: BitLocation, offset: u64, count: u64) -> BitLocation {
    let byte = location.byte_index();
    if byte < offset {
        location
    } else {
        location.with_byte_index(byte.saturating_add(count))
    }
}
