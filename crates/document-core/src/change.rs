//! Structured change descriptions.
//!
//! Every mutation of a [`crate::TextDocument`] is described by a [`DocumentChange`]: an offset,
//! the exact removed text and the exact inserted text, all in **character offsets**.
//! Dependents (line heights, text segments, anchors) transform their own offsets through
//! [`DocumentChange::new_offset`], so a change is the only thing they need to stay consistent.

use crate::segment_collection::{SegmentId, SegmentLayerId, StyleId};
use serde::{Deserialize, Serialize};

/// How an offset that sits exactly at an insertion point (or inside a removed range) moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnchorMovementType {
    /// Use the change's default (see [`DocumentChange::default_before_insertion`]).
    #[default]
    Default,
    /// Stay in front of inserted text.
    BeforeInsertion,
    /// Move behind inserted text.
    AfterInsertion,
}

/// A single replace operation expressed in character offsets.
///
/// Semantics:
/// - `offset` is a character offset in the document **before** the change is applied.
/// - `removed_text` starts at `offset` in the old document.
/// - `inserted_text` starts at `offset` in the new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    /// Start offset of the change.
    pub offset: usize,
    /// Exact removed text (may be empty).
    pub removed_text: String,
    /// Exact inserted text (may be empty).
    pub inserted_text: String,
    /// Resolution of [`AnchorMovementType::Default`] for this change.
    pub default_before_insertion: bool,
    removal_length: usize,
    insertion_length: usize,
}

impl DocumentChange {
    /// Create a change description.
    pub fn new(offset: usize, removed_text: impl Into<String>, inserted_text: impl Into<String>) -> Self {
        let removed_text = removed_text.into();
        let inserted_text = inserted_text.into();
        Self {
            offset,
            removal_length: removed_text.chars().count(),
            insertion_length: inserted_text.chars().count(),
            removed_text,
            inserted_text,
            default_before_insertion: false,
        }
    }

    /// Set how [`AnchorMovementType::Default`] resolves for this change.
    pub fn with_default_before_insertion(mut self, before: bool) -> Self {
        self.default_before_insertion = before;
        self
    }

    /// Number of removed characters.
    pub fn removal_length(&self) -> usize {
        self.removal_length
    }

    /// Number of inserted characters.
    pub fn insertion_length(&self) -> usize {
        self.insertion_length
    }

    /// Exclusive end of the removed range in the old document.
    pub fn removal_end(&self) -> usize {
        self.offset + self.removal_length
    }

    /// Exclusive end of the inserted range in the new document.
    pub fn insertion_end(&self) -> usize {
        self.offset + self.insertion_length
    }

    /// Net change of the document length.
    pub fn delta(&self) -> isize {
        self.insertion_length as isize - self.removal_length as isize
    }

    /// Returns `true` if the change neither removes nor inserts anything.
    pub fn is_empty(&self) -> bool {
        self.removal_length == 0 && self.insertion_length == 0
    }

    /// Returns the change that reverts this one.
    pub fn invert(&self) -> Self {
        Self {
            offset: self.offset,
            removed_text: self.inserted_text.clone(),
            inserted_text: self.removed_text.clone(),
            default_before_insertion: self.default_before_insertion,
            removal_length: self.insertion_length,
            insertion_length: self.removal_length,
        }
    }

    /// Transform an offset of the old document into the new document.
    ///
    /// Offsets before the change stay, offsets after it shift by [`DocumentChange::delta`].
    /// Offsets inside the removed range, and offsets exactly at a pure insertion, are resolved
    /// by `movement`.
    pub fn new_offset(&self, old_offset: usize, movement: AnchorMovementType) -> usize {
        let offset = self.offset;
        if !(self.removal_length == 0 && old_offset == offset) {
            if old_offset <= offset {
                return old_offset;
            }
            if old_offset >= offset + self.removal_length {
                return old_offset + self.insertion_length - self.removal_length;
            }
        }
        let before = match movement {
            AnchorMovementType::BeforeInsertion => true,
            AnchorMovementType::AfterInsertion => false,
            AnchorMovementType::Default => self.default_before_insertion,
        };
        if before {
            offset
        } else {
            offset + self.insertion_length
        }
    }

    /// Returns `true` if the removed range strictly covers `old_offset`, i.e. an anchor at that
    /// offset loses the text it was attached to.
    pub fn removes_offset(&self, old_offset: usize) -> bool {
        self.removal_length > 0 && self.offset < old_offset && old_offset < self.removal_end()
    }
}

/// A document-owned segment that was removed because its text was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeletedSegment {
    /// Layer the segment belonged to.
    pub layer: SegmentLayerId,
    /// Id of the segment inside its layer.
    pub id: SegmentId,
    /// Payload of the segment.
    pub style: StyleId,
}

/// The ordered changes produced by one update (a single edit, or a whole
/// [`crate::TextDocument::run_update`] scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChangeEvent {
    /// Character count before the first change.
    pub before_length: usize,
    /// Character count after the last change.
    pub after_length: usize,
    /// Changes in the order they were applied.
    pub changes: Vec<DocumentChange>,
    /// Segments of document layers deleted by the changes.
    pub deleted_segments: Vec<DeletedSegment>,
    /// Document version after the batch.
    pub version: u64,
}

impl DocumentChangeEvent {
    /// Returns `true` if the batch contains no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Transform an offset across every change of the batch.
    pub fn new_offset(&self, old_offset: usize, movement: AnchorMovementType) -> usize {
        self.changes
            .iter()
            .fold(old_offset, |offset, change| change.new_offset(offset, movement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_offset_outside_change() {
        let change = DocumentChange::new(10, "abc", "xy");
        assert_eq!(change.new_offset(5, AnchorMovementType::Default), 5);
        assert_eq!(change.new_offset(10, AnchorMovementType::Default), 10);
        assert_eq!(change.new_offset(13, AnchorMovementType::Default), 12);
        assert_eq!(change.new_offset(20, AnchorMovementType::Default), 19);
    }

    #[test]
    fn test_new_offset_inside_removal() {
        let change = DocumentChange::new(10, "abc", "xy");
        assert_eq!(change.new_offset(11, AnchorMovementType::BeforeInsertion), 10);
        assert_eq!(change.new_offset(11, AnchorMovementType::AfterInsertion), 12);
        assert_eq!(change.new_offset(12, AnchorMovementType::Default), 12);
    }

    #[test]
    fn test_new_offset_at_pure_insertion() {
        let change = DocumentChange::new(4, "", "hello");
        assert_eq!(change.new_offset(4, AnchorMovementType::BeforeInsertion), 4);
        assert_eq!(change.new_offset(4, AnchorMovementType::AfterInsertion), 9);
        assert_eq!(change.new_offset(4, AnchorMovementType::Default), 9);

        let change = change.with_default_before_insertion(true);
        assert_eq!(change.new_offset(4, AnchorMovementType::Default), 4);
    }

    #[test]
    fn test_invert_swaps_texts() {
        let change = DocumentChange::new(2, "old", "brand new");
        let inverse = change.invert();
        assert_eq!(inverse.removed_text, "brand new");
        assert_eq!(inverse.inserted_text, "old");
        assert_eq!(inverse.removal_length(), 9);
        assert_eq!(inverse.insertion_length(), 3);
        assert_eq!(inverse.invert(), change);
    }

    #[test]
    fn test_lengths_count_chars() {
        let change = DocumentChange::new(0, "你好", "é");
        assert_eq!(change.removal_length(), 2);
        assert_eq!(change.insertion_length(), 1);
        assert_eq!(change.delta(), -1);
    }
}
