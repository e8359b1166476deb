//! Live text segments.
//!
//! A [`TextSegmentCollection`] stores ranges whose offsets follow the text they were placed on:
//! every [`DocumentChange`] shifts, grows, shrinks or deletes them. The document owns one
//! collection per [`SegmentLayerId`] (read-only sections, search results, highlights) and updates
//! all of them in the same pass as the edit itself.

use crate::change::{AnchorMovementType, DocumentChange};
use crate::segment::{Segment, SimpleSegment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Payload id used by the document-owned segment layers.
pub type StyleId = u32;

/// Built-in style id for read-only sections.
pub const READ_ONLY_STYLE_ID: StyleId = 0x0100_0001;

/// Built-in style id for the current search result.
pub const CURRENT_SEARCH_RESULT_STYLE_ID: StyleId = 0x0200_0001;
/// Built-in style id for the other search results.
pub const SEARCH_RESULT_STYLE_ID: StyleId = 0x0200_0002;

/// Segment layer id
///
/// Distinguishes the owners of document segments, so one feature can replace or clear its
/// segments without touching the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentLayerId(pub u32);

impl SegmentLayerId {
    /// Create a layer id from a raw numeric identifier.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Read-only sections (see [`crate::ReadOnlyMode::Layer`]).
    pub const READ_ONLY: Self = Self(1);

    /// Search result highlighting.
    pub const SEARCH_RESULTS: Self = Self(2);

    /// Free-form highlights (bracket matches, references, ...).
    pub const HIGHLIGHTS: Self = Self(3);
}

/// Identity of a segment inside its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(u64);

/// What happens to a segment whose text is deleted entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeletionPolicy {
    /// Remove it from the collection and report it as deleted.
    #[default]
    Remove,
    /// Keep it as an empty segment at the deletion point.
    KeepEmpty,
}

/// A segment stored in a [`TextSegmentCollection`].
///
/// Removal and edits hand out owned segments; lookups hand out `TextSegment<&T>` views that
/// borrow the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment<T> {
    id: SegmentId,
    start_offset: usize,
    length: usize,
    /// Payload.
    pub value: T,
}

impl<T> TextSegment<T> {
    /// Identity of the segment.
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Start offset.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Exclusive end offset.
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.length
    }
}

impl<T: Clone> TextSegment<&T> {
    /// Detach a borrowed view from its collection.
    pub fn cloned(&self) -> TextSegment<T> {
        TextSegment {
            id: self.id,
            start_offset: self.start_offset,
            length: self.length,
            value: self.value.clone(),
        }
    }
}

impl<T> Segment for TextSegment<T> {
    fn offset(&self) -> usize {
        self.start_offset
    }

    fn length(&self) -> usize {
        self.length
    }
}

type Link = Option<usize>;

#[derive(Debug, Clone)]
struct Node<T> {
    id: SegmentId,
    /// Start offset, not counting the shifts still pending on ancestors.
    start: usize,
    length: usize,
    value: T,
    priority: u64,
    parent: Link,
    left: Link,
    right: Link,
    /// Largest end offset in the subtree, in the same frame as `start`.
    max_end: usize,
    /// Shift owed to both children.
    pending: isize,
}

impl<T> Node<T> {
    fn new(id: SegmentId, start: usize, length: usize, value: T, priority: u64) -> Self {
        Self {
            id,
            start,
            length,
            value,
            priority,
            parent: None,
            left: None,
            right: None,
            max_end: start + length,
            pending: 0,
        }
    }

    fn key(&self) -> (usize, SegmentId) {
        (self.start, self.id)
    }

    fn end(&self) -> usize {
        self.start + self.length
    }

    /// The segment as seen from the root, given the shift pending on its ancestors.
    fn view(&self, shift: isize) -> TextSegment<&T> {
        TextSegment {
            id: self.id,
            start_offset: self.start.saturating_add_signed(shift),
            length: self.length,
            value: &self.value,
        }
    }

    fn detach(&mut self) {
        self.parent = None;
        self.left = None;
        self.right = None;
        self.pending = 0;
    }
}

/// Collection of live text segments.
///
/// Segments live in a treap ordered by `(start offset, id)`, so segments with equal start
/// offsets are ordered by creation. Every node knows the largest end offset below it, which
/// lets queries skip subtrees that end before the query starts. Edits move the segments after
/// the changed range as one block through a shift stored at the top of their subtree; only
/// the segments touching the change are visited.
///
/// Add, remove and lookup by id: O(log n). Queries: O(log n + k). Edits: O(log n + k) for
/// the k segments touching the change.
///
/// Query results are borrowed [`TextSegment`] views carrying the current offsets.
#[derive(Debug, Clone)]
pub struct TextSegmentCollection<T> {
    /// Node arena; slots are compacted on removal.
    nodes: Vec<Node<T>>,
    root: Link,
    index: HashMap<SegmentId, usize>,
    next_id: u64,
    rng_state: u64,
    deletion_policy: DeletionPolicy,
}

impl<T> TextSegmentCollection<T> {
    /// Create an empty collection that removes fully deleted segments.
    pub fn new() -> Self {
        Self::with_deletion_policy(DeletionPolicy::Remove)
    }

    /// Create an empty collection with an explicit deletion policy.
    pub fn with_deletion_policy(deletion_policy: DeletionPolicy) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            index: HashMap::new(),
            next_id: 0,
            rng_state: 0x2545_F491_4F6C_DD1D,
            deletion_policy,
        }
    }

    /// Deletion policy of this collection.
    pub fn deletion_policy(&self) -> DeletionPolicy {
        self.deletion_policy
    }

    /// Change the deletion policy for future changes.
    pub fn set_deletion_policy(&mut self, deletion_policy: DeletionPolicy) {
        self.deletion_policy = deletion_policy;
    }

    /// Add a segment covering `[offset, offset + length)`.
    ///
    /// Segments with equal start offsets keep insertion order.
    pub fn add(&mut self, offset: usize, length: usize, value: T) -> SegmentId {
        let id = SegmentId(self.next_id);
        self.next_id += 1;
        let priority = self.next_priority();
        let slot = self.nodes.len();
        self.nodes.push(Node::new(id, offset, length, value, priority));
        self.index.insert(id, slot);
        self.insert_node(slot);
        id
    }

    /// Remove a segment. Returns it, or `None` if it is not (or no longer) in the collection.
    pub fn remove(&mut self, id: SegmentId) -> Option<TextSegment<T>> {
        let slot = *self.index.get(&id)?;
        let start = self.nodes[slot]
            .start
            .saturating_add_signed(self.inherited_shift(slot));
        let root = self.root.take();
        let (before, rest) = self.split_root(root, (start, id));
        let (removed, after) = self.split_root(rest, (start, SegmentId(id.0 + 1)));
        debug_assert_eq!(removed, Some(slot));
        let root = self.merge(before, after);
        self.set_root(root);
        Some(self.release(slot))
    }

    /// Returns `true` if the segment is still in the collection.
    pub fn contains(&self, id: SegmentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Look up a segment by id.
    pub fn get(&self, id: SegmentId) -> Option<TextSegment<&T>> {
        let slot = *self.index.get(&id)?;
        Some(self.nodes[slot].view(self.inherited_shift(slot)))
    }

    /// Mutable access to a segment's payload.
    pub fn value_mut(&mut self, id: SegmentId) -> Option<&mut T> {
        let slot = *self.index.get(&id)?;
        Some(&mut self.nodes[slot].value)
    }

    /// All segments in ascending start offset order.
    pub fn iter(&self) -> impl Iterator<Item = TextSegment<&T>> + '_ {
        let mut iter = Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
        };
        iter.push_left(self.root, 0);
        iter
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove all segments.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.root = None;
    }

    /// First segment starting at or after `offset`.
    pub fn find_first_segment_with_start_after(&self, offset: usize) -> Option<TextSegment<&T>> {
        let mut found = None;
        let mut link = self.root;
        let mut shift = 0;
        while let Some(x) = link {
            let node = &self.nodes[x];
            if node.start.saturating_add_signed(shift) >= offset {
                found = Some(node.view(shift));
                link = node.left;
            } else {
                link = node.right;
            }
            shift += node.pending;
        }
        found
    }

    /// Segments with `start <= offset <= end`, in ascending start order.
    ///
    /// Both boundaries are inclusive, so a caret placed at either end of a segment is reported.
    pub fn find_segments_containing(&self, offset: usize) -> Vec<TextSegment<&T>> {
        self.find_overlapping_segments(offset, 0)
    }

    /// Segments touching `[offset, offset + length]`, in ascending start order.
    ///
    /// Segments that merely touch the range at either end are included.
    pub fn find_overlapping_segments(&self, offset: usize, length: usize) -> Vec<TextSegment<&T>> {
        let mut result = Vec::new();
        self.collect_overlapping(self.root, 0, offset, offset.saturating_add(length), &mut result);
        result
    }

    fn collect_overlapping<'a>(
        &'a self,
        link: Link,
        shift: isize,
        offset: usize,
        end: usize,
        out: &mut Vec<TextSegment<&'a T>>,
    ) {
        let Some(x) = link else {
            return;
        };
        let node = &self.nodes[x];
        if node.max_end.saturating_add_signed(shift) < offset {
            return;
        }
        let child_shift = shift + node.pending;
        self.collect_overlapping(node.left, child_shift, offset, end, out);
        let segment = node.view(shift);
        if segment.start_offset > end {
            return;
        }
        if segment.end_offset() >= offset {
            out.push(segment);
        }
        self.collect_overlapping(node.right, child_shift, offset, end, out);
    }

    /// Move every segment through `change`.
    ///
    /// Insertions exactly at a segment boundary are not included in the segment; insertions
    /// strictly inside grow it. Returns the segments removed because their text was deleted
    /// (always empty under [`DeletionPolicy::KeepEmpty`]).
    pub fn apply_change(&mut self, change: &DocumentChange) -> Vec<TextSegment<T>> {
        if change.is_empty() || self.root.is_none() {
            return Vec::new();
        }
        let offset = change.offset;
        let delta = change.insertion_length() as isize - change.removal_length() as isize;

        let root = self.root.take();
        let (before, rest) = self.split_root(root, (offset, SegmentId(0)));
        let (inside, after) = self.split_root(rest, (change.removal_end(), SegmentId(0)));
        // Segments starting at or after the removed text move as one block.
        self.shift(after, delta);
        self.move_ends(before, change);
        let root = self.merge(before, after);
        self.set_root(root);

        // Segments starting inside the removed text are placed again one by one.
        let mut touched = Vec::new();
        self.collect_subtree(inside, 0, &mut touched);
        let mut deleted_ids = Vec::new();
        for (slot, start, length) in touched {
            let node = &mut self.nodes[slot];
            node.detach();
            if is_deleted_by(start, length, change) {
                if self.deletion_policy == DeletionPolicy::Remove {
                    // Reported with the offsets it had before the change.
                    node.start = start;
                    node.length = length;
                    deleted_ids.push(node.id);
                    continue;
                }
                node.start = offset;
                node.length = 0;
            } else {
                let new_start = change.new_offset(start, AnchorMovementType::AfterInsertion);
                let new_end = change.new_offset(start + length, AnchorMovementType::BeforeInsertion);
                node.start = new_start;
                node.length = new_end.saturating_sub(new_start);
            }
            node.max_end = node.end();
            self.insert_node(slot);
        }

        let deleted: Vec<_> = deleted_ids
            .into_iter()
            .filter_map(|id| {
                let slot = *self.index.get(&id)?;
                Some(self.release(slot))
            })
            .collect();
        if !deleted.is_empty() {
            trace!(count = deleted.len(), offset, "segments deleted");
        }
        deleted
    }

    /// Give every segment of `link` ending after the change offset its new end. The segments
    /// start before the change, so their starts and order stay.
    fn move_ends(&mut self, link: Link, change: &DocumentChange) {
        let Some(x) = link else {
            return;
        };
        if self.nodes[x].max_end <= change.offset {
            return;
        }
        self.push_down(x);
        let (left, right) = (self.nodes[x].left, self.nodes[x].right);
        self.move_ends(left, change);
        self.move_ends(right, change);
        let node = &mut self.nodes[x];
        if node.end() > change.offset {
            let end = change.new_offset(node.end(), AnchorMovementType::BeforeInsertion);
            node.length = end.saturating_sub(node.start);
        }
        self.update(x);
    }

    /// `(slot, start, length)` of every node of `link`, in order.
    fn collect_subtree(&self, link: Link, shift: isize, out: &mut Vec<(usize, usize, usize)>) {
        let Some(x) = link else {
            return;
        };
        let node = &self.nodes[x];
        let child_shift = shift + node.pending;
        self.collect_subtree(node.left, child_shift, out);
        out.push((x, node.start.saturating_add_signed(shift), node.length));
        self.collect_subtree(node.right, child_shift, out);
    }

    fn next_priority(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Sum of the shifts pending on the ancestors of `slot`.
    fn inherited_shift(&self, slot: usize) -> isize {
        let mut shift = 0;
        let mut link = self.nodes[slot].parent;
        while let Some(x) = link {
            shift += self.nodes[x].pending;
            link = self.nodes[x].parent;
        }
        shift
    }

    fn insert_node(&mut self, slot: usize) {
        let key = self.nodes[slot].key();
        let root = self.root.take();
        let (before, after) = self.split_root(root, key);
        let left = self.merge(before, Some(slot));
        let root = self.merge(left, after);
        self.set_root(root);
    }

    /// Take a detached node out of the arena. The last node moves into its slot.
    fn release(&mut self, slot: usize) -> TextSegment<T> {
        let node = self.nodes.swap_remove(slot);
        self.index.remove(&node.id);
        let moved_from = self.nodes.len();
        if slot < moved_from {
            let moved = &self.nodes[slot];
            let (id, parent, left, right) = (moved.id, moved.parent, moved.left, moved.right);
            self.index.insert(id, slot);
            match parent {
                Some(p) => {
                    let parent = &mut self.nodes[p];
                    if parent.left == Some(moved_from) {
                        parent.left = Some(slot);
                    } else if parent.right == Some(moved_from) {
                        parent.right = Some(slot);
                    }
                }
                None if self.root == Some(moved_from) => self.root = Some(slot),
                None => {}
            }
            for child in [left, right].into_iter().flatten() {
                self.nodes[child].parent = Some(slot);
            }
        }
        TextSegment {
            id: node.id,
            start_offset: node.start,
            length: node.length,
            value: node.value,
        }
    }

    fn set_root(&mut self, root: Link) {
        if let Some(x) = root {
            self.nodes[x].parent = None;
        }
        self.root = root;
    }

    fn set_left(&mut self, x: usize, child: Link) {
        self.nodes[x].left = child;
        if let Some(c) = child {
            self.nodes[c].parent = Some(x);
        }
    }

    fn set_right(&mut self, x: usize, child: Link) {
        self.nodes[x].right = child;
        if let Some(c) = child {
            self.nodes[c].parent = Some(x);
        }
    }

    fn shift(&mut self, link: Link, delta: isize) {
        if let Some(x) = link {
            let node = &mut self.nodes[x];
            node.start = node.start.saturating_add_signed(delta);
            node.max_end = node.max_end.saturating_add_signed(delta);
            node.pending += delta;
        }
    }

    fn push_down(&mut self, x: usize) {
        let pending = std::mem::take(&mut self.nodes[x].pending);
        if pending != 0 {
            let (left, right) = (self.nodes[x].left, self.nodes[x].right);
            self.shift(left, pending);
            self.shift(right, pending);
        }
    }

    /// Recompute `max_end` of a node whose shift was already pushed down.
    fn update(&mut self, x: usize) {
        let node = &self.nodes[x];
        let mut max_end = node.end();
        for child in [node.left, node.right].into_iter().flatten() {
            max_end = max_end.max(self.nodes[child].max_end);
        }
        self.nodes[x].max_end = max_end;
    }

    /// Split a tree into the nodes ordered before `key` and the rest. Both parts come back as
    /// roots.
    fn split_root(&mut self, link: Link, key: (usize, SegmentId)) -> (Link, Link) {
        let (before, after) = self.split(link, key);
        for root in [before, after].into_iter().flatten() {
            self.nodes[root].parent = None;
        }
        (before, after)
    }

    fn split(&mut self, link: Link, key: (usize, SegmentId)) -> (Link, Link) {
        let Some(x) = link else {
            return (None, None);
        };
        self.push_down(x);
        if self.nodes[x].key() < key {
            let (before, after) = self.split(self.nodes[x].right, key);
            self.set_right(x, before);
            self.update(x);
            (Some(x), after)
        } else {
            let (before, after) = self.split(self.nodes[x].left, key);
            self.set_left(x, after);
            self.update(x);
            (before, Some(x))
        }
    }

    /// Concatenate two trees; every key of `a` orders before every key of `b`.
    fn merge(&mut self, a: Link, b: Link) -> Link {
        let (x, y) = match (a, b) {
            (None, other) | (other, None) => return other,
            (Some(x), Some(y)) => (x, y),
        };
        if self.nodes[x].priority >= self.nodes[y].priority {
            self.push_down(x);
            let merged = self.merge(self.nodes[x].right, Some(y));
            self.set_right(x, merged);
            self.update(x);
            Some(x)
        } else {
            self.push_down(y);
            let merged = self.merge(Some(x), self.nodes[y].left);
            self.set_left(y, merged);
            self.update(y);
            Some(y)
        }
    }
}

/// In-order walk carrying the shift pending above each stacked node.
struct Iter<'a, T> {
    nodes: &'a [Node<T>],
    stack: Vec<(usize, isize)>,
}

impl<T> Iter<'_, T> {
    fn push_left(&mut self, mut link: Link, mut shift: isize) {
        while let Some(x) = link {
            self.stack.push((x, shift));
            let node = &self.nodes[x];
            shift += node.pending;
            link = node.left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = TextSegment<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        let (x, shift) = self.stack.pop()?;
        let nodes = self.nodes;
        let node = &nodes[x];
        self.push_left(node.right, shift + node.pending);
        Some(node.view(shift))
    }
}

fn is_deleted_by(start: usize, length: usize, change: &DocumentChange) -> bool {
    let removal_end = change.removal_end();
    change.removal_length() > 0
        && change.offset <= start
        && start + length <= removal_end
        && (length > 0 || (change.offset < start && start < removal_end))
}

impl<T> Default for TextSegmentCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<&TextSegment<T>> for SimpleSegment {
    fn from(segment: &TextSegment<T>) -> Self {
        SimpleSegment::new(segment.start_offset, segment.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges<T>(collection: &TextSegmentCollection<T>) -> Vec<(usize, usize)> {
        collection
            .iter()
            .map(|s| (s.start_offset(), s.end_offset()))
            .collect()
    }

    #[test]
    fn test_add_keeps_start_order() {
        let mut c = TextSegmentCollection::new();
        c.add(10, 5, "b");
        c.add(2, 3, "a");
        c.add(10, 1, "c");
        assert_eq!(ranges(&c), vec![(2, 5), (10, 15), (10, 11)]);
    }

    #[test]
    fn test_find_segments_containing_is_inclusive() {
        let mut c = TextSegmentCollection::new();
        c.add(0, 20, 1);
        c.add(5, 5, 2);
        c.add(12, 0, 3);
        let values: Vec<_> = c.find_segments_containing(10).iter().map(|s| *s.value).collect();
        assert_eq!(values, vec![1, 2]);
        let values: Vec<_> = c.find_segments_containing(12).iter().map(|s| *s.value).collect();
        assert_eq!(values, vec![1, 3]);
        assert!(c.find_segments_containing(21).is_empty());
    }

    #[test]
    fn test_find_overlapping_skips_segments_ending_early() {
        let mut c = TextSegmentCollection::new();
        c.add(0, 100, "long");
        for i in 0..10 {
            c.add(10 + i * 5, 2, "short");
        }
        let found = c.find_overlapping_segments(50, 3);
        let starts: Vec<_> = found.iter().map(|s| s.start_offset()).collect();
        assert_eq!(starts, vec![0, 50]);
    }

    #[test]
    fn test_insertion_at_boundaries_is_excluded() {
        let mut c = TextSegmentCollection::new();
        c.add(5, 5, ());
        c.apply_change(&DocumentChange::new(5, "", "xx"));
        assert_eq!(ranges(&c), vec![(7, 12)]);
        c.apply_change(&DocumentChange::new(12, "", "yy"));
        assert_eq!(ranges(&c), vec![(7, 12)]);
        c.apply_change(&DocumentChange::new(9, "", "zzz"));
        assert_eq!(ranges(&c), vec![(7, 15)]);
    }

    #[test]
    fn test_partial_removal_shrinks() {
        let mut c = TextSegmentCollection::new();
        c.add(5, 10, ());
        c.apply_change(&DocumentChange::new(0, "0123456", ""));
        assert_eq!(ranges(&c), vec![(0, 8)]);
        c.apply_change(&DocumentChange::new(6, "abcd", ""));
        assert_eq!(ranges(&c), vec![(0, 6)]);
    }

    #[test]
    fn test_fully_deleted_segment_is_reported() {
        let mut c = TextSegmentCollection::new();
        let gone = c.add(4, 2, "gone");
        let stays = c.add(10, 2, "stays");
        let deleted = c.apply_change(&DocumentChange::new(3, "abcd", ""));
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id(), gone);
        assert_eq!((deleted[0].start_offset(), deleted[0].value), (4, "gone"));
        assert!(!c.contains(gone));
        assert_eq!(c.get(stays).map(|s| s.start_offset()), Some(6));
    }

    #[test]
    fn test_empty_segment_at_removal_edge_survives() {
        let mut c = TextSegmentCollection::new();
        c.add(3, 0, ());
        c.add(7, 0, ());
        let deleted = c.apply_change(&DocumentChange::new(3, "abcd", ""));
        assert!(deleted.is_empty());
        assert_eq!(ranges(&c), vec![(3, 3), (3, 3)]);
    }

    #[test]
    fn test_keep_empty_policy() {
        let mut c = TextSegmentCollection::with_deletion_policy(DeletionPolicy::KeepEmpty);
        c.add(4, 2, ());
        let deleted = c.apply_change(&DocumentChange::new(2, "abcdef", "X"));
        assert!(deleted.is_empty());
        assert_eq!(ranges(&c), vec![(2, 2)]);
    }

    #[test]
    fn test_overlap_query_saturates_at_usize_max() {
        let mut c = TextSegmentCollection::new();
        c.add(3, 4, ());
        c.add(20, 0, ());
        let found = c.find_overlapping_segments(5, usize::MAX);
        let starts: Vec<_> = found.iter().map(|s| s.start_offset()).collect();
        assert_eq!(starts, vec![3, 20]);
    }

    #[test]
    fn test_equal_starts_after_edit_follow_creation_order() {
        let mut c = TextSegmentCollection::with_deletion_policy(DeletionPolicy::KeepEmpty);
        let late = c.add(9, 2, 'c');
        let early = c.add(2, 6, 'a');
        let middle = c.add(4, 1, 'b');
        c.apply_change(&DocumentChange::new(2, "0123456789", ""));
        let order: Vec<_> = c.iter().map(|s| (s.id(), s.start_offset())).collect();
        assert_eq!(order, vec![(late, 2), (early, 2), (middle, 2)]);
        assert_eq!(c.find_first_segment_with_start_after(1).map(|s| s.id()), Some(late));
    }

    #[test]
    fn test_lookups_see_shifted_offsets() {
        let mut c = TextSegmentCollection::new();
        let ids: Vec<_> = (0..50).map(|i| c.add(i * 10, 5, i)).collect();
        c.apply_change(&DocumentChange::new(0, "", "xyz"));
        c.apply_change(&DocumentChange::new(100, "ab", ""));

        assert_eq!(c.get(ids[0]).map(|s| s.start_offset()), Some(3));
        assert_eq!(c.get(ids[49]).map(|s| s.start_offset()), Some(491));
        let detached = c.get(ids[10]).map(|s| s.cloned());
        assert_eq!(detached.map(|s| (s.start_offset(), s.value)), Some((101, 10)));

        *c.value_mut(ids[20]).unwrap() = 99;
        let removed = c.remove(ids[20]).unwrap();
        assert_eq!((removed.start_offset(), removed.end_offset(), removed.value), (201, 206, 99));
        assert_eq!(c.len(), 49);
        assert!(c.find_segments_containing(203).is_empty());
        assert_eq!(c.find_first_segment_with_start_after(200).map(|s| s.id()), Some(ids[21]));

        let starts: Vec<_> = c.iter().map(|s| s.start_offset()).collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_remove_by_id() {
        let mut c = TextSegmentCollection::new();
        let a = c.add(0, 50, 'a');
        c.add(1, 1, 'b');
        assert_eq!(c.remove(a).map(|s| s.value), Some('a'));
        assert!(c.remove(a).is_none());
        assert!(c.find_segments_containing(30).is_empty());
    }
}
