//! The text document.
//!
//! [`TextDocument`] aggregates the text and everything that has to follow it:
//!
//! - **Rope**: text storage and the line index (`\n`, `\r\n` and lone `\r` end a line)
//! - **HeightTree**: visual line heights and collapsed sections, one entry per line
//! - **Segment layers**: [`TextSegmentCollection`]s keyed by [`SegmentLayerId`]
//! - **Anchors**: positions that move with the text
//! - **UndoStack**: the history of applied [`DocumentChange`]s
//!
//! Every edit updates all of them before it returns, so no dependent ever observes a stale
//! state. Subscribers are told about changes once per update: after each edit, or once when
//! the outermost [`TextDocument::run_update`] scope ends.
//!
//! # Example
//!
//! ```rust
//! use document_core::{TextDocument, TextLocation};
//!
//! let mut doc = TextDocument::from_text("hello\nworld");
//! {
//!     let mut update = doc.run_update();
//!     update.insert(5, ",").unwrap();
//!     update.replace(7, 5, "there").unwrap();
//! }
//! assert_eq!(doc.text(), "hello,\nthere");
//! assert_eq!(doc.location_of(8).unwrap(), TextLocation::new(2, 2));
//!
//! doc.undo().unwrap();
//! assert_eq!(doc.text(), "hello\nworld");
//! ```

use crate::anchor::{AnchorId, AnchorSet, TextAnchor};
use crate::change::{AnchorMovementType, DeletedSegment, DocumentChange, DocumentChangeEvent};
use crate::error::{DocumentError, DocumentResult};
use crate::height_tree::{CollapsedLineSection, HeightTree};
use crate::line::{DocumentLine, TextLocation};
use crate::options::DocumentOptions;
use crate::read_only::{
    NoReadOnlySections, ReadOnlyDocument, ReadOnlyMode, ReadOnlySectionProvider,
    validate_deletable_segments,
};
use crate::segment::SimpleSegment;
use crate::segment_collection::{
    DeletionPolicy, SegmentId, SegmentLayerId, StyleId, TextSegmentCollection,
};
use crate::text_source::{TextSnapshot, TextSource};
use crate::undo::{UndoStack, UndoableOperation};
use ropey::Rope;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// Change callback function type
pub type ChangeCallback = Box<dyn FnMut(&DocumentChangeEvent) + Send>;

/// Token returned by [`TextDocument::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Text plus everything that follows it; the target of undo operations.
///
/// Only reachable through [`TextDocument`]. Custom [`UndoableOperation`]s (for example optional
/// entries pushed through [`TextDocument::undo_stack_mut`]) receive it as their target.
#[derive(Debug)]
pub struct DocumentBuffer {
    rope: Rope,
    heights: HeightTree,
    layers: BTreeMap<SegmentLayerId, TextSegmentCollection<StyleId>>,
    anchors: AnchorSet,
    version: u64,
    pending: Vec<DocumentChange>,
    pending_deleted: Vec<DeletedSegment>,
    batch_before_length: usize,
}

impl DocumentBuffer {
    fn new(text: &str, default_line_height: f64) -> Self {
        let rope = Rope::from_str(text);
        let heights = HeightTree::new(rope.len_lines(), default_line_height);
        Self {
            rope,
            heights,
            layers: BTreeMap::new(),
            anchors: AnchorSet::default(),
            version: 0,
            pending: Vec::new(),
            pending_deleted: Vec::new(),
            batch_before_length: 0,
        }
    }

    /// Number of characters.
    pub fn text_length(&self) -> usize {
        self.rope.len_chars()
    }

    /// Version counter, incremented by every applied change.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, change: &DocumentChange) -> DocumentResult<()> {
        let text_length = self.rope.len_chars();
        let removal_end = change.removal_end();
        if change.offset > text_length || removal_end > text_length {
            return Err(DocumentError::RangeOutOfBounds {
                offset: change.offset,
                length: change.removal_length(),
                text_length,
            });
        }
        if self.pending.is_empty() {
            self.batch_before_length = text_length;
        }

        let old_first_line = line_of(&self.rope, change.offset);
        let old_last_line = line_of(&self.rope, removal_end);
        self.rope.remove(change.offset..removal_end);
        self.rope.insert(change.offset, &change.inserted_text);
        // Joining or splitting a `\r\n` pair moves the change offset to another line in one of
        // the two ropes. Lines before the smaller of the two are unchanged.
        let first_line = old_first_line.min(line_of(&self.rope, change.offset));
        let new_last_line = line_of(&self.rope, change.insertion_end());
        self.update_heights(first_line, old_last_line, new_last_line)?;

        for (&layer, collection) in &mut self.layers {
            for segment in collection.apply_change(change) {
                self.pending_deleted.push(DeletedSegment {
                    layer,
                    id: segment.id(),
                    style: segment.value,
                });
            }
        }
        self.anchors.apply_change(change);

        self.version += 1;
        self.pending.push(change.clone());
        debug!(
            offset = change.offset,
            removed = change.removal_length(),
            inserted = change.insertion_length(),
            line_delta = new_last_line as isize - old_last_line as isize,
            version = self.version,
            "change applied"
        );
        Ok(())
    }

    /// Mirror a line structure change into the height tree.
    ///
    /// Line numbers are 0-based rope lines: `first` is the last line both ropes share up to its
    /// start, `old_last` held the end of the removed text and `new_last` holds the end of the
    /// inserted text. Lines after `first` up to `old_last` disappear; `new_last - first` lines
    /// appear after `first`.
    fn update_heights(&mut self, first: usize, old_last: usize, new_last: usize) -> DocumentResult<()> {
        // HeightTree lines are 1-based, so rope line `first` is tree line `first + 1`.
        for _ in first..old_last {
            self.heights.remove_line(first + 2)?;
        }
        for added in 0..new_last.saturating_sub(first) {
            self.heights.insert_line_after(first + 1 + added)?;
        }
        debug_assert_eq!(self.heights.line_count(), self.rope.len_lines());
        Ok(())
    }

    fn take_event(&mut self) -> Option<DocumentChangeEvent> {
        if self.pending.is_empty() {
            return None;
        }
        Some(DocumentChangeEvent {
            before_length: self.batch_before_length,
            after_length: self.rope.len_chars(),
            changes: std::mem::take(&mut self.pending),
            deleted_segments: std::mem::take(&mut self.pending_deleted),
            version: self.version,
        })
    }
}

/// 0-based line containing `offset`. An offset between `\r` and `\n` belongs to the line the
/// pair ends.
fn line_of(rope: &Rope, offset: usize) -> usize {
    let inside_crlf = offset > 0
        && rope.get_char(offset - 1) == Some('\r')
        && rope.get_char(offset) == Some('\n');
    if inside_crlf {
        rope.char_to_line(offset - 1)
    } else {
        rope.char_to_line(offset)
    }
}

/// Undo entry for one applied [`DocumentChange`].
#[derive(Debug)]
struct DocumentChangeOperation {
    change: DocumentChange,
}

impl UndoableOperation<DocumentBuffer> for DocumentChangeOperation {
    fn undo(&self, target: &mut DocumentBuffer) -> DocumentResult<()> {
        target.apply(&self.change.invert())
    }

    fn redo(&self, target: &mut DocumentBuffer) -> DocumentResult<()> {
        target.apply(&self.change)
    }
}

/// An editable text document.
///
/// All offsets are character offsets; line numbers and columns are 1-based. The document is
/// not internally synchronized: mutate it from one thread and hand [`TextDocument::snapshot`]s
/// to other threads.
pub struct TextDocument {
    buffer: DocumentBuffer,
    undo_stack: UndoStack<DocumentBuffer>,
    read_only_mode: ReadOnlyMode,
    update_depth: usize,
    subscribers: Vec<(Subscription, ChangeCallback)>,
    next_subscription: u64,
    options: DocumentOptions,
}

impl TextDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::with_options("", DocumentOptions::default())
    }

    /// Create a document holding `text`.
    pub fn from_text(text: &str) -> Self {
        Self::with_options(text, DocumentOptions::default())
    }

    /// Create a document holding `text` with explicit options.
    pub fn with_options(text: &str, options: DocumentOptions) -> Self {
        Self {
            buffer: DocumentBuffer::new(text, options.default_line_height),
            undo_stack: UndoStack::with_size_limit(options.undo_limit),
            read_only_mode: ReadOnlyMode::None,
            update_depth: 0,
            subscribers: Vec::new(),
            next_subscription: 0,
            options,
        }
    }

    /// Options the document was created with.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    // ---------------------------------------------------------------- text

    /// The complete text.
    pub fn text(&self) -> String {
        self.buffer.rope.to_string()
    }

    /// Number of characters.
    pub fn text_length(&self) -> usize {
        self.buffer.rope.len_chars()
    }

    /// Character at `offset`, or `None` past the end.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.buffer.rope.get_char(offset)
    }

    /// Text of `[offset, offset + length)`.
    pub fn text_slice(&self, offset: usize, length: usize) -> DocumentResult<String> {
        self.check_range(offset, length)?;
        Ok(self.buffer.rope.slice(offset..offset + length).to_string())
    }

    /// Version counter; every applied change (including undo and redo) increments it.
    pub fn version(&self) -> u64 {
        self.buffer.version
    }

    /// O(1) immutable copy of the current text.
    pub fn snapshot(&self) -> TextSnapshot {
        TextSnapshot::new(self.buffer.rope.clone(), self.buffer.version)
    }

    fn check_offset(&self, offset: usize) -> DocumentResult<()> {
        let text_length = self.text_length();
        if offset > text_length {
            return Err(DocumentError::OffsetOutOfRange {
                offset,
                text_length,
            });
        }
        Ok(())
    }

    fn check_range(&self, offset: usize, length: usize) -> DocumentResult<()> {
        let text_length = self.text_length();
        match offset.checked_add(length) {
            Some(end) if end <= text_length => Ok(()),
            _ => Err(DocumentError::RangeOutOfBounds {
                offset,
                length,
                text_length,
            }),
        }
    }

    // ---------------------------------------------------------------- lines

    /// Number of lines. An empty document has one line.
    pub fn line_count(&self) -> usize {
        self.buffer.rope.len_lines()
    }

    /// Line by 1-based number.
    pub fn line_by_number(&self, line_number: usize) -> DocumentResult<DocumentLine> {
        let line_count = self.line_count();
        if line_number == 0 || line_number > line_count {
            return Err(DocumentError::LineNumberOutOfRange {
                line: line_number,
                line_count,
            });
        }
        let rope = &self.buffer.rope;
        let offset = rope.line_to_char(line_number - 1);
        let line = rope.line(line_number - 1);
        let total = line.len_chars();
        let delimiter_length = match (
            total.checked_sub(2).and_then(|i| line.get_char(i)),
            total.checked_sub(1).and_then(|i| line.get_char(i)),
        ) {
            (Some('\r'), Some('\n')) => 2,
            (_, Some('\n' | '\r')) => 1,
            _ => 0,
        };
        Ok(DocumentLine {
            line_number,
            offset,
            length: total - delimiter_length,
            delimiter_length,
        })
    }

    /// Line containing `offset`. An offset inside a delimiter belongs to the line it ends.
    pub fn line_by_offset(&self, offset: usize) -> DocumentResult<DocumentLine> {
        self.check_offset(offset)?;
        self.line_by_number(line_of(&self.buffer.rope, offset) + 1)
    }

    /// Text of a line, without its delimiter.
    pub fn line_text(&self, line_number: usize) -> DocumentResult<String> {
        let line = self.line_by_number(line_number)?;
        Ok(self
            .buffer
            .rope
            .slice(line.offset..line.end_offset())
            .to_string())
    }

    /// Iterate over all lines.
    pub fn lines(&self) -> impl Iterator<Item = DocumentLine> + '_ {
        (1..=self.line_count()).filter_map(|n| self.line_by_number(n).ok())
    }

    /// Offset of a location. Column `length + 1` addresses the end of the line.
    pub fn offset_of(&self, location: TextLocation) -> DocumentResult<usize> {
        let line = self.line_by_number(location.line)?;
        if location.column == 0 || location.column > line.length + 1 {
            return Err(DocumentError::LocationOutOfRange {
                line: location.line,
                column: location.column,
            });
        }
        Ok(line.offset + location.column - 1)
    }

    /// Location of an offset.
    pub fn location_of(&self, offset: usize) -> DocumentResult<TextLocation> {
        let line = self.line_by_offset(offset)?;
        Ok(TextLocation::new(line.line_number, offset - line.offset + 1))
    }

    // ---------------------------------------------------------------- editing

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> DocumentResult<DocumentChange> {
        self.replace(offset, 0, text)
    }

    /// Remove `length` characters at `offset`.
    pub fn remove(&mut self, offset: usize, length: usize) -> DocumentResult<DocumentChange> {
        self.replace(offset, length, "")
    }

    /// Replace `length` characters at `offset` with `text`.
    ///
    /// Arguments are validated before anything is modified. Replacing nothing with nothing is a
    /// no-op that returns an empty change.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> DocumentResult<DocumentChange> {
        self.check_range(offset, length).inspect_err(|err| {
            warn!(error = %err, "edit rejected");
        })?;
        let removed = self.buffer.rope.slice(offset..offset + length).to_string();
        let change = DocumentChange::new(offset, removed, text)
            .with_default_before_insertion(self.options.default_movement_before_insertion);
        if change.is_empty() {
            return Ok(change);
        }
        self.buffer.apply(&change)?;
        self.undo_stack.push(Box::new(DocumentChangeOperation {
            change: change.clone(),
        }));
        self.flush_if_idle();
        Ok(change)
    }

    // ---------------------------------------------------------------- read-only sections

    /// Current read-only mode.
    pub fn read_only_mode(&self) -> ReadOnlyMode {
        self.read_only_mode
    }

    /// Select the read-only provider consulted by the checked editing methods.
    pub fn set_read_only_mode(&mut self, mode: ReadOnlyMode) {
        self.read_only_mode = mode;
    }

    fn read_only_provider(&self) -> &dyn ReadOnlySectionProvider {
        match self.read_only_mode {
            ReadOnlyMode::None => &NoReadOnlySections,
            ReadOnlyMode::Document => &ReadOnlyDocument,
            ReadOnlyMode::Layer(layer) => match self.buffer.layers.get(&layer) {
                Some(collection) => collection,
                None => &NoReadOnlySections,
            },
        }
    }

    /// Returns `true` if the read-only provider allows inserting at `offset`.
    pub fn can_insert(&self, offset: usize) -> bool {
        self.read_only_provider().can_insert(offset)
    }

    /// Parts of `[offset, offset + length)` that the read-only provider allows deleting.
    pub fn deletable_segments(&self, offset: usize, length: usize) -> DocumentResult<Vec<SimpleSegment>> {
        self.check_range(offset, length)?;
        let requested = SimpleSegment::new(offset, length);
        let deletable = self.read_only_provider().deletable_segments(requested);
        if !validate_deletable_segments(requested, &deletable) {
            return Err(DocumentError::InvalidDeletableSegments);
        }
        Ok(deletable)
    }

    /// Insert `text` at `offset` unless the offset is read-only.
    pub fn insert_checked(&mut self, offset: usize, text: &str) -> DocumentResult<DocumentChange> {
        self.check_offset(offset)?;
        if !self.can_insert(offset) {
            return Err(DocumentError::ReadOnly { offset });
        }
        self.insert(offset, text)
    }

    /// Remove the deletable parts of `[offset, offset + length)` as one undo step.
    ///
    /// Returns the applied changes in the order they were applied (back to front).
    pub fn remove_deletable(&mut self, offset: usize, length: usize) -> DocumentResult<Vec<DocumentChange>> {
        let deletable = self.deletable_segments(offset, length)?;
        let mut changes = Vec::with_capacity(deletable.len());
        let mut update = self.run_update();
        for segment in deletable.iter().rev().filter(|s| !s.is_empty()) {
            changes.push(update.remove(segment.offset, segment.length)?);
        }
        Ok(changes)
    }

    // ---------------------------------------------------------------- segment layers

    /// Create (or reconfigure) a segment layer.
    pub fn create_layer(&mut self, layer: SegmentLayerId, policy: DeletionPolicy) {
        self.buffer
            .layers
            .entry(layer)
            .or_default()
            .set_deletion_policy(policy);
    }

    /// Add a segment to a layer, creating the layer if needed.
    pub fn add_segment(
        &mut self,
        layer: SegmentLayerId,
        offset: usize,
        length: usize,
        style: StyleId,
    ) -> DocumentResult<SegmentId> {
        self.check_range(offset, length)?;
        Ok(self
            .buffer
            .layers
            .entry(layer)
            .or_default()
            .add(offset, length, style))
    }

    /// Remove a segment from a layer. Returns `false` if it was not there.
    pub fn remove_segment(&mut self, layer: SegmentLayerId, id: SegmentId) -> bool {
        self.buffer
            .layers
            .get_mut(&layer)
            .and_then(|collection| collection.remove(id))
            .is_some()
    }

    /// Segments of a layer.
    pub fn layer(&self, layer: SegmentLayerId) -> Option<&TextSegmentCollection<StyleId>> {
        self.buffer.layers.get(&layer)
    }

    /// Remove every segment of a layer.
    pub fn clear_layer(&mut self, layer: SegmentLayerId) {
        if let Some(collection) = self.buffer.layers.get_mut(&layer) {
            collection.clear();
        }
    }

    // ---------------------------------------------------------------- heights

    /// Line heights and collapsed sections.
    pub fn heights(&self) -> &HeightTree {
        &self.buffer.heights
    }

    /// Set the visual height of a line.
    pub fn set_line_height(&mut self, line: usize, height: f64) -> DocumentResult<()> {
        self.buffer.heights.set_height(line, height)
    }

    /// Collapse the lines `start..=end`.
    pub fn collapse_lines(&mut self, start: usize, end: usize) -> DocumentResult<CollapsedLineSection> {
        self.buffer.heights.collapse(start, end)
    }

    /// End a collapsed section. Returns `false` if it had already ended.
    pub fn uncollapse_lines(&mut self, section: CollapsedLineSection) -> DocumentResult<bool> {
        self.buffer.heights.uncollapse(section)
    }

    // ---------------------------------------------------------------- anchors

    /// Create an anchor at `offset` that does not survive deletion of its text.
    pub fn create_anchor(&mut self, offset: usize, movement: AnchorMovementType) -> DocumentResult<AnchorId> {
        self.create_anchor_with(offset, movement, false)
    }

    /// Create an anchor at `offset`.
    pub fn create_anchor_with(
        &mut self,
        offset: usize,
        movement: AnchorMovementType,
        survive_deletion: bool,
    ) -> DocumentResult<AnchorId> {
        self.check_offset(offset)?;
        Ok(self.buffer.anchors.create(offset, movement, survive_deletion))
    }

    /// Look up an anchor. `None` after [`TextDocument::release_anchor`].
    pub fn anchor(&self, id: AnchorId) -> Option<&TextAnchor> {
        self.buffer.anchors.get(id)
    }

    /// Location of a live anchor.
    pub fn anchor_location(&self, id: AnchorId) -> Option<TextLocation> {
        let anchor = self.anchor(id).filter(|a| !a.is_deleted())?;
        self.location_of(anchor.offset()).ok()
    }

    /// Stop tracking an anchor. Returns `false` if it was already released.
    pub fn release_anchor(&mut self, id: AnchorId) -> bool {
        self.buffer.anchors.release(id)
    }

    /// Number of tracked anchors.
    pub fn anchor_count(&self) -> usize {
        self.buffer.anchors.len()
    }

    // ---------------------------------------------------------------- updates & notifications

    /// Register a change callback.
    ///
    /// Callbacks run after each edit, undo or redo outside of an update, and once at the end of
    /// the outermost update otherwise.
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&DocumentChangeEvent) + Send + 'static,
    {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((subscription, Box::new(callback)));
        subscription
    }

    /// Remove a change callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != subscription);
        self.subscribers.len() != before
    }

    /// Returns `true` while an update is open.
    pub fn is_in_update(&self) -> bool {
        self.update_depth > 0
    }

    /// Open an update: notifications are deferred and edits form one undo step until the
    /// matching [`TextDocument::end_update`].
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
        self.undo_stack.start_undo_group();
    }

    /// Close an update. The outermost one delivers the deferred notification.
    pub fn end_update(&mut self) -> DocumentResult<()> {
        if self.update_depth == 0 {
            return Err(DocumentError::NotInUpdate);
        }
        self.update_depth -= 1;
        let result = self.undo_stack.end_undo_group();
        self.flush_if_idle();
        result
    }

    /// Open an update that ends when the returned guard is dropped, also during unwinding.
    pub fn run_update(&mut self) -> DocumentUpdate<'_> {
        self.begin_update();
        DocumentUpdate { document: self }
    }

    fn flush_if_idle(&mut self) {
        if self.update_depth > 0 {
            return;
        }
        let Some(event) = self.buffer.take_event() else {
            return;
        };
        debug!(
            changes = event.changes.len(),
            deleted_segments = event.deleted_segments.len(),
            version = event.version,
            "notifying subscribers"
        );
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
    }

    // ---------------------------------------------------------------- undo

    /// The undo history.
    pub fn undo_stack(&self) -> &UndoStack<DocumentBuffer> {
        &self.undo_stack
    }

    /// Mutable access to the undo history, for grouping and optional entries.
    pub fn undo_stack_mut(&mut self) -> &mut UndoStack<DocumentBuffer> {
        &mut self.undo_stack
    }

    /// Undo the most recent undo unit. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> DocumentResult<bool> {
        let result = self.undo_stack.undo(&mut self.buffer);
        self.flush_if_idle();
        result
    }

    /// Redo the most recently undone unit. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> DocumentResult<bool> {
        let result = self.undo_stack.redo(&mut self.buffer);
        self.flush_if_idle();
        result
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDocument")
            .field("text_length", &self.text_length())
            .field("line_count", &self.line_count())
            .field("version", &self.buffer.version)
            .field("update_depth", &self.update_depth)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl TextSource for TextDocument {
    fn text_length(&self) -> usize {
        self.buffer.rope.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.buffer.rope.get_char(offset)
    }

    fn text_slice(&self, offset: usize, length: usize) -> Cow<'_, str> {
        TextSource::text_slice(&self.buffer.rope, offset, length)
    }
}

/// An open update; see [`TextDocument::run_update`].
pub struct DocumentUpdate<'a> {
    document: &'a mut TextDocument,
}

impl Deref for DocumentUpdate<'_> {
    type Target = TextDocument;

    fn deref(&self) -> &TextDocument {
        self.document
    }
}

impl DerefMut for DocumentUpdate<'_> {
    fn deref_mut(&mut self) -> &mut TextDocument {
        self.document
    }
}

impl Drop for DocumentUpdate<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.document.end_update() {
            warn!(error = %err, "closing document update failed");
        }
    }
}
