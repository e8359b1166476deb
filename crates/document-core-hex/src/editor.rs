//! Hex editing session.
//!
//! [`HexEditor`] owns a [`BinaryDocument`] together with a caret and an optional selection
//! anchor. The caret moves in nibble steps: bit 0 addresses the high hex digit of a byte and
//! bit 4 the low one. Every edit goes through [`HexEditor::insert_bytes`] or
//! [`HexEditor::remove_bytes`], which keep the caret and the anchor in place according to
//! [`crate::caret`].
//!
//! # Example
//!
//! ```rust
//! use document_core_hex::{EditingMode, HexEditor, HexEditorOptions, MemoryBinaryDocument};
//!
//! let doc = MemoryBinaryDocument::from_bytes(vec![0x00, 0x11]);
//! let mut editor = HexEditor::new(doc, HexEditorOptions::default()).unwrap();
//! editor.type_nibble(0xa).unwrap();
//! editor.type_nibble(0xb).unwrap();
//! assert_eq!(editor.document().as_bytes(), &[0xab, 0x11]);
//!
//! editor.set_mode(EditingMode::Insert);
//! editor.type_nibble(0xc).unwrap();
//! assert_eq!(editor.document().as_bytes(), &[0xab, 0xc0, 0x11]);
//! ```

use crate::bit_location::{BITS_PER_NIBBLE, BitLocation};
use crate::bit_range::BitRange;
use crate::caret::{EditingMode, caret_after_removal, location_after_insertion, location_after_removal};
use crate::document::{BinaryDocument, MemoryBinaryDocument};
use crate::error::{BinaryDocumentError, HexResult};
use crate::options::HexEditorOptions;
use tracing::{debug, warn};

const MAX_NIBBLE: u8 = 0x0f;

/// A binary document plus caret, selection and editing mode.
#[derive(Debug, Clone)]
pub struct HexEditor<D: BinaryDocument = MemoryBinaryDocument> {
    document: D,
    bytes_per_line: u64,
    mode: EditingMode,
    caret: BitLocation,
    anchor: Option<BitLocation>,
}

impl<D: BinaryDocument> HexEditor<D> {
    /// Start editing `document` with the caret at its first byte.
    pub fn new(document: D, options: HexEditorOptions) -> HexResult<Self> {
        if options.bytes_per_line == 0 {
            return Err(BinaryDocumentError::InvalidBytesPerLine);
        }
        Ok(Self {
            document,
            bytes_per_line: options.bytes_per_line as u64,
            mode: options.mode,
            caret: BitLocation::MIN,
            anchor: None,
        })
    }

    /// The edited document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Stop editing and return the document.
    pub fn into_document(self) -> D {
        self.document
    }

    /// Current editing mode.
    pub fn mode(&self) -> EditingMode {
        self.mode
    }

    /// Switch between insert and overwrite mode.
    pub fn set_mode(&mut self, mode: EditingMode) {
        if self.mode != mode {
            debug!(?mode, "editing mode changed");
        }
        self.mode = mode;
    }

    /// Bytes per visual line.
    pub fn bytes_per_line(&self) -> u64 {
        self.bytes_per_line
    }

    /// Current caret location.
    pub fn caret(&self) -> BitLocation {
        self.caret
    }

    /// The selected range; empty at the caret when nothing is selected.
    pub fn selection(&self) -> BitRange {
        match self.anchor {
            Some(anchor) => BitRange::new(anchor, self.caret),
            None => BitRange::empty(self.caret),
        }
    }

    /// Returns `true` if the selection covers at least one bit.
    pub fn has_selection(&self) -> bool {
        !self.selection().is_empty()
    }

    /// Move the caret to `location`, optionally extending the selection.
    ///
    /// Any location up to the end of the document is accepted.
    pub fn set_caret(&mut self, location: BitLocation, extend_selection: bool) -> HexResult<()> {
        self.check_location(location)?;
        self.place_caret(location, extend_selection);
        Ok(())
    }

    /// Select `range`, leaving the caret at its end.
    pub fn select(&mut self, range: BitRange) -> HexResult<()> {
        self.check_location(range.start())?;
        self.check_location(range.end())?;
        self.anchor = Some(range.start());
        self.caret = range.end();
        Ok(())
    }

    /// Drop the selection, keeping the caret.
    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Zero-based visual line of `location`.
    pub fn line_of(&self, location: BitLocation) -> u64 {
        location.byte_index() / self.bytes_per_line
    }

    /// Number of visual lines, including the line the caret reaches past the last byte.
    pub fn line_count(&self) -> u64 {
        self.line_of(self.caret_limit()) + 1
    }

    /// Insert `bytes` at byte `offset`, moving the caret and the anchor along.
    pub fn insert_bytes(&mut self, offset: u64, bytes: &[u8]) -> HexResult<()> {
        self.document.insert_bytes(offset, bytes)?;
        let count = bytes.len() as u64;
        self.caret = location_after_insertion(self.caret, offset, count);
        self.anchor = self
            .anchor
            .map(|anchor| location_after_insertion(anchor, offset, count));
        Ok(())
    }

    /// Remove `count` bytes at `offset`, moving the caret and the anchor along.
    pub fn remove_bytes(&mut self, offset: u64, count: u64) -> HexResult<()> {
        self.document.remove_bytes(offset, count)?;
        self.caret = caret_after_removal(self.caret, offset, count, self.document.len());
        self.anchor = self
            .anchor
            .map(|anchor| location_after_removal(anchor, offset, count));
        Ok(())
    }

    /// Type one hex digit at the caret.
    ///
    /// In overwrite mode the nibble under the caret is replaced. In insert mode, typing on a
    /// high nibble inserts a new byte holding the digit, and typing on a low nibble completes
    /// that byte. Typing at the end of the document appends a byte in either mode.
    pub fn type_nibble(&mut self, value: u8) -> HexResult<()> {
        if value > MAX_NIBBLE {
            return Err(BinaryDocumentError::InvalidNibble(value));
        }
        if self.document.is_read_only() {
            return Err(BinaryDocumentError::ReadOnly);
        }

        let byte = self.caret.byte_index();
        let high = self.caret.bit_index() < BITS_PER_NIBBLE;
        let append = byte >= self.document.len();
        if append || (self.mode == EditingMode::Insert && high) {
            if !self.document.can_insert() {
                return Err(BinaryDocumentError::InsertNotSupported);
            }
            self.insert_bytes(byte, &[value << BITS_PER_NIBBLE])?;
            self.caret = low_nibble(byte);
        } else {
            let old = self.document.read_byte(byte)?;
            let new = if high {
                (old & MAX_NIBBLE) | (value << BITS_PER_NIBBLE)
            } else {
                (old & !MAX_NIBBLE) | value
            };
            self.document.write_bytes(byte, &[new])?;
            self.caret = if high {
                low_nibble(byte)
            } else {
                BitLocation::at_byte(byte.saturating_add(1)).min(self.caret_limit())
            };
        }
        self.anchor = None;
        Ok(())
    }

    /// Delete the selection, or the byte under the caret.
    pub fn delete(&mut self) -> HexResult<()> {
        if self.has_selection() {
            return self.delete_selection();
        }
        let byte = self.caret.byte_index();
        if byte >= self.document.len() {
            return Ok(());
        }
        self.remove_bytes(byte, 1)
    }

    /// Delete the selection, or the byte before the caret.
    ///
    /// A caret inside a byte counts as being after that byte's start, so the byte itself goes.
    pub fn backspace(&mut self) -> HexResult<()> {
        if self.has_selection() {
            return self.delete_selection();
        }
        let byte = self.caret.byte_index();
        let target = if self.caret.is_byte_aligned() {
            match byte.checked_sub(1) {
                Some(previous) => previous,
                None => return Ok(()),
            }
        } else {
            byte
        };
        self.remove_bytes(target, 1)
    }

    /// Delete every byte the selection touches and collapse the selection.
    ///
    /// The bytes removed are the document's deletable range for the selection.
    pub fn delete_selection(&mut self) -> HexResult<()> {
        let selection = self.selection();
        if selection.is_empty() {
            return Ok(());
        }
        if self.document.is_read_only() {
            return Err(BinaryDocumentError::ReadOnly);
        }
        if !self.document.can_remove() {
            return Err(BinaryDocumentError::RemoveNotSupported);
        }
        match self.document.deletable_range(&selection) {
            Some(range) => {
                let offset = range.start().byte_index();
                let count = range.byte_length();
                if let Err(err) = self.remove_bytes(offset, count) {
                    warn!(error = %err, %selection, "deleting the selection failed");
                    return Err(err);
                }
                debug!(offset, count, "selection deleted");
            }
            None => self.caret = selection.start(),
        }
        self.anchor = None;
        Ok(())
    }

    /// Move one nibble to the right.
    pub fn move_right(&mut self, extend_selection: bool) {
        let target = if self.caret.bit_index() < BITS_PER_NIBBLE {
            low_nibble(self.caret.byte_index())
        } else {
            self.caret.next_or_max()
        };
        self.place_caret(target, extend_selection);
    }

    /// Move one nibble to the left.
    pub fn move_left(&mut self, extend_selection: bool) {
        let byte = self.caret.byte_index();
        let bit = self.caret.bit_index();
        let target = if bit > BITS_PER_NIBBLE {
            low_nibble(byte)
        } else if bit > 0 {
            self.caret.align_down()
        } else {
            match byte.checked_sub(1) {
                Some(previous) => low_nibble(previous),
                None => BitLocation::MIN,
            }
        };
        self.place_caret(target, extend_selection);
    }

    /// Move one line up, keeping the column. Does nothing on the first line.
    pub fn move_up(&mut self, extend_selection: bool) {
        let target = match self.caret.byte_index().checked_sub(self.bytes_per_line) {
            Some(byte) => self.caret.with_byte_index(byte),
            None => self.caret,
        };
        self.place_caret(target, extend_selection);
    }

    /// Move one line down, keeping the column where the next line is long enough.
    pub fn move_down(&mut self, extend_selection: bool) {
        let byte = self.caret.byte_index().saturating_add(self.bytes_per_line);
        self.place_caret(self.caret.with_byte_index(byte), extend_selection);
    }

    /// Move to the first nibble of the caret's line.
    pub fn move_to_line_start(&mut self, extend_selection: bool) {
        let start = self.line_of(self.caret) * self.bytes_per_line;
        self.place_caret(BitLocation::at_byte(start), extend_selection);
    }

    /// Move to the last nibble of the caret's line.
    pub fn move_to_line_end(&mut self, extend_selection: bool) {
        let start = self.line_of(self.caret) * self.bytes_per_line;
        let last = start.saturating_add(self.bytes_per_line - 1);
        self.place_caret(low_nibble(last), extend_selection);
    }

    /// Move to the start of the document.
    pub fn move_to_document_start(&mut self, extend_selection: bool) {
        self.place_caret(BitLocation::MIN, extend_selection);
    }

    /// Move to the last caret location of the document.
    pub fn move_to_document_end(&mut self, extend_selection: bool) {
        self.place_caret(self.caret_limit(), extend_selection);
    }

    /// The furthest location navigation may reach: past the last byte when bytes can be
    /// appended, otherwise the last nibble.
    fn caret_limit(&self) -> BitLocation {
        let len = self.document.len();
        if self.document.can_insert() {
            BitLocation::at_byte(len)
        } else {
            match len.checked_sub(1) {
                Some(last) => low_nibble(last),
                None => BitLocation::MIN,
            }
        }
    }

    fn check_location(&self, location: BitLocation) -> HexResult<()> {
        let document_length = self.document.len();
        if location > BitLocation::at_byte(document_length) {
            return Err(BinaryDocumentError::LocationOutOfRange {
                location,
                document_length,
            });
        }
        Ok(())
    }

    fn place_caret(&mut self, target: BitLocation, extend_selection: bool) {
        if extend_selection {
            self.anchor.get_or_insert(self.caret);
        } else {
            self.anchor = None;
        }
        self.caret = target.clamp_to(BitLocation::MIN, self.caret_limit());
    }
}

fn low_nibble(byte: u64) -> BitLocation {
    BitLocation::at_byte(byte).add_bits(u64::from(BITS_PER_NIBBLE))
}
