//! Byte storage behind a hex editor.
//!
//! [`BinaryDocument`] is the seam between the editing session and wherever the bytes live
//! (memory, a memory-mapped file, a device). [`MemoryBinaryDocument`] is the in-memory
//! implementation used by default.

use crate::bit_range::BitRange;
use crate::error::{BinaryDocumentError, HexResult};
use std::ops::Range;
use tracing::debug;

/// Byte-level access to an editable binary document.
///
/// Offsets are byte indices. Every operation checks its arguments before modifying anything.
pub trait BinaryDocument {
    /// Number of bytes.
    fn len(&self) -> u64;

    /// Returns `true` if the document holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if no operation may modify the document.
    fn is_read_only(&self) -> bool;

    /// Returns `true` if [`BinaryDocument::insert_bytes`] is supported right now.
    fn can_insert(&self) -> bool;

    /// Returns `true` if [`BinaryDocument::remove_bytes`] is supported right now.
    fn can_remove(&self) -> bool;

    /// Fill `buffer` with the bytes starting at `offset`.
    fn read_bytes(&self, offset: u64, buffer: &mut [u8]) -> HexResult<()>;

    /// Overwrite `bytes.len()` bytes starting at `offset`.
    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> HexResult<()>;

    /// Insert `bytes` before `offset` (`offset == len()` appends).
    fn insert_bytes(&mut self, offset: u64, bytes: &[u8]) -> HexResult<()>;

    /// Remove `count` bytes starting at `offset`.
    fn remove_bytes(&mut self, offset: u64, count: u64) -> HexResult<()>;

    /// Read a single byte.
    fn read_byte(&self, offset: u64) -> HexResult<u8> {
        let mut byte = [0u8; 1];
        self.read_bytes(offset, &mut byte)?;
        Ok(byte[0])
    }

    /// The bits that exist in the document.
    fn valid_range(&self) -> BitRange {
        BitRange::from_bytes(0, self.len())
    }

    /// The part of `range` that a removal would actually delete.
    ///
    /// Removal works on whole bytes, so partially covered bytes are included. Returns `None`
    /// when the document cannot remove bytes or the range covers no existing byte.
    fn deletable_range(&self, range: &BitRange) -> Option<BitRange> {
        if self.is_read_only() || !self.can_remove() || range.is_empty() {
            return None;
        }
        range.align_to_bytes().intersect(&self.valid_range())
    }
}

/// A [`BinaryDocument`] backed by a `Vec<u8>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBinaryDocument {
    bytes: Vec<u8>,
    read_only: bool,
    resizable: bool,
}

impl Default for MemoryBinaryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBinaryDocument {
    /// An empty, writable, resizable document.
    pub fn new() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// A writable, resizable document holding `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            read_only: false,
            resizable: true,
        }
    }

    /// Forbid all modifications.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Allow overwriting but neither inserting nor removing bytes.
    pub fn fixed_size(mut self) -> Self {
        self.resizable = false;
        self
    }

    /// Toggle read-only mode.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// The current bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the document and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Convert a checked byte range into slice indices.
    fn byte_range(&self, offset: u64, length: u64) -> HexResult<Range<usize>> {
        let out_of_bounds = || BinaryDocumentError::OutOfBounds {
            offset,
            length,
            document_length: self.len(),
        };
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= self.len())
            .ok_or_else(out_of_bounds)?;
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let end = usize::try_from(end).map_err(|_| out_of_bounds())?;
        Ok(start..end)
    }

    fn check_writable(&self) -> HexResult<()> {
        if self.read_only {
            Err(BinaryDocumentError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl BinaryDocument for MemoryBinaryDocument {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn can_insert(&self) -> bool {
        !self.read_only && self.resizable
    }

    fn can_remove(&self) -> bool {
        !self.read_only && self.resizable
    }

    fn read_bytes(&self, offset: u64, buffer: &mut [u8]) -> HexResult<()> {
        let range = self.byte_range(offset, buffer.len() as u64)?;
        buffer.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> HexResult<()> {
        self.check_writable()?;
        let range = self.byte_range(offset, bytes.len() as u64)?;
        self.bytes[range].copy_from_slice(bytes);
        debug!(offset, count = bytes.len(), "bytes written");
        Ok(())
    }

    fn insert_bytes(&mut self, offset: u64, bytes: &[u8]) -> HexResult<()> {
        self.check_writable()?;
        if !self.resizable {
            return Err(BinaryDocumentError::InsertNotSupported);
        }
        let at = self.byte_range(offset, 0)?.start;
        self.bytes.splice(at..at, bytes.iter().copied());
        debug!(offset, count = bytes.len(), "bytes inserted");
        Ok(())
    }

    fn remove_bytes(&mut self, offset: u64, count: u64) -> HexResult<()> {
        self.check_writable()?;
        if !self.resizable {
            return Err(BinaryDocumentError::RemoveNotSupported);
        }
        let range = self.byte_range(offset, count)?;
        self.bytes.drain(range);
        debug!(offset, count, "bytes removed");
        Ok(())
    }
}
