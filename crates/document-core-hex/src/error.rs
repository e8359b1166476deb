//! Error types.

use crate::bit_location::BitLocation;

/// Result alias for binary document and hex editing operations.
pub type HexResult<T> = Result<T, BinaryDocumentError>;

/// Errors reported by [`crate::BinaryDocument`] implementations and [`crate::HexEditor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BinaryDocumentError {
    /// A byte range does not fit into the document.
    #[error("byte range (offset {offset}, length {length}) exceeds the document length {document_length}")]
    OutOfBounds {
        /// Requested start byte.
        offset: u64,
        /// Requested number of bytes.
        length: u64,
        /// Document length at the time of the call.
        document_length: u64,
    },

    /// The document cannot be modified.
    #[error("the document is read-only")]
    ReadOnly,

    /// The document has a fixed size and cannot grow.
    #[error("the document does not support inserting bytes")]
    InsertNotSupported,

    /// The document has a fixed size and cannot shrink.
    #[error("the document does not support removing bytes")]
    RemoveNotSupported,

    /// A bit index outside `0..8`.
    #[error("bit index {0} is outside 0..8")]
    InvalidBitIndex(u8),

    /// A nibble value outside `0..16`.
    #[error("nibble value {0:#x} is outside 0..16")]
    InvalidNibble(u8),

    /// A caret location outside the document.
    #[error("location {location} is outside the document (length {document_length})")]
    LocationOutOfRange {
        /// Rejected location.
        location: BitLocation,
        /// Document length at the time of the call.
        document_length: u64,
    },

    /// `bytes_per_line` must be at least one.
    #[error("bytes per line must be at least 1")]
    InvalidBytesPerLine,
}
