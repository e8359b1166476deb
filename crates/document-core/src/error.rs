//! Error types.

/// Result alias for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors reported by [`crate::TextDocument`], [`crate::HeightTree`] and [`crate::UndoStack`].
///
/// Argument errors are reported before anything is modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// An offset lies outside `[0, text_length]`.
    #[error("offset {offset} is outside the document (length {text_length})")]
    OffsetOutOfRange {
        /// Requested offset.
        offset: usize,
        /// Document length at the time of the call.
        text_length: usize,
    },

    /// A range `[offset, offset + length)` does not fit into the document.
    #[error("range (offset {offset}, length {length}) exceeds the document length {text_length}")]
    RangeOutOfBounds {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        length: usize,
        /// Document length at the time of the call.
        text_length: usize,
    },

    /// A line number lies outside `[1, line_count]`.
    #[error("line {line} is outside the document ({line_count} lines)")]
    LineNumberOutOfRange {
        /// Requested 1-based line number.
        line: usize,
        /// Number of lines in the document.
        line_count: usize,
    },

    /// A column lies outside the line.
    #[error("column {column} is outside line {line}")]
    LocationOutOfRange {
        /// 1-based line number.
        line: usize,
        /// 1-based column.
        column: usize,
    },

    /// A line range whose start lies after its end.
    #[error("line range {start}..={end} is empty")]
    InvalidLineRange {
        /// 1-based first line.
        start: usize,
        /// 1-based last line.
        end: usize,
    },

    /// A line height that is negative or not a number.
    #[error("line height must be a non-negative number")]
    InvalidHeight,

    /// Undo or redo was requested while an undo group is still open.
    #[error("no undo group should be open at this point")]
    UndoGroupOpen,

    /// `end_undo_group` was called without a matching start.
    #[error("there are no open undo groups")]
    NoOpenUndoGroup,

    /// Optional undo entries can only be pushed inside a group.
    #[error("cannot push an optional undo entry outside of an undo group")]
    OptionalOutsideGroup,

    /// An insertion hit a read-only section.
    #[error("offset {offset} is inside a read-only section")]
    ReadOnly {
        /// Offset of the rejected insertion.
        offset: usize,
    },

    /// A read-only section provider returned unordered or overlapping deletable segments.
    #[error("deletable segments must be ascending, non-overlapping and inside the requested range")]
    InvalidDeletableSegments,

    /// A collapsed section handle does not belong to this height tree.
    #[error("unknown collapsed section")]
    UnknownSection,

    /// `end_update` was called without a matching `begin_update`.
    #[error("no document update is in progress")]
    NotInUpdate,
}

/// Errors reported by search strategies.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// The pattern did not compile.
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
