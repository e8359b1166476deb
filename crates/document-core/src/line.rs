//! Logical lines and text locations.

use crate::segment::Segment;
use serde::{Deserialize, Serialize};

/// A logical line of a [`crate::TextDocument`].
///
/// Lines are values computed from the document's line index at query time; they are not
/// updated when the document changes. Line numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentLine {
    /// 1-based line number.
    pub line_number: usize,
    /// Offset of the first character of the line.
    pub offset: usize,
    /// Length of the line, excluding the delimiter.
    pub length: usize,
    /// Length of the delimiter: 0 for the last line, 1 for `\n` or `\r`, 2 for `\r\n`.
    pub delimiter_length: usize,
}

impl DocumentLine {
    /// Offset just past the line content (where the delimiter starts).
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Length including the delimiter.
    pub fn total_length(&self) -> usize {
        self.length + self.delimiter_length
    }

    /// Returns `true` for the last line of the document (the only one without a delimiter).
    pub fn is_last(&self) -> bool {
        self.delimiter_length == 0
    }

    /// Number of the following line, if any.
    pub fn next_line_number(&self) -> Option<usize> {
        (!self.is_last()).then_some(self.line_number + 1)
    }

    /// Number of the preceding line, if any.
    pub fn previous_line_number(&self) -> Option<usize> {
        self.line_number.checked_sub(1).filter(|&n| n > 0)
    }
}

impl Segment for DocumentLine {
    fn offset(&self) -> usize {
        self.offset
    }

    fn length(&self) -> usize {
        self.length
    }
}

/// A 1-based `(line, column)` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextLocation {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column (characters from the line start, plus one).
    pub column: usize,
}

impl TextLocation {
    /// Create a location.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for TextLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(Line {} Col {})", self.line, self.column)
    }
}
