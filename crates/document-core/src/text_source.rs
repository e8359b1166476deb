//! Read-only text access.
//!
//! [`TextSource`] is the read side shared by the live document, immutable snapshots and plain
//! strings. Search strategies and caret positioning only ever see a `TextSource`, which lets
//! them run on background threads against a [`TextSnapshot`] while the document keeps changing.

use ropey::Rope;
use std::borrow::Cow;
use std::sync::Arc;

/// Read-only access to text by character offset.
pub trait TextSource {
    /// Number of characters.
    fn text_length(&self) -> usize;

    /// Character at `offset`, or `None` past the end.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// Text of `[offset, offset + length)`, clamped to the source length.
    fn text_slice(&self, offset: usize, length: usize) -> Cow<'_, str>;

    /// The complete text.
    fn text(&self) -> Cow<'_, str> {
        self.text_slice(0, self.text_length())
    }
}

/// An immutable snapshot of a document's text.
///
/// Cloning is O(1): the snapshot shares the rope chunks with the document it was taken from.
#[derive(Debug, Clone)]
pub struct TextSnapshot {
    rope: Rope,
    version: u64,
}

impl TextSnapshot {
    pub(crate) fn new(rope: Rope, version: u64) -> Self {
        Self { rope, version }
    }

    /// Document version the snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of lines in the snapshot.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }
}

impl TextSource for TextSnapshot {
    fn text_length(&self) -> usize {
        self.rope.text_length()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.char_at(offset)
    }

    fn text_slice(&self, offset: usize, length: usize) -> Cow<'_, str> {
        self.rope.text_slice(offset, length)
    }
}

impl TextSource for Rope {
    fn text_length(&self) -> usize {
        self.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.get_char(offset)
    }

    fn text_slice(&self, offset: usize, length: usize) -> Cow<'_, str> {
        let start = offset.min(self.len_chars());
        let end = offset.saturating_add(length).min(self.len_chars());
        self.slice(start..end).into()
    }
}

/// A string with an O(1) character-offset index.
///
/// Cloning shares the text and the index.
#[derive(Debug, Clone)]
pub struct StringTextSource {
    text: Arc<str>,
    index: Arc<CharIndex>,
}

impl StringTextSource {
    /// Index a string.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let index = Arc::new(CharIndex::new(&text));
        Self { text, index }
    }

    /// The underlying string.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub(crate) fn shared_text(&self) -> &Arc<str> {
        &self.text
    }

    pub(crate) fn index(&self) -> &CharIndex {
        &self.index
    }
}

impl TextSource for StringTextSource {
    fn text_length(&self) -> usize {
        self.index.char_count()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.index.char_at(&self.text, offset)
    }

    fn text_slice(&self, offset: usize, length: usize) -> Cow<'_, str> {
        let start = self.index.char_to_byte(offset);
        let end = self.index.char_to_byte(offset.saturating_add(length));
        Cow::Borrowed(&self.text[start..end])
    }
}

impl TextSource for str {
    fn text_length(&self) -> usize {
        self.chars().count()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.chars().nth(offset)
    }

    fn text_slice(&self, offset: usize, length: usize) -> Cow<'_, str> {
        Cow::Owned(self.chars().skip(offset).take(length).collect())
    }
}

/// Character offset to byte offset table for a UTF-8 string.
#[derive(Debug, Clone)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn char_count(&self) -> usize {
        self.char_to_byte.len().saturating_sub(1)
    }

    pub(crate) fn char_to_byte(&self, char_offset: usize) -> usize {
        let clamped = char_offset.min(self.char_count());
        self.char_to_byte
            .get(clamped)
            .copied()
            .unwrap_or(self.text_len)
    }

    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }

    pub(crate) fn char_at(&self, text: &str, char_offset: usize) -> Option<char> {
        if char_offset >= self.char_count() {
            return None;
        }
        let start = self.char_to_byte[char_offset];
        let end = self.char_to_byte[char_offset + 1];
        text.get(start..end)?.chars().next()
    }
}
