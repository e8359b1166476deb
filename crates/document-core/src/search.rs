//! Search strategies.
//!
//! A [`SearchStrategy`] finds matches in any [`TextSource`] and reports them as
//! [`SearchResult`]s in **character offsets**. The built-in [`RegexSearchStrategy`] covers the
//! three [`SearchMode`]s by compiling literal and wildcard patterns into regular expressions.
//!
//! Strategies hold no mutable state, so one strategy can search several snapshots from
//! different threads at the same time:
//!
//! ```rust
//! use document_core::{SearchOptions, TextDocument, search};
//!
//! let doc = TextDocument::from_text("foo bar foo");
//! let strategy = search::create("foo", SearchOptions::normal()).unwrap();
//! let snapshot = doc.snapshot();
//! let handle = std::thread::spawn(move || {
//!     let text_length = document_core::TextSource::text_length(&snapshot);
//!     strategy.find_all(&snapshot, 0, text_length).map(|r| r.offset()).collect::<Vec<_>>()
//! });
//! assert_eq!(handle.join().unwrap(), vec![0, 8]);
//! ```

use crate::caret::is_word_border;
use crate::error::SearchError;
use crate::options::{SearchMode, SearchOptions};
use crate::segment::Segment;
use crate::text_source::{StringTextSource, TextSource};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

/// A match, expressed as a half-open character range.
#[derive(Clone)]
pub struct SearchResult {
    offset: usize,
    length: usize,
    expansion: Option<Expansion>,
}

/// Everything needed to expand capture group references of a regex match later on.
#[derive(Clone)]
struct Expansion {
    regex: Arc<Regex>,
    text: Arc<str>,
    byte_start: usize,
}

impl SearchResult {
    /// Create a plain result without capture groups.
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            expansion: None,
        }
    }

    /// Start offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of matched characters.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Exclusive end offset.
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Text that replaces this match.
    ///
    /// Results of [`SearchMode::RegEx`] searches expand `$1`, `${name}` and `$$` in `template`
    /// (`$name` takes the longest possible name, so write `${1}a` rather than `$1a`).
    /// Other results return `template` unchanged.
    pub fn replace_with(&self, template: &str) -> String {
        let Some(expansion) = &self.expansion else {
            return template.to_string();
        };
        let Some(captures) = expansion
            .regex
            .captures_at(&expansion.text, expansion.byte_start)
        else {
            return template.to_string();
        };
        let mut replacement = String::new();
        captures.expand(template, &mut replacement);
        replacement
    }
}

impl Segment for SearchResult {
    fn offset(&self) -> usize {
        self.offset
    }

    fn length(&self) -> usize {
        self.length
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.length == other.length
    }
}

impl Eq for SearchResult {}

impl fmt::Debug for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResult")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .finish()
    }
}

/// A way of finding matches in text.
pub trait SearchStrategy: Send + Sync + fmt::Debug {
    /// All matches lying completely inside `[offset, offset + length)`, in ascending order.
    ///
    /// Matches never overlap. The source is read once, when this method is called; only the
    /// range and one character on each side of it are copied.
    fn find_all(
        &self,
        source: &dyn TextSource,
        offset: usize,
        length: usize,
    ) -> Box<dyn Iterator<Item = SearchResult> + Send>;

    /// First match inside `[offset, offset + length)`.
    fn find_next(&self, source: &dyn TextSource, offset: usize, length: usize) -> Option<SearchResult> {
        self.find_all(source, offset, length).next()
    }
}

/// Build the strategy for `pattern` under `options`.
pub fn create(pattern: &str, options: SearchOptions) -> Result<Box<dyn SearchStrategy>, SearchError> {
    Ok(Box::new(RegexSearchStrategy::new(pattern, options)?))
}

/// Search strategy backed by a compiled regular expression.
#[derive(Debug, Clone)]
pub struct RegexSearchStrategy {
    regex: Arc<Regex>,
    match_whole_words: bool,
    expands_captures: bool,
}

impl RegexSearchStrategy {
    /// Compile `pattern` according to `options`.
    pub fn new(pattern: &str, options: SearchOptions) -> Result<Self, SearchError> {
        let source = match options.mode {
            SearchMode::Normal => regex::escape(pattern),
            SearchMode::RegEx => pattern.to_string(),
            SearchMode::Wildcard => wildcards_to_regex(pattern),
        };
        let regex = RegexBuilder::new(&source)
            .case_insensitive(options.ignore_case)
            .multi_line(true)
            .build()?;
        Ok(Self {
            regex: Arc::new(regex),
            match_whole_words: options.match_whole_words,
            expands_captures: options.mode == SearchMode::RegEx,
        })
    }

    /// The compiled regular expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

fn wildcards_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '?' => out.push('.'),
            '*' => out.push_str(".*"),
            _ => out.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }
    out
}

impl SearchStrategy for RegexSearchStrategy {
    fn find_all(
        &self,
        source: &dyn TextSource,
        offset: usize,
        length: usize,
    ) -> Box<dyn Iterator<Item = SearchResult> + Send> {
        let text_length = source.text_length();
        let start = offset.min(text_length);
        let end = offset.saturating_add(length).min(text_length);
        // One character of context on each side keeps anchors and word borders right at the
        // edges of the range.
        let window_start = start.saturating_sub(1);
        let window_end = end.saturating_add(1).min(text_length);
        let text = StringTextSource::new(source.text_slice(window_start, window_end - window_start));
        let byte_pos = text.index().char_to_byte(start - window_start);
        Box::new(RegexMatches {
            regex: Arc::clone(&self.regex),
            text,
            window_start,
            byte_pos,
            start: start - window_start,
            end: end - window_start,
            match_whole_words: self.match_whole_words,
            expands_captures: self.expands_captures,
            done: false,
        })
    }
}

/// Matches inside a window of the source. `start` and `end` are relative to `window_start`.
struct RegexMatches {
    regex: Arc<Regex>,
    text: StringTextSource,
    window_start: usize,
    byte_pos: usize,
    start: usize,
    end: usize,
    match_whole_words: bool,
    expands_captures: bool,
    done: bool,
}

impl RegexMatches {
    fn next_byte_after(&self, byte: usize) -> usize {
        let text = self.text.as_str();
        text[byte..]
            .chars()
            .next()
            .map_or(text.len() + 1, |c| byte + c.len_utf8())
    }
}

impl Iterator for RegexMatches {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        while !self.done {
            if self.byte_pos > self.text.as_str().len() {
                break;
            }
            let Some(m) = self.regex.find_at(self.text.as_str(), self.byte_pos) else {
                break;
            };
            let index = self.text.index();
            let match_start = index.byte_to_char(m.start());
            let match_end = index.byte_to_char(m.end());
            if match_start >= self.end {
                break;
            }
            self.byte_pos = if m.is_empty() {
                self.next_byte_after(m.end())
            } else {
                m.end()
            };
            // Empty matches carry no text to show or replace.
            if m.is_empty() || match_start < self.start || match_end > self.end {
                continue;
            }
            if self.match_whole_words
                && (!is_word_border(&self.text, match_start) || !is_word_border(&self.text, match_end))
            {
                continue;
            }
            let expansion = self.expands_captures.then(|| Expansion {
                regex: Arc::clone(&self.regex),
                text: Arc::clone(self.text.shared_text()),
                byte_start: m.start(),
            });
            return Some(SearchResult {
                offset: self.window_start + match_start,
                length: match_end - match_start,
                expansion,
            });
        }
        self.done = true;
        None
    }
}
