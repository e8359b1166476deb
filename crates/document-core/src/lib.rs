#![warn(missing_docs)]
//! Document Core - Headless Text Document Model
//!
//! # Overview
//!
//! `document-core` is the model layer of a text editor: the text, its lines, and everything that
//! has to stay consistent with the text while it is being edited. It does not render anything;
//! a view layer reads lines, heights and segments from it and sends edits back.
//!
//! # Core Features
//!
//! - **Rope Storage**: `ropey` based text with O(log n) offset/line conversion
//! - **Line Tracking**: `\n`, `\r\n` and lone `\r` delimiters, 1-based lines and columns
//! - **Height Tree**: per-line visual heights, O(log n) position lookups and nestable collapsed sections
//! - **Live Segments**: segment layers whose offsets follow edits, O(log n + k) overlap queries
//! - **Anchors**: positions that move with the text and notice when their text is deleted
//! - **Grouped Undo**: nested undo groups, continued groups, optional entries and a clean marker
//! - **Read-only Sections**: pluggable providers consulted by checked editing methods
//! - **Search**: literal, wildcard and regex strategies that run on immutable snapshots
//! - **Change Notifications**: callbacks batched per update scope
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextDocument (edits, updates, callbacks)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  UndoStack<DocumentBuffer>                  │  ← History
//! ├─────────────────────────────────────────────┤
//! │  Segment Layers · Anchors · Read-only       │  ← Tracked Positions
//! ├─────────────────────────────────────────────┤
//! │  HeightTree (heights + collapsed sections)  │  ← Visual Lines
//! ├─────────────────────────────────────────────┤
//! │  Rope (text + line index)                   │  ← Text Storage
//! └─────────────────────────────────────────────┘
//!                      │ snapshot()
//!                      ▼
//!        TextSource → SearchStrategy (any thread)
//! ```
//!
//! # Quick Start
//!
//! ## Editing and Undo
//!
//! ```rust
//! use document_core::{TextDocument, TextLocation};
//!
//! let mut doc = TextDocument::from_text("fn main() {\n}\n");
//! doc.insert(12, "    println!(\"hi\");\n").unwrap();
//! assert_eq!(doc.line_count(), 4);
//! assert_eq!(doc.line_text(2).unwrap(), "    println!(\"hi\");");
//! assert_eq!(doc.location_of(16).unwrap(), TextLocation::new(2, 5));
//!
//! doc.undo().unwrap();
//! assert_eq!(doc.text(), "fn main() {\n}\n");
//! ```
//!
//! ## Heights and Collapsed Sections
//!
//! ```rust
//! use document_core::TextDocument;
//!
//! let mut doc = TextDocument::from_text("1\n2\n3\n4\n5");
//! doc.set_line_height(1, 2.0).unwrap();
//! let section = doc.collapse_lines(2, 4).unwrap();
//! assert_eq!(doc.heights().total_height(), 2.0 + 1.0);
//! assert_eq!(doc.heights().line_by_visual_position(2.5), 5);
//!
//! doc.uncollapse_lines(section).unwrap();
//! assert_eq!(doc.heights().total_height(), 6.0);
//! ```
//!
//! ## Searching
//!
//! ```rust
//! use document_core::{SearchMode, SearchOptions, TextDocument, search};
//!
//! let doc = TextDocument::from_text("let a = 1;\nlet bb = 22;");
//! let options = SearchOptions::normal().with_mode(SearchMode::RegEx);
//! let strategy = search::create(r"\d+", options).unwrap();
//! let found: Vec<_> = strategy
//!     .find_all(&doc, 0, doc.text_length())
//!     .map(|r| (r.offset(), r.end_offset()))
//!     .collect();
//! assert_eq!(found, vec![(8, 9), (20, 22)]);
//! ```
//!
//! # Module Description
//!
//! - [`document`] - The text document and its update scopes
//! - [`height_tree`] - Line heights and collapsed sections
//! - [`segment_collection`] - Live segment layers
//! - [`undo`] - Grouped undo/redo history
//! - [`search`] - Search strategies and results
//! - [`read_only`] - Read-only section providers
//! - [`caret`] - Caret stops and word borders
//! - [`anchor`] - Text anchors
//! - [`change`] - Change records and change events
//! - [`text_source`] - Read-only text access and snapshots
//!
//! # Unicode Support
//!
//! - Offsets count Unicode scalar values (`char`s), never bytes
//! - Caret movement can stop on grapheme cluster boundaries only
//! - Word borders treat combining marks as part of the preceding word

pub mod anchor;
pub mod caret;
pub mod change;
pub mod document;
pub mod error;
pub mod height_tree;
pub mod line;
pub mod options;
pub mod read_only;
pub mod search;
pub mod segment;
pub mod segment_collection;
pub mod text_source;
pub mod undo;

pub use anchor::{AnchorId, TextAnchor};
pub use caret::{
    CaretPositioningMode, CharacterClass, LogicalDirection, is_word_border, is_word_start,
    next_caret_position,
};
pub use change::{AnchorMovementType, DeletedSegment, DocumentChange, DocumentChangeEvent};
pub use document::{ChangeCallback, DocumentBuffer, DocumentUpdate, Subscription, TextDocument};
pub use error::{DocumentError, DocumentResult, SearchError};
pub use height_tree::{CollapsedLineSection, HeightTree};
pub use line::{DocumentLine, TextLocation};
pub use options::{DocumentOptions, SearchMode, SearchOptions};
pub use read_only::{NoReadOnlySections, ReadOnlyDocument, ReadOnlyMode, ReadOnlySectionProvider};
pub use search::{RegexSearchStrategy, SearchResult, SearchStrategy};
pub use segment::{Segment, SimpleSegment};
pub use segment_collection::{
    CURRENT_SEARCH_RESULT_STYLE_ID, DeletionPolicy, READ_ONLY_STYLE_ID, SEARCH_RESULT_STYLE_ID,
    SegmentId, SegmentLayerId, StyleId, TextSegment, TextSegmentCollection,
};
pub use text_source::{StringTextSource, TextSnapshot, TextSource};
pub use undo::{DEFAULT_UNDO_LIMIT, UndoStack, UndoableOperation};
