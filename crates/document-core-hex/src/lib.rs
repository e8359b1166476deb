#![warn(missing_docs)]
//! Document Core Hex - Binary Document Model
//!
//! # Overview
//!
//! `document-core-hex` is the model layer of a hex editor. Where `document-core` deals in
//! character offsets, this crate deals in [`BitLocation`]s: a byte index plus a bit offset, so a
//! caret can sit on either hex digit of a byte (or on a single bit in a binary view).
//!
//! # Core Features
//!
//! - **Bit Locations**: totally ordered byte/bit positions with byte alignment helpers
//! - **Bit Ranges**: half-open selections, intersection and byte widening
//! - **Pluggable Storage**: the [`BinaryDocument`] trait with an in-memory implementation
//! - **Caret Policy**: how carets and selections follow inserted and removed bytes
//! - **Editing Session**: [`HexEditor`] with insert/overwrite nibble typing and navigation
//!
//! # Quick Start
//!
//! ```rust
//! use document_core_hex::{BitLocation, BitRange, HexEditor, HexEditorOptions, MemoryBinaryDocument};
//!
//! let doc = MemoryBinaryDocument::from_bytes(b"\x00\x01\x02\x03".to_vec());
//! let mut editor = HexEditor::new(doc, HexEditorOptions::default()).unwrap();
//!
//! // Select from the low nibble of byte 1 to the start of byte 3 and delete it.
//! let start = BitLocation::new(1, 4).unwrap();
//! editor.select(BitRange::new(start, BitLocation::at_byte(3))).unwrap();
//! editor.delete_selection().unwrap();
//!
//! assert_eq!(editor.document().as_bytes(), &[0x00, 0x03]);
//! assert_eq!(editor.caret(), BitLocation::at_byte(1));
//! ```

pub mod bit_location;
pub mod bit_range;
pub mod caret;
pub mod document;
pub mod editor;
pub mod error;
pub mod options;

pub use bit_location::{BITS_PER_BYTE, BITS_PER_NIBBLE, BitLocation};
pub use bit_range::BitRange;
pub use caret::{EditingMode, caret_after_removal, location_after_insertion, location_after_removal};
pub use document::{BinaryDocument, MemoryBinaryDocument};
pub use editor::HexEditor;
pub use error::{BinaryDocumentError, HexResult};
pub use options::{DEFAULT_BYTES_PER_LINE, HexEditorOptions};
