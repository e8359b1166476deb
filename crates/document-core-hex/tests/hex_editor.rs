use document_core_hex::{
    BinaryDocument, BinaryDocumentError, BitLocation, BitRange, EditingMode, HexEditor,
    HexEditorOptions, MemoryBinaryDocument,
};
use pretty_assertions::assert_eq;

fn loc(byte: u64, bit: u8) -> BitLocation {
    BitLocation::new(byte, bit).unwrap()
}

fn editor_with(bytes: &[u8], bytes_per_line: usize) -> HexEditor {
    let options = HexEditorOptions {
        bytes_per_line,
        ..HexEditorOptions::default()
    };
    HexEditor::new(MemoryBinaryDocument::from_bytes(bytes), options).unwrap()
}

#[test]
fn test_delete_under_caret_keeps_byte_index() {
    let mut ed = editor_with(&[0, 1, 2, 3, 4], 16);
    ed.set_caret(loc(2, 4), false).unwrap();
    ed.delete().unwrap();
    assert_eq!(ed.document().as_bytes(), &[0, 1, 3, 4]);
    assert_eq!(ed.caret(), loc(2, 0));
}

#[test]
fn test_delete_last_byte_moves_to_new_last_byte() {
    let mut ed = editor_with(&[0, 1, 2], 16);
    ed.set_caret(loc(2, 4), false).unwrap();
    ed.delete().unwrap();
    assert_eq!(ed.document().as_bytes(), &[0, 1]);
    assert_eq!(ed.caret(), loc(1, 0));

    ed.delete().unwrap();
    ed.delete().unwrap();
    assert!(ed.document().is_empty());
    assert_eq!(ed.caret(), BitLocation::MIN);
    // Nothing left to delete.
    ed.delete().unwrap();
}

#[test]
fn test_backspace() {
    let mut ed = editor_with(&[0xa, 0xb, 0xc], 16);
    ed.set_caret(BitLocation::at_byte(2), false).unwrap();
    ed.backspace().unwrap();
    assert_eq!(ed.document().as_bytes(), &[0xa, 0xc]);
    assert_eq!(ed.caret(), loc(1, 0));

    // Inside a byte the byte itself is removed.
    ed.set_caret(loc(1, 4), false).unwrap();
    ed.backspace().unwrap();
    assert_eq!(ed.document().as_bytes(), &[0xa]);
    assert_eq!(ed.caret(), loc(0, 0));

    ed.backspace().unwrap();
    assert_eq!(ed.document().as_bytes(), &[0xa]);
}

#[test]
fn test_removal_moves_selection_and_caret() {
    let mut ed = editor_with(&[0u8; 10], 16);
    ed.select(BitRange::new(loc(6, 4), loc(8, 0))).unwrap();
    ed.remove_bytes(1, 3).unwrap();
    assert_eq!(ed.selection(), BitRange::new(loc(3, 4), loc(5, 0)));
    ed.insert_bytes(0, &[1, 2]).unwrap();
    assert_eq!(ed.selection(), BitRange::new(loc(5, 4), loc(7, 0)));
    assert_eq!(ed.caret(), loc(7, 0));
}

#[test]
fn test_delete_selection_up_to_end() {
    let mut ed = editor_with(&[1, 2, 3], 16);
    ed.set_caret(BitLocation::at_byte(3), false).unwrap();
    ed.set_caret(BitLocation::at_byte(1), true).unwrap();
    assert!(ed.has_selection());
    ed.delete_selection().unwrap();
    assert_eq!(ed.document().as_bytes(), &[1]);
    // The caret's byte was removed along with the tail, so it lands on the new last byte.
    assert_eq!(ed.caret(), BitLocation::MIN);
    assert!(!ed.has_selection());
}

#[test]
fn test_read_only_document_rejects_edits() {
    let doc = MemoryBinaryDocument::from_bytes([1u8, 2, 3]).read_only();
    let mut ed = HexEditor::new(doc, HexEditorOptions::default()).unwrap();
    assert_eq!(ed.type_nibble(0x1), Err(BinaryDocumentError::ReadOnly));
    ed.move_right(true);
    ed.move_right(true);
    assert_eq!(ed.delete(), Err(BinaryDocumentError::ReadOnly));
    assert_eq!(ed.selection(), BitRange::from_bytes(0, 1));
    assert_eq!(ed.into_document().into_bytes(), vec![1, 2, 3]);
}

#[test]
fn test_caret_outside_document_is_rejected() {
    let mut ed = editor_with(&[1, 2], 16);
    assert_eq!(
        ed.set_caret(loc(2, 4), false),
        Err(BinaryDocumentError::LocationOutOfRange {
            location: loc(2, 4),
            document_length: 2
        })
    );
    assert!(ed.select(BitRange::from_bytes(0, 3)).is_err());
    ed.set_caret(BitLocation::at_byte(2), false).unwrap();
}

#[test]
fn test_select_rejects_range_past_end() {
    let mut ed = editor_with(&[1, 2], 16);
    ed.select(BitRange::from_bytes(0, 1)).unwrap();
    assert_eq!(
        ed.select(BitRange::new(loc(5, 0), loc(6, 0))),
        Err(BinaryDocumentError::LocationOutOfRange {
            location: loc(5, 0),
            document_length: 2
        })
    );
    assert_eq!(ed.selection(), BitRange::from_bytes(0, 1));
    assert_eq!(ed.caret(), BitLocation::at_byte(1));
}

#[test]
fn test_nibble_navigation() {
    let mut ed = editor_with(&[0u8; 3], 16);
    let mut stops = vec![ed.caret()];
    for _ in 0..8 {
        ed.move_right(false);
        stops.push(ed.caret());
    }
    assert_eq!(
        stops,
        vec![
            loc(0, 0),
            loc(0, 4),
            loc(1, 0),
            loc(1, 4),
            loc(2, 0),
            loc(2, 4),
            loc(3, 0),
            loc(3, 0),
            loc(3, 0),
        ]
    );

    ed.set_caret(loc(1, 6), false).unwrap();
    ed.move_left(false);
    assert_eq!(ed.caret(), loc(1, 4));
    ed.move_left(false);
    ed.move_left(false);
    assert_eq!(ed.caret(), loc(0, 4));
    ed.move_left(false);
    ed.move_left(false);
    assert_eq!(ed.caret(), BitLocation::MIN);
}

#[test]
fn test_line_navigation() {
    let mut ed = editor_with(&[0u8; 10], 4);
    // 10 bytes plus the append position: lines of 4, 4 and 3 slots.
    assert_eq!(ed.line_count(), 3);

    ed.set_caret(loc(1, 4), false).unwrap();
    ed.move_down(false);
    assert_eq!(ed.caret(), loc(5, 4));
    ed.move_down(true);
    assert_eq!(ed.caret(), loc(9, 4));
    ed.move_down(true);
    assert_eq!(ed.caret(), BitLocation::at_byte(10));
    assert_eq!(ed.selection(), BitRange::new(loc(5, 4), BitLocation::at_byte(10)));

    ed.move_up(false);
    assert!(!ed.has_selection());
    assert_eq!(ed.caret(), BitLocation::at_byte(6));
    ed.move_to_line_end(false);
    assert_eq!(ed.caret(), loc(7, 4));
    ed.move_to_line_start(false);
    assert_eq!(ed.caret(), BitLocation::at_byte(4));
    ed.move_up(false);
    ed.move_up(false);
    assert_eq!(ed.caret(), BitLocation::MIN);

    ed.move_to_document_end(true);
    assert_eq!(ed.selection(), BitRange::from_bytes(0, 10));
    assert_eq!(ed.line_of(ed.caret()), 2);
}

#[test]
fn test_insert_mode_session() {
    let options = HexEditorOptions {
        bytes_per_line: 8,
        mode: EditingMode::Insert,
    };
    let mut ed = HexEditor::new(MemoryBinaryDocument::from_bytes([0xffu8]), options).unwrap();
    for nibble in [0xd, 0xe, 0xa, 0xd] {
        ed.type_nibble(nibble).unwrap();
    }
    assert_eq!(ed.document().as_bytes(), &[0xde, 0xad, 0xff]);

    ed.set_mode(EditingMode::Overwrite);
    ed.type_nibble(0x0).unwrap();
    ed.type_nibble(0x1).unwrap();
    assert_eq!(ed.document().as_bytes(), &[0xde, 0xad, 0x01]);
    assert_eq!(ed.caret(), BitLocation::at_byte(3));
}

#[test]
fn test_options_round_trip_through_json() {
    let options = HexEditorOptions {
        bytes_per_line: 32,
        mode: EditingMode::Insert,
    };
    let json = serde_json::to_string(&options).unwrap();
    assert_eq!(json, r#"{"bytes_per_line":32,"mode":"Insert"}"#);
    assert_eq!(serde_json::from_str::<HexEditorOptions>(&json).unwrap(), options);
    assert_eq!(
        serde_json::from_str::<HexEditorOptions>("{}").unwrap(),
        HexEditorOptions::default()
    );
}
