use document_core::{
    AnchorMovementType, DocumentChangeEvent, DocumentError, DocumentOptions, TextDocument,
    TextLocation, TextSource,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn recorder(doc: &mut TextDocument) -> Arc<Mutex<Vec<DocumentChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    doc.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

#[test]
fn test_nested_updates_notify_at_outermost_end() {
    init_tracing();
    let mut doc = TextDocument::from_text("abc");
    let events = recorder(&mut doc);

    doc.begin_update();
    doc.insert(3, "d").unwrap();
    doc.begin_update();
    doc.remove(0, 1).unwrap();
    doc.end_update().unwrap();
    assert!(doc.is_in_update());
    assert!(events.lock().unwrap().is_empty());
    doc.end_update().unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].before_length, 3);
    assert_eq!(events[0].after_length, 3);
    assert_eq!(events[0].changes.len(), 2);
    assert_eq!(events[0].new_offset(2, AnchorMovementType::Default), 1);
    assert_eq!(doc.text(), "bcd");
}

#[test]
fn test_undo_and_redo_notify() {
    init_tracing();
    let mut doc = TextDocument::new();
    let events = recorder(&mut doc);
    doc.insert(0, "hi").unwrap();
    doc.undo().unwrap();
    doc.redo().unwrap();

    let events = events.lock().unwrap();
    let lengths: Vec<_> = events
        .iter()
        .map(|e| (e.before_length, e.after_length, e.version))
        .collect();
    assert_eq!(lengths, vec![(0, 2, 1), (2, 0, 2), (0, 2, 3)]);
}

#[test]
fn test_empty_change_is_a_no_op() {
    let mut doc = TextDocument::from_text("abc");
    let events = recorder(&mut doc);
    let change = doc.replace(1, 0, "").unwrap();
    assert!(change.is_empty());
    assert_eq!(doc.version(), 0);
    assert!(!doc.undo_stack().can_undo());
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn test_update_guard_closes_on_error_path() {
    let mut doc = TextDocument::from_text("abc");
    let result = (|| {
        let mut update = doc.run_update();
        update.insert(0, "x")?;
        update.remove(10, 1)?;
        Ok::<_, DocumentError>(())
    })();
    assert!(matches!(result, Err(DocumentError::RangeOutOfBounds { .. })));
    assert!(!doc.is_in_update());
    assert_eq!(doc.text(), "xabc");
    assert_eq!(doc.undo_stack().undo_group_depth(), 0);
    doc.undo().unwrap();
    assert_eq!(doc.text(), "abc");
}

#[test]
fn test_undo_inside_update_is_rejected() {
    let mut doc = TextDocument::from_text("abc");
    doc.insert(0, "x").unwrap();
    let mut update = doc.run_update();
    assert_eq!(update.undo(), Err(DocumentError::UndoGroupOpen));
}

#[test]
fn test_lines_with_multibyte_text() {
    let doc = TextDocument::from_text("héllo\r\n你好世界\n🦀");
    assert_eq!(doc.line_count(), 3);
    assert_eq!(doc.text_length(), 13);
    assert_eq!(doc.line_text(2).unwrap(), "你好世界");
    assert_eq!(doc.location_of(9).unwrap(), TextLocation::new(2, 3));
    assert_eq!(doc.offset_of(TextLocation::new(3, 2)).unwrap(), 13);
    assert_eq!(doc.char_at(12), Some('🦀'));

    // An offset between '\r' and '\n' belongs to the first line.
    assert_eq!(doc.line_by_offset(6).unwrap().line_number, 1);

    let first = doc.line_by_number(1).unwrap();
    assert_eq!((first.previous_line_number(), first.next_line_number()), (None, Some(2)));
    let last = doc.line_by_number(3).unwrap();
    assert_eq!((last.previous_line_number(), last.next_line_number()), (Some(2), None));
    assert_eq!(
        doc.line_by_number(4),
        Err(DocumentError::LineNumberOutOfRange {
            line: 4,
            line_count: 3
        })
    );
}

#[test]
fn test_snapshot_is_independent() {
    let mut doc = TextDocument::from_text("one\ntwo");
    let snapshot = doc.snapshot();
    doc.replace(0, 3, "ONE!").unwrap();
    assert_eq!(snapshot.text(), "one\ntwo");
    assert_eq!(snapshot.line_count(), 2);
    assert_eq!(doc.snapshot().text(), "ONE!\ntwo");

    let handle = std::thread::spawn(move || snapshot.text_slice(4, 3).into_owned());
    assert_eq!(handle.join().unwrap(), "two");
}

#[test]
fn test_options_shape_new_documents() {
    let options = DocumentOptions {
        default_line_height: 18.0,
        undo_limit: 1,
        default_movement_before_insertion: true,
    };
    let mut doc = TextDocument::with_options("a\nb", options);
    assert_eq!(doc.heights().total_height(), 36.0);

    let anchor = doc.create_anchor(1, AnchorMovementType::Default).unwrap();
    doc.insert(1, "z").unwrap();
    assert_eq!(doc.anchor(anchor).unwrap().offset(), 1);

    doc.insert(0, "y").unwrap();
    assert_eq!(doc.undo_stack().undo_depth(), 1);
}
