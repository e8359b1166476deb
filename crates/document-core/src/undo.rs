//! Undo/redo history with explicit grouping.
//!
//! [`UndoStack`] stores *units*: ordered lists of [`UndoableOperation`]s that undo and redo as
//! one step. Every push outside a group becomes its own unit; everything pushed between
//! [`UndoStack::start_undo_group`] and the matching [`UndoStack::end_undo_group`] is combined.
//!
//! Continued groups ([`UndoStack::start_continued_undo_group`]) merge with the previous unit, so
//! consecutive typing can undo in one step. A group that ends up containing only optional
//! entries (ones that do not change the target, such as caret bookkeeping) is discarded and
//! blocks continuation, so the next continued group starts a new unit instead of attaching
//! itself to an older, unrelated one.
//!
//! The stack is generic over the operation target, which lets the owner keep the stack next to
//! (not inside) the state it modifies.

use crate::error::{DocumentError, DocumentResult};
use std::fmt;
use tracing::{debug, warn};

/// A reversible operation.
pub trait UndoableOperation<T: ?Sized>: fmt::Debug + Send {
    /// Revert the operation.
    fn undo(&self, target: &mut T) -> DocumentResult<()>;

    /// Apply the operation again after it was undone.
    fn redo(&self, target: &mut T) -> DocumentResult<()>;
}

type Unit<T> = Vec<Box<dyn UndoableOperation<T>>>;

/// Default number of undo units kept.
pub const DEFAULT_UNDO_LIMIT: usize = 1000;

/// Undo/redo stacks with group tracking.
pub struct UndoStack<T: ?Sized> {
    undo_stack: Vec<Unit<T>>,
    redo_stack: Vec<Unit<T>>,
    size_limit: usize,
    undo_group_depth: usize,
    action_count_in_group: usize,
    optional_action_count: usize,
    allow_continue: bool,
    /// Position of the original file in the linear history, measured in `undo_stack.len()`.
    /// May exceed `undo_stack.len()` while the original state is reachable through redo.
    clean_index: Option<usize>,
}

impl<T: ?Sized> UndoStack<T> {
    /// Create an empty stack keeping at most [`DEFAULT_UNDO_LIMIT`] units.
    pub fn new() -> Self {
        Self::with_size_limit(DEFAULT_UNDO_LIMIT)
    }

    /// Create an empty stack keeping at most `size_limit` units. `0` disables undo.
    pub fn with_size_limit(size_limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            size_limit,
            undo_group_depth: 0,
            action_count_in_group: 0,
            optional_action_count: 0,
            allow_continue: false,
            clean_index: Some(0),
        }
    }

    /// Returns `true` if there is a unit to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is a unit to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of units on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of units on the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum number of units kept.
    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Change the maximum number of units. Excess units are dropped, oldest first.
    pub fn set_size_limit(&mut self, size_limit: usize) {
        self.size_limit = size_limit;
        self.enforce_size_limit();
    }

    /// Nesting depth of open groups.
    pub fn undo_group_depth(&self) -> usize {
        self.undo_group_depth
    }

    /// Returns `true` while the history is at the state marked by
    /// [`UndoStack::mark_as_original_file`].
    pub fn is_original_file(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Mark the current state as the original (e.g. just saved) file.
    pub fn mark_as_original_file(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
    }

    /// Open an undo group. Groups nest; only the outermost one forms a unit.
    pub fn start_undo_group(&mut self) {
        if self.undo_group_depth == 0 {
            self.action_count_in_group = 0;
            self.optional_action_count = 0;
        }
        self.undo_group_depth += 1;
    }

    /// Open an undo group that continues the previous unit.
    ///
    /// The previous unit is only continued if the last closed group was not empty (or
    /// optional-only); otherwise this behaves like [`UndoStack::start_undo_group`].
    pub fn start_continued_undo_group(&mut self) {
        if self.undo_group_depth == 0 {
            self.action_count_in_group =
                usize::from(self.allow_continue && !self.undo_stack.is_empty());
            self.optional_action_count = 0;
        }
        self.undo_group_depth += 1;
    }

    /// Close the innermost group.
    pub fn end_undo_group(&mut self) -> DocumentResult<()> {
        if self.undo_group_depth == 0 {
            return Err(DocumentError::NoOpenUndoGroup);
        }
        self.undo_group_depth -= 1;
        if self.undo_group_depth > 0 {
            return Ok(());
        }

        self.allow_continue = true;
        let count = self.action_count_in_group;
        if count == self.optional_action_count {
            let new_len = self.undo_stack.len().saturating_sub(count);
            self.undo_stack.truncate(new_len);
            if let Some(clean_index) = self.clean_index
                && clean_index > new_len
                && clean_index <= new_len + count
            {
                self.clean_index = Some(new_len);
            }
            self.allow_continue = false;
        } else if count > 1 {
            self.combine_last_units(count);
        }
        self.action_count_in_group = 0;
        self.optional_action_count = 0;
        self.enforce_size_limit();
        Ok(())
    }

    fn combine_last_units(&mut self, count: usize) {
        let first = self.undo_stack.len().saturating_sub(count);
        let combined: Unit<T> = self.undo_stack.drain(first..).flatten().collect();
        self.undo_stack.push(combined);
        if let Some(clean_index) = self.clean_index {
            if clean_index > first && clean_index < first + count {
                self.clean_index = None;
            } else if clean_index >= first + count {
                self.clean_index = Some(clean_index - (count - 1));
            }
        }
    }

    fn enforce_size_limit(&mut self) {
        if self.undo_group_depth > 0 {
            return;
        }
        let excess = self.undo_stack.len().saturating_sub(self.size_limit);
        if excess == 0 {
            return;
        }
        self.undo_stack.drain(..excess);
        self.clean_index = self.clean_index.and_then(|ci| ci.checked_sub(excess));
        debug!(dropped = excess, "undo history trimmed");
    }

    fn clear_redo_stack(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }
        // A clean point in the redo area becomes unreachable.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }
        self.redo_stack.clear();
    }

    fn push_internal(&mut self, operation: Box<dyn UndoableOperation<T>>, optional: bool) {
        self.start_undo_group();
        self.clear_redo_stack();
        self.undo_stack.push(vec![operation]);
        self.action_count_in_group += 1;
        if optional {
            self.optional_action_count += 1;
        }
        // The group was opened above, so closing it cannot fail.
        let _ = self.end_undo_group();
    }

    /// Record an operation that has already been applied. Clears the redo stack.
    pub fn push(&mut self, operation: Box<dyn UndoableOperation<T>>) {
        self.push_internal(operation, false);
    }

    /// Record an operation that does not change the target by itself.
    ///
    /// A group containing only optional operations is dropped when it closes.
    pub fn push_optional(&mut self, operation: Box<dyn UndoableOperation<T>>) -> DocumentResult<()> {
        if self.undo_group_depth == 0 {
            return Err(DocumentError::OptionalOutsideGroup);
        }
        self.push_internal(operation, true);
        Ok(())
    }

    /// Undo the most recent unit. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self, target: &mut T) -> DocumentResult<bool> {
        if self.undo_group_depth > 0 {
            return Err(DocumentError::UndoGroupOpen);
        }
        let Some(unit) = self.undo_stack.pop() else {
            return Ok(false);
        };
        self.allow_continue = false;
        for operation in unit.iter().rev() {
            if let Err(err) = operation.undo(target) {
                warn!(error = %err, "undo failed; history dropped for this unit");
                return Err(err);
            }
        }
        debug!(operations = unit.len(), remaining = self.undo_stack.len(), "undo");
        self.redo_stack.push(unit);
        Ok(true)
    }

    /// Redo the most recently undone unit. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self, target: &mut T) -> DocumentResult<bool> {
        if self.undo_group_depth > 0 {
            return Err(DocumentError::UndoGroupOpen);
        }
        let Some(unit) = self.redo_stack.pop() else {
            return Ok(false);
        };
        self.allow_continue = false;
        for operation in &unit {
            if let Err(err) = operation.redo(target) {
                warn!(error = %err, "redo failed; history dropped for this unit");
                return Err(err);
            }
        }
        debug!(operations = unit.len(), remaining = self.redo_stack.len(), "redo");
        self.undo_stack.push(unit);
        Ok(true)
    }

    /// Drop the whole history.
    pub fn clear_all(&mut self) -> DocumentResult<()> {
        if self.undo_group_depth > 0 {
            return Err(DocumentError::UndoGroupOpen);
        }
        self.clean_index = self.is_original_file().then_some(0);
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.allow_continue = false;
        Ok(())
    }
}

impl<T: ?Sized> Default for UndoStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for UndoStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStack")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("size_limit", &self.size_limit)
            .field("undo_group_depth", &self.undo_group_depth)
            .field("allow_continue", &self.allow_continue)
            .field("clean_index", &self.clean_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Append(&'static str);

    impl UndoableOperation<String> for Append {
        fn undo(&self, target: &mut String) -> DocumentResult<()> {
            target.truncate(target.len() - self.0.len());
            Ok(())
        }

        fn redo(&self, target: &mut String) -> DocumentResult<()> {
            target.push_str(self.0);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Nothing;

    impl UndoableOperation<String> for Nothing {
        fn undo(&self, _: &mut String) -> DocumentResult<()> {
            Ok(())
        }

        fn redo(&self, _: &mut String) -> DocumentResult<()> {
            Ok(())
        }
    }

    fn append(stack: &mut UndoStack<String>, text: &mut String, s: &'static str) {
        text.push_str(s);
        stack.push(Box::new(Append(s)));
    }

    #[test]
    fn test_ungrouped_pushes_undo_separately() {
        let mut stack = UndoStack::new();
        let mut text = String::new();
        append(&mut stack, &mut text, "a");
        append(&mut stack, &mut text, "b");
        assert_eq!(stack.undo_depth(), 2);
        assert!(stack.undo(&mut text).unwrap());
        assert_eq!(text, "a");
        assert!(stack.redo(&mut text).unwrap());
        assert_eq!(text, "ab");
    }

    #[test]
    fn test_group_undoes_in_one_step() {
        let mut stack = UndoStack::new();
        let mut text = String::new();
        stack.start_undo_group();
        append(&mut stack, &mut text, "a");
        stack.start_undo_group();
        append(&mut stack, &mut text, "b");
        stack.end_undo_group().unwrap();
        append(&mut stack, &mut text, "c");
        stack.end_undo_group().unwrap();
        assert_eq!(stack.undo_depth(), 1);
        stack.undo(&mut text).unwrap();
        assert_eq!(text, "");
        stack.redo(&mut text).unwrap();
        assert_eq!(text, "abc");
    }

    #[test]
    fn test_undo_on_empty_stack_is_noop() {
        let mut stack = UndoStack::<String>::new();
        let mut text = String::from("x");
        assert!(!stack.undo(&mut text).unwrap());
        assert!(!stack.redo(&mut text).unwrap());
        assert_eq!(text, "x");
    }

    #[test]
    fn test_errors() {
        let mut stack = UndoStack::<String>::new();
        let mut text = String::new();
        assert_eq!(stack.end_undo_group(), Err(DocumentError::NoOpenUndoGroup));
        assert_eq!(
            stack.push_optional(Box::new(Nothing)),
            Err(DocumentError::OptionalOutsideGroup)
        );
        stack.start_undo_group();
        assert_eq!(stack.undo(&mut text), Err(DocumentError::UndoGroupOpen));
        assert_eq!(stack.clear_all(), Err(DocumentError::UndoGroupOpen));
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = UndoStack::new();
        let mut text = String::new();
        append(&mut stack, &mut text, "a");
        stack.undo(&mut text).unwrap();
        assert!(stack.can_redo());
        append(&mut stack, &mut text, "b");
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_size_limit_drops_oldest() {
        let mut stack = UndoStack::with_size_limit(2);
        let mut text = String::new();
        for s in ["a", "b", "c"] {
            append(&mut stack, &mut text, s);
        }
        assert_eq!(stack.undo_depth(), 2);
        stack.undo(&mut text).unwrap();
        stack.undo(&mut text).unwrap();
        assert_eq!(text, "a");
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_zero_limit_disables_history() {
        let mut stack = UndoStack::with_size_limit(0);
        let mut text = String::new();
        append(&mut stack, &mut text, "a");
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_original_file_tracking() {
        let mut stack = UndoStack::new();
        let mut text = String::new();
        assert!(stack.is_original_file());
        append(&mut stack, &mut text, "a");
        assert!(!stack.is_original_file());
        stack.mark_as_original_file();
        append(&mut stack, &mut text, "b");
        stack.undo(&mut text).unwrap();
        assert!(stack.is_original_file());
        stack.undo(&mut text).unwrap();
        assert!(!stack.is_original_file());
        stack.redo(&mut text).unwrap();
        assert!(stack.is_original_file());
    }

    #[test]
    fn test_optional_only_group_is_dropped() {
        let mut stack = UndoStack::new();
        let mut text = String::new();
        append(&mut stack, &mut text, "a");
        stack.start_undo_group();
        stack.push_optional(Box::new(Nothing)).unwrap();
        stack.end_undo_group().unwrap();
        assert_eq!(stack.undo_depth(), 1);
    }

    #[test]
    fn test_continued_group_merges_with_previous_unit() {
        let mut stack = UndoStack::new();
        let mut text = String::new();
        append(&mut stack, &mut text, "a");
        stack.start_continued_undo_group();
        append(&mut stack, &mut text, "b");
        stack.end_undo_group().unwrap();
        assert_eq!(stack.undo_depth(), 1);
        stack.undo(&mut text).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_undo_blocks_continuation() {
        let mut stack = UndoStack::new();
        let mut text = String::new();
        append(&mut stack, &mut text, "a");
        append(&mut stack, &mut text, "b");
        stack.undo(&mut text).unwrap();
        stack.start_continued_undo_group();
        append(&mut stack, &mut text, "c");
        stack.end_undo_group().unwrap();
        stack.undo(&mut text).unwrap();
        assert_eq!(text, "a");
    }
}
