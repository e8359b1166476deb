//! Caret stops and word borders.
//!
//! [`next_caret_position`] walks a [`TextSource`] one character at a time and stops where the
//! [`CaretPositioningMode`] allows a caret. Characters are grouped into [`CharacterClass`]es;
//! a word border is any position between two characters of different classes. Combining marks
//! belong to the character before them, so no mode except [`CaretPositioningMode::EveryCodepoint`]
//! stops in front of one.

use crate::text_source::TextSource;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Direction of a caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalDirection {
    /// Towards the start of the text.
    Backward,
    /// Towards the end of the text.
    Forward,
}

/// Which positions count as caret stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaretPositioningMode {
    /// Every grapheme boundary.
    #[default]
    Normal,
    /// Positions between characters of different classes.
    WordBorder,
    /// Word borders that start a word (not followed by whitespace).
    WordStart,
    /// Like [`CaretPositioningMode::WordBorder`], also stopping between two symbols.
    WordBorderOrSymbol,
    /// Like [`CaretPositioningMode::WordStart`], also stopping between two symbols.
    WordStartOrSymbol,
    /// Every code point, including in front of combining marks.
    EveryCodepoint,
}

impl CaretPositioningMode {
    fn is_normal(self) -> bool {
        matches!(self, Self::Normal | Self::EveryCodepoint)
    }

    fn is_word_start(self) -> bool {
        matches!(self, Self::WordStart | Self::WordStartOrSymbol)
    }

    fn stops_between_symbols(self) -> bool {
        matches!(self, Self::WordBorderOrSymbol | Self::WordStartOrSymbol)
    }
}

/// Classification of a character for word-border purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterClass {
    /// Anything that is not covered by another class (punctuation, symbols).
    Other,
    /// Whitespace and control characters other than line terminators.
    Whitespace,
    /// Letters, digits and `_`.
    IdentifierPart,
    /// `\r` or `\n`.
    LineTerminator,
    /// A character that extends the grapheme in front of it.
    CombiningMark,
}

impl CharacterClass {
    /// Classify a character.
    pub fn of(c: char) -> Self {
        if c == '\r' || c == '\n' {
            Self::LineTerminator
        } else if c == '_' {
            Self::IdentifierPart
        } else if c.is_whitespace() || c.is_control() {
            Self::Whitespace
        } else if is_grapheme_extender(c) {
            Self::CombiningMark
        } else if c.is_alphanumeric() {
            Self::IdentifierPart
        } else {
            Self::Other
        }
    }
}

fn is_grapheme_extender(c: char) -> bool {
    let mut buf = [0u8; 8];
    buf[0] = b'a';
    let len = 1 + c.encode_utf8(&mut buf[1..]).len();
    std::str::from_utf8(&buf[..len]).is_ok_and(|s| s.graphemes(true).nth(1).is_none())
}

fn stop_between_characters(mode: CaretPositioningMode, before: CharacterClass, after: CharacterClass) -> bool {
    if mode == CaretPositioningMode::EveryCodepoint {
        return true;
    }
    if after == CharacterClass::CombiningMark {
        return false;
    }
    if mode == CaretPositioningMode::Normal {
        return true;
    }
    if before == after {
        return before == CharacterClass::Other && mode.stops_between_symbols();
    }
    // Word starts are never followed by whitespace.
    !(mode.is_word_start()
        && matches!(after, CharacterClass::Whitespace | CharacterClass::LineTerminator))
}

/// Next caret stop from `offset` in `direction`, or `None` if there is none.
///
/// `offset` itself is never returned. Offsets past the end of `source` yield `None` when moving
/// forward.
pub fn next_caret_position(
    source: &(impl TextSource + ?Sized),
    offset: usize,
    direction: LogicalDirection,
    mode: CaretPositioningMode,
) -> Option<usize> {
    next_caret_position_from(source, offset as isize, direction, mode)
}

fn next_caret_position_from(
    source: &(impl TextSource + ?Sized),
    mut offset: isize,
    direction: LogicalDirection,
    mode: CaretPositioningMode,
) -> Option<usize> {
    let text_length = source.text_length() as isize;
    if text_length == 0 {
        // An empty text still has a normal caret position at 0, but no word borders.
        let moves_to_zero = match direction {
            LogicalDirection::Backward => offset > 0,
            LogicalDirection::Forward => offset < 0,
        };
        return (mode.is_normal() && moves_to_zero).then_some(0);
    }
    let char_at = |offset: isize| source.char_at(offset as usize);
    loop {
        let next = match direction {
            LogicalDirection::Backward => offset - 1,
            LogicalDirection::Forward => offset + 1,
        };
        if next < 0 || next > text_length {
            return None;
        }
        if next == 0 {
            // At the start there is only a word border if the text starts with a non-space.
            if mode.is_normal() || !char_at(0).is_some_and(char::is_whitespace) {
                return Some(0);
            }
        } else if next == text_length {
            // The end is never a word start, and only a word border after a non-space.
            if !mode.is_word_start()
                && (mode.is_normal() || !char_at(text_length - 1).is_some_and(char::is_whitespace))
            {
                return Some(next as usize);
            }
        } else if let (Some(before), Some(after)) = (char_at(next - 1), char_at(next)) {
            if stop_between_characters(mode, CharacterClass::of(before), CharacterClass::of(after)) {
                return Some(next as usize);
            }
        }
        offset = next;
    }
}

/// Returns `true` if `offset` is a word border of `source`.
pub fn is_word_border(source: &(impl TextSource + ?Sized), offset: usize) -> bool {
    next_caret_position_from(
        source,
        offset as isize - 1,
        LogicalDirection::Forward,
        CaretPositioningMode::WordBorder,
    ) == Some(offset)
}

/// Returns `true` if a word starts at `offset` in `source`.
pub fn is_word_start(source: &(impl TextSource + ?Sized), offset: usize) -> bool {
    next_caret_position_from(
        source,
        offset as isize - 1,
        LogicalDirection::Forward,
        CaretPositioningMode::WordStart,
    ) == Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogicalDirection::{Backward, Forward};

    #[test]
    fn test_character_classes() {
        assert_eq!(CharacterClass::of('a'), CharacterClass::IdentifierPart);
        assert_eq!(CharacterClass::of('7'), CharacterClass::IdentifierPart);
        assert_eq!(CharacterClass::of('_'), CharacterClass::IdentifierPart);
        assert_eq!(CharacterClass::of('你'), CharacterClass::IdentifierPart);
        assert_eq!(CharacterClass::of(' '), CharacterClass::Whitespace);
        assert_eq!(CharacterClass::of('\t'), CharacterClass::Whitespace);
        assert_eq!(CharacterClass::of('\n'), CharacterClass::LineTerminator);
        assert_eq!(CharacterClass::of('.'), CharacterClass::Other);
        assert_eq!(CharacterClass::of('\u{301}'), CharacterClass::CombiningMark);
    }

    #[test]
    fn test_word_border_walk() {
        let text = "foo  bar.baz";
        let stops: Vec<usize> = std::iter::successors(Some(0), |&o| {
            next_caret_position(text, o, Forward, CaretPositioningMode::WordBorder)
        })
        .collect();
        assert_eq!(stops, vec![0, 3, 5, 8, 9, 12]);
    }

    #[test]
    fn test_word_start_skips_word_ends() {
        let text = "foo  bar";
        assert_eq!(next_caret_position(text, 0, Forward, CaretPositioningMode::WordStart), Some(5));
        assert_eq!(next_caret_position(text, 5, Forward, CaretPositioningMode::WordStart), None);
        assert_eq!(next_caret_position(text, 8, Backward, CaretPositioningMode::WordStart), Some(5));
    }

    #[test]
    fn test_symbol_modes_stop_between_symbols() {
        let text = "a+=b";
        assert_eq!(next_caret_position(text, 1, Forward, CaretPositioningMode::WordBorder), Some(3));
        assert_eq!(
            next_caret_position(text, 1, Forward, CaretPositioningMode::WordBorderOrSymbol),
            Some(2)
        );
    }

    #[test]
    fn test_normal_mode_skips_combining_marks() {
        let text = "e\u{301}x";
        assert_eq!(next_caret_position(text, 0, Forward, CaretPositioningMode::Normal), Some(2));
        assert_eq!(
            next_caret_position(text, 0, Forward, CaretPositioningMode::EveryCodepoint),
            Some(1)
        );
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(next_caret_position("", 0, Forward, CaretPositioningMode::Normal), None);
        assert_eq!(next_caret_position("", 3, Backward, CaretPositioningMode::Normal), Some(0));
        assert_eq!(next_caret_position("", 3, Backward, CaretPositioningMode::WordBorder), None);
    }

    #[test]
    fn test_word_border_at_edges() {
        assert!(is_word_border("abc", 0));
        assert!(is_word_border("abc", 3));
        assert!(!is_word_border(" abc ", 0));
        assert!(!is_word_border(" abc ", 5));
        assert!(!is_word_border("abc", 1));
        assert!(is_word_start("x y", 2));
        assert!(!is_word_start("x y", 1));
    }
}
