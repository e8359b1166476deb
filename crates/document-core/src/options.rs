//! Plain configuration values passed in by the host.

use crate::undo::DEFAULT_UNDO_LIMIT;
use serde::{Deserialize, Serialize};

/// Settings of a [`crate::TextDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Height of a line that has not been measured yet.
    pub default_line_height: f64,
    /// Maximum number of undo units kept. `0` disables undo.
    pub undo_limit: usize,
    /// How [`crate::AnchorMovementType::Default`] resolves for anchors at an insertion point.
    pub default_movement_before_insertion: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            default_line_height: 1.0,
            undo_limit: DEFAULT_UNDO_LIMIT,
            default_movement_before_insertion: false,
        }
    }
}

/// How a search pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// Literal text.
    #[default]
    Normal,
    /// A regular expression (`regex` crate syntax).
    RegEx,
    /// `*` matches any run of characters and `?` a single character; everything else is literal.
    Wildcard,
}

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Interpretation of the pattern.
    pub mode: SearchMode,
    /// If `true`, letters match regardless of case.
    pub ignore_case: bool,
    /// If `true`, matches must start and end at word borders.
    pub match_whole_words: bool,
}

impl SearchOptions {
    /// Options for a literal, case-sensitive search.
    pub fn normal() -> Self {
        Self::default()
    }

    /// Set the search mode.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable case-insensitive matching.
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Enable or disable whole-word matching.
    pub fn with_whole_words(mut self, match_whole_words: bool) -> Self {
        self.match_whole_words = match_whole_words;
        self
    }
}
