//! Plain configuration values passed in by the host.

use crate::caret::EditingMode;
use serde::{Deserialize, Serialize};

/// Default number of bytes shown on one line.
pub const DEFAULT_BYTES_PER_LINE: usize = 16;

/// Settings of a [`crate::HexEditor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexEditorOptions {
    /// Bytes per visual line; used by vertical and line-wise navigation. Must be at least 1.
    pub bytes_per_line: usize,
    /// Initial editing mode.
    pub mode: EditingMode,
}

impl Default for HexEditorOptions {
    fn default() -> Self {
        Self {
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
            mode: EditingMode::Overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let options: HexEditorOptions = serde_json::from_str(r#"{"mode":"Insert"}"#).unwrap();
        assert_eq!(options.bytes_per_line, 16);
        assert_eq!(options.mode, EditingMode::Insert);
    }
}
