//! Editor options loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::EditorError;

/// Options for an editor session (CLI or GUI).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Maximum number of undo snapshots kept; `None` keeps everything.
    pub history_limit: Option<usize>,
    /// Push a snapshot after opening or importing a file.
    pub snapshot_on_open: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_limit: None,
            snapshot_on_open: true,
        }
    }
}

impl EditorOptions {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, EditorError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
            .map_err(|e| EditorError::Config(format!("{}: {}", path.display(), e)))
    }
}
