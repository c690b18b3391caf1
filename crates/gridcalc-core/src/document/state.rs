use super::history::UndoLog;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::sheet::Sheet;

/// UI-agnostic document state for the spreadsheet.
pub struct Document {
    /// The spreadsheet grid
    pub sheet: Sheet,
    /// Undo/redo history of edits made through the document
    pub history: UndoLog,
    /// Whether the sheet has been modified since it was last marked saved
    pub modified: bool,
}

impl Document {
    /// Create an empty document with default limits and a 100-entry history.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::with_config(&EngineConfig {
            rows,
            cols,
            ..EngineConfig::default()
        })
    }

    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        let sheet = Sheet::with_config(config)?;
        Ok(Document {
            sheet,
            history: UndoLog::new(config.undo_capacity),
            modified: false,
        })
    }

    /// Record that the current state has been persisted by the host.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }
}
