//! Error types for Gridcalc core.

use thiserror::Error;

/// Errors returned by sheet, document and storage operations.
///
/// Problems inside a formula are not errors here: they are stored on the
/// cell as a `CellError` and shown in the grid.
#[derive(Error, Debug)]
pub enum GridcalcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Cell position out of bounds: row {row}, column {col}")]
    OutOfBounds { row: usize, col: usize },

    #[error("Invalid sheet dimensions: {rows} rows x {cols} columns")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("No selection")]
    NoSelection,

    #[error("Clipboard is empty")]
    EmptyClipboard,
}

pub type Result<T> = std::result::Result<T, GridcalcError>;
