//! gridcalc-core - Sheet store, recalculation, undo/redo and text bridges.

pub mod config;
pub mod document;
pub mod error;
pub mod sheet;
pub mod storage;

pub use config::EngineConfig;
pub use document::{Document, UndoAction, UndoLog};
pub use error::{GridcalcError, Result};
pub use sheet::{RangeClipboard, Selection, Sheet};

pub use gridcalc_engine::engine::{CellRange, CellRef};
