//! The sheet store and the operations that act on it directly.

mod clipboard;
mod recalc;
mod selection;
mod state;

pub use clipboard::RangeClipboard;
pub use selection::Selection;
pub use state::{
    CellSnapshot, ColorLayer, MAX_COLUMN_WIDTH, MAX_ROW_HEIGHT, MIN_COLUMN_WIDTH, MIN_ROW_HEIGHT,
    Sheet,
};
