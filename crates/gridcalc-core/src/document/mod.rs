//! Document state: a sheet plus its undo/redo history.

mod history;
mod ops;
mod state;

pub use history::{UndoAction, UndoLog};
pub use state::Document;
