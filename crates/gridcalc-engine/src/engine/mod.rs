//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Cell`], [`CellType`], [`FormulaResult`] - Data structures for cell storage
//! - [`CellRef`], [`CellRange`] - Reference parsing (A1 notation ↔ row/col indices)
//! - [`CellError`] - The error codes a cell can show
//! - [`evaluate_formula`] - Parse and evaluate a formula against a [`CellSource`]
//! - [`format_cell`], [`format_number`] - Format values for display

mod cell;
mod cell_ref;
mod error;
mod eval;
mod format;
mod value;

pub use cell::{Alignment, Cell, CellType, Color, DEFAULT_PRECISION, FormulaResult};
pub use cell_ref::{CellRange, CellRef};
pub use error::CellError;
pub use eval::{CellSource, EvalContext, EvalLimits, evaluate_formula};
pub use format::{
    DATETIME_CYCLE, DateStyle, DateTimeStyle, NumberFormat, TimeStyle, format_cell, format_number,
    format_value,
};
pub use value::Value;
