//! Cell-level error codes.
//!
//! These are values, not failures: a formula that divides by zero still
//! completes evaluation and stores `CellError::DivZero` as its result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code carried by a formula result or an error cell.
///
/// `Display` renders the code exactly as it is shown in a cell.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellError {
    #[error("#DIV/0!")]
    DivZero,

    #[error("#REF!")]
    Ref,

    #[error("#VALUE!")]
    Value,

    #[error("#PARSE!")]
    Parse,

    #[error("#N/A!")]
    NotAvailable,

    /// A range produced more values than `EvalLimits::max_range_values` allows.
    #[error("#RANGE!")]
    TooManyValues,
}

impl CellError {
    pub const ALL: [CellError; 6] = [
        CellError::DivZero,
        CellError::Ref,
        CellError::Value,
        CellError::Parse,
        CellError::NotAvailable,
        CellError::TooManyValues,
    ];

    /// Recognize a rendered error code (e.g. when reading back flattened text).
    pub fn from_code(code: &str) -> Option<CellError> {
        let code = code.trim();
        CellError::ALL.into_iter().find(|e| e.to_string() == code)
    }
}
