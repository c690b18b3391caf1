//! Classify user or file input into cell contents.

use gridcalc_engine::engine::{Cell, CellError, CellType};

/// What a piece of input text should become when written to a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellInput {
    Empty,
    Number(f64),
    Text(String),
    /// Formula text, always starting with '='.
    Formula(String),
    Error(CellError),
}

/// Marks a field as literal text, e.g. `'42` or `'=not a formula`.
pub const TEXT_PREFIX: char = '\'';

/// Classify a field:
/// - Starts with `'` -> Text, with the marker removed
/// - Empty (or only whitespace) -> Empty
/// - Starts with '=' -> Formula
/// - A literal error code such as `#DIV/0!` -> Error
/// - Valid number -> Number (unless it has leading zeros like "007")
/// - Otherwise -> Text, with surrounding whitespace kept
pub fn parse_field(field: &str) -> CellInput {
    if let Some(text) = field.strip_prefix(TEXT_PREFIX) {
        return CellInput::Text(text.to_string());
    }

    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellInput::Empty;
    }

    if trimmed.starts_with('=') {
        return CellInput::Formula(trimmed.to_string());
    }

    if let Some(error) = CellError::from_code(trimmed) {
        return CellInput::Error(error);
    }

    // Explicit surrounding whitespace (typically from quoted CSV fields) means text.
    if field != trimmed {
        return CellInput::Text(field.to_string());
    }

    // Preserve strings that look like numbers but have leading zeros (e.g., "007", "00123")
    // unless they're just "0" or start with "0."
    if trimmed.starts_with('0')
        && trimmed.len() > 1
        && !trimmed.starts_with("0.")
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return CellInput::Text(trimmed.to_string());
    }

    // f64 also accepts "inf" and "NaN", which should stay text.
    let numeric_start = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-'));
    if numeric_start
        && let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return CellInput::Number(n);
    }

    CellInput::Text(trimmed.to_string())
}

/// The text that reproduces a cell's contents through [`parse_field`]:
/// the formula for formula cells, the raw value otherwise. Text that would
/// read back as something else gets a leading [`TEXT_PREFIX`].
pub fn cell_input_string(cell: &Cell) -> String {
    match &cell.contents {
        CellType::Empty => String::new(),
        CellType::Number(n) => n.to_string(),
        CellType::Text(s) => {
            if s.starts_with(TEXT_PREFIX) || parse_field(s) != CellInput::Text(s.clone()) {
                format!("{}{}", TEXT_PREFIX, s)
            } else {
                s.clone()
            }
        }
        CellType::Formula { expr, .. } => expr.clone(),
        CellType::Error(e) => e.to_string(),
    }
}
