//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellType`] - The content of a cell (empty, number, text, formula, or error)
//! - [`FormulaResult`] - The cached outcome of the last evaluation of a formula
//! - [`Cell`] - A cell with content plus display metadata
//! - [`Alignment`], [`Color`] - Display metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::CellError;
use super::format::{NumberFormat, format_cell};

/// Cached result of evaluating a formula.
///
/// When `error` is set, `value` and `text` carry no meaning for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaResult {
    pub value: f64,
    pub text: Option<String>,
    pub error: Option<CellError>,
}

impl FormulaResult {
    pub fn number(value: f64) -> FormulaResult {
        FormulaResult {
            value,
            text: None,
            error: None,
        }
    }

    pub fn text(text: impl Into<String>) -> FormulaResult {
        FormulaResult {
            value: 0.0,
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn error(error: CellError) -> FormulaResult {
        FormulaResult {
            value: 0.0,
            text: None,
            error: Some(error),
        }
    }

    /// True when the last evaluation produced a string (e.g. from an IF branch).
    pub fn is_string_result(&self) -> bool {
        self.error.is_none() && self.text.is_some()
    }
}

/// The content stored in a cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    /// `expr` keeps the leading '='.
    Formula { expr: String, cached: FormulaResult },
    Error(CellError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    #[default]
    Right,
}

/// The eight console colors a cell can be painted with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Yellow,
        Color::White,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Cyan => "cyan",
            Color::Red => "red",
            Color::Magenta => "magenta",
            Color::Yellow => "yellow",
            Color::White => "white",
        }
    }

    /// Nearest console color for an RGB triple: each channel is on at >= 128.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Color {
        match (r >= 128, g >= 128, b >= 128) {
            (false, false, false) => Color::Black,
            (false, false, true) => Color::Blue,
            (false, true, false) => Color::Green,
            (false, true, true) => Color::Cyan,
            (true, false, false) => Color::Red,
            (true, false, true) => Color::Magenta,
            (true, true, false) => Color::Yellow,
            (true, true, true) => Color::White,
        }
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts a color name (case-insensitive) or `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("Invalid color: {}", s));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("Invalid color: {}", s))
            };
            return Ok(Color::from_rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid color: {}", s))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const DEFAULT_PRECISION: usize = 2;

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub contents: CellType,
    pub row: usize,
    pub col: usize,
    pub precision: usize,
    pub align: Alignment,
    pub format: NumberFormat,
    pub text_color: Option<Color>,
    pub background_color: Option<Color>,
}

impl Cell {
    pub fn new_empty(row: usize, col: usize) -> Cell {
        Cell {
            contents: CellType::Empty,
            row,
            col,
            precision: DEFAULT_PRECISION,
            align: Alignment::Right,
            format: NumberFormat::General,
            text_color: None,
            background_color: None,
        }
    }

    pub fn set_number(&mut self, value: f64) {
        self.contents = CellType::Number(value);
    }

    /// Text is left-aligned, like the console grid draws labels.
    pub fn set_text(&mut self, text: &str) {
        self.contents = CellType::Text(text.to_string());
        self.align = Alignment::Left;
    }

    /// Install a formula; the cached result is reset until the next recalculation.
    pub fn set_formula(&mut self, formula: &str) {
        let formula = formula.trim();
        let expr = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };
        self.contents = CellType::Formula {
            expr,
            cached: FormulaResult::default(),
        };
    }

    pub fn set_error(&mut self, error: CellError) {
        self.contents = CellType::Error(error);
    }

    /// Reset to empty, keeping formatting.
    pub fn clear(&mut self) {
        self.contents = CellType::Empty;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.contents, CellType::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.contents, CellType::Formula { .. })
    }

    /// The cached formula result, if this is a formula cell.
    pub fn formula_result(&self) -> Option<&FormulaResult> {
        match &self.contents {
            CellType::Formula { cached, .. } => Some(cached),
            _ => None,
        }
    }

    /// Numeric value for callers that treat the cell as a number
    /// (numbers and successful numeric formula results).
    pub fn number_value(&self) -> Option<f64> {
        match &self.contents {
            CellType::Number(n) => Some(*n),
            CellType::Formula { cached, .. } if cached.error.is_none() && cached.text.is_none() => {
                Some(cached.value)
            }
            _ => None,
        }
    }

    /// Copy contents and formatting from another cell, keeping this cell's position.
    pub fn copy_from(&mut self, other: &Cell) {
        let (row, col) = (self.row, self.col);
        *self = other.clone();
        self.row = row;
        self.col = col;
    }

    /// Render the cell for display according to its format.
    pub fn display_value(&self) -> String {
        format_cell(self)
    }
}
