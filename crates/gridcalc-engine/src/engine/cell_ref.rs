//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates, plus
//! the normalized rectangular [`CellRange`] built from two references.
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::parse("B3").unwrap();
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)\s*$")
            .expect("A1 reference regex must compile")
    })
}

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    /// Surrounding whitespace is ignored. Returns None if the input is invalid.
    pub fn parse(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let col = letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(row, col))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

/// Base-26 column letters to a 0-based index ('A' = 1 before the shift).
pub(crate) fn letters_to_col(letters: &str) -> Option<usize> {
    let mut col_acc = 0usize;
    for c in letters.bytes() {
        let digit = (c.to_ascii_uppercase().checked_sub(b'A')?) as usize + 1;
        if digit > 26 {
            return None;
        }
        col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
    }
    col_acc.checked_sub(1)
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// An inclusive rectangle of cells with `start <= end` on both axes.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl CellRange {
    /// Build a range from two opposite corners in any drag direction.
    pub fn from_corners(a: CellRef, b: CellRef) -> CellRange {
        CellRange {
            start_row: a.row.min(b.row),
            start_col: a.col.min(b.col),
            end_row: a.row.max(b.row),
            end_col: a.col.max(b.col),
        }
    }

    /// Parse `REF:REF` notation, e.g. "A1:B3" or "C5:A1".
    pub fn parse(text: &str) -> Option<CellRange> {
        let (start, end) = text.split_once(':')?;
        Some(CellRange::from_corners(
            CellRef::parse(start)?,
            CellRef::parse(end)?,
        ))
    }

    pub fn start(&self) -> CellRef {
        CellRef::new(self.start_row, self.start_col)
    }

    pub fn end(&self) -> CellRef {
        CellRef::new(self.end_row, self.end_col)
    }

    pub fn height(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    /// Number of positions covered, saturating on absurdly large ranges.
    pub fn cell_count(&self) -> usize {
        self.height().saturating_mul(self.width())
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }

    /// Positions in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = CellRef> + use<> {
        let CellRange {
            start_row,
            start_col,
            end_row,
            end_col,
        } = *self;
        (start_row..=end_row)
            .flat_map(move |row| (start_col..=end_col).map(move |col| CellRef::new(row, col)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start(), self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::{CellRange, CellRef};

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::parse(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_eq!(CellRef::parse("  c4 "), Some(CellRef::new(3, 2)));
    }

    #[test]
    fn test_range_normalizes_reverse_corners() {
        let range = CellRange::parse("C5:A1").unwrap();
        assert_eq!(range.start(), CellRef::new(0, 0));
        assert_eq!(range.end(), CellRef::new(4, 2));
        assert_eq!(range.to_string(), "A1:C5");
        assert_eq!(range.cell_count(), 15);
    }

    #[test]
    fn test_range_iter_is_row_major() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<String> = range.iter().map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_range_rejects_missing_colon_or_bad_side() {
        assert!(CellRange::parse("A1").is_none());
        assert!(CellRange::parse("A1:").is_none());
        assert!(CellRange::parse("A1:1B").is_none());
    }
}
