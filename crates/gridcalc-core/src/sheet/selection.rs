use gridcalc_engine::engine::{CellRange, CellRef};

use super::Sheet;
use crate::error::Result;

/// A rectangular selection anchored at `start` and dragged to `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start: CellRef,
    pub end: CellRef,
    pub active: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            start: CellRef::new(0, 0),
            end: CellRef::new(0, 0),
            active: false,
        }
    }
}

impl Selection {
    /// The normalized rectangle, if a selection is active.
    pub fn range(&self) -> Option<CellRange> {
        self.active
            .then(|| CellRange::from_corners(self.start, self.end))
    }
}

impl Sheet {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn start_selection(&mut self, row: usize, col: usize) -> Result<()> {
        self.check_bounds(row, col)?;
        let at = CellRef::new(row, col);
        self.selection = Selection {
            start: at,
            end: at,
            active: true,
        };
        Ok(())
    }

    /// Move the free corner. Starts a new selection when none is active.
    pub fn extend_selection(&mut self, row: usize, col: usize) -> Result<()> {
        if !self.selection.active {
            return self.start_selection(row, col);
        }
        self.check_bounds(row, col)?;
        self.selection.end = CellRef::new(row, col);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.active = false;
    }

    pub fn is_in_selection(&self, row: usize, col: usize) -> bool {
        self.selection
            .range()
            .is_some_and(|range| range.contains(row, col))
    }

    pub fn selected_range(&self) -> Option<CellRange> {
        self.selection.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_normalizes_reverse_drag() {
        let mut sheet = Sheet::new(10, 10).unwrap();
        sheet.start_selection(4, 3).unwrap();
        sheet.extend_selection(1, 1).unwrap();
        assert_eq!(sheet.selected_range(), CellRange::parse("B2:D5"));
        assert!(sheet.is_in_selection(2, 2));
        assert!(sheet.is_in_selection(4, 3));
        assert!(!sheet.is_in_selection(5, 3));
    }

    #[test]
    fn test_clear_selection() {
        let mut sheet = Sheet::new(10, 10).unwrap();
        sheet.start_selection(0, 0).unwrap();
        sheet.clear_selection();
        assert_eq!(sheet.selected_range(), None);
        assert!(!sheet.is_in_selection(0, 0));
    }

    #[test]
    fn test_extend_without_anchor_starts_selection() {
        let mut sheet = Sheet::new(10, 10).unwrap();
        sheet.extend_selection(2, 2).unwrap();
        assert_eq!(sheet.selected_range(), CellRange::parse("C3:C3"));
    }

    #[test]
    fn test_selection_out_of_bounds() {
        let mut sheet = Sheet::new(2, 2).unwrap();
        assert!(sheet.start_selection(2, 0).is_err());
        sheet.start_selection(0, 0).unwrap();
        assert!(sheet.extend_selection(0, 9).is_err());
        assert_eq!(sheet.selected_range(), CellRange::parse("A1:A1"));
    }
}
