use gridcalc_engine::engine::{Cell, CellRange};

use super::Sheet;
use crate::error::{GridcalcError, Result};

/// A deep copy of a rectangular block of cells.
///
/// Slots are row-major; `None` marks a never-written source position, which
/// clears the destination on paste. Empty cells that carry formatting are
/// copied like any other cell.
#[derive(Clone, Debug, Default)]
pub struct RangeClipboard {
    cells: Vec<Option<Cell>>,
    width: usize,
    height: usize,
}

impl RangeClipboard {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The copied cell at an offset from the top-left corner.
    pub fn get(&self, row_offset: usize, col_offset: usize) -> Option<&Cell> {
        if row_offset >= self.height || col_offset >= self.width {
            return None;
        }
        self.cells[row_offset * self.width + col_offset].as_ref()
    }
}

impl Sheet {
    pub fn range_clipboard(&self) -> &RangeClipboard {
        &self.range_clipboard
    }

    /// Copy the selected rectangle. Returns the number of positions copied.
    pub fn copy_range(&mut self) -> Result<usize> {
        let range = self.selected_range().ok_or(GridcalcError::NoSelection)?;
        let cells: Vec<Option<Cell>> = range
            .iter()
            .map(|at| self.snapshot(at.row, at.col))
            .collect();
        let copied = cells.len();
        self.range_clipboard = RangeClipboard {
            cells,
            width: range.width(),
            height: range.height(),
        };
        tracing::debug!(%range, copied, "copied range");
        Ok(copied)
    }

    /// The block a paste at `(dest_row, dest_col)` would write, clipped to the sheet.
    pub fn paste_area(&self, dest_row: usize, dest_col: usize) -> Result<CellRange> {
        if self.range_clipboard.is_empty() {
            return Err(GridcalcError::EmptyClipboard);
        }
        self.check_bounds(dest_row, dest_col)?;
        let end_row = (dest_row + self.range_clipboard.height - 1).min(self.rows() - 1);
        let end_col = (dest_col + self.range_clipboard.width - 1).min(self.cols() - 1);
        Ok(CellRange {
            start_row: dest_row,
            start_col: dest_col,
            end_row,
            end_col,
        })
    }

    /// Paste the copied block with its top-left at `(dest_row, dest_col)`.
    ///
    /// Whatever falls outside the sheet is dropped. Formulas are copied
    /// verbatim. Returns the number of positions written.
    pub fn paste_range(&mut self, dest_row: usize, dest_col: usize) -> Result<usize> {
        let area = self.paste_area(dest_row, dest_col)?;
        if area.cell_count() < self.range_clipboard.cells.len() {
            tracing::debug!(
                %area,
                rows = self.range_clipboard.height,
                cols = self.range_clipboard.width,
                "paste truncated at sheet edge"
            );
        }

        let mut written = 0;
        for at in area.iter() {
            let source = self
                .range_clipboard
                .get(at.row - dest_row, at.col - dest_col)
                .cloned();
            match source {
                Some(cell) => self.get_or_create(at.row, at.col)?.copy_from(&cell),
                None => self.clear(at.row, at.col)?,
            }
            written += 1;
        }
        self.needs_recalc = true;
        self.recalculate();
        Ok(written)
    }

    /// Copy one cell. A never-written position is copied too and pastes as a clear.
    pub fn copy_cell(&mut self, row: usize, col: usize) -> Result<()> {
        self.check_bounds(row, col)?;
        self.cell_clipboard = Some(self.snapshot(row, col));
        Ok(())
    }

    pub fn has_copied_cell(&self) -> bool {
        self.cell_clipboard.is_some()
    }

    pub fn paste_cell(&mut self, row: usize, col: usize) -> Result<()> {
        let copied = self
            .cell_clipboard
            .clone()
            .ok_or(GridcalcError::EmptyClipboard)?;
        match copied {
            Some(cell) => self.get_or_create(row, col)?.copy_from(&cell),
            None => self.clear(row, col)?,
        }
        self.needs_recalc = true;
        self.recalculate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::{CellType, NumberFormat};

    fn seeded() -> Sheet {
        let mut sheet = Sheet::new(5, 5).unwrap();
        sheet.set_number(0, 0, 1.0).unwrap();
        sheet.set_string(0, 1, "label").unwrap();
        sheet.set_formula(1, 1, "=A1*10").unwrap();
        sheet.recalculate();
        sheet
    }

    #[test]
    fn test_copy_requires_selection() {
        let mut sheet = seeded();
        assert!(matches!(sheet.copy_range(), Err(GridcalcError::NoSelection)));
        assert!(matches!(
            sheet.paste_range(0, 0),
            Err(GridcalcError::EmptyClipboard)
        ));
    }

    #[test]
    fn test_copy_paste_deep_copies_block() {
        let mut sheet = seeded();
        sheet.start_selection(0, 0).unwrap();
        sheet.extend_selection(1, 1).unwrap();
        assert_eq!(sheet.copy_range().unwrap(), 4);

        // Later edits to the source do not leak into the clipboard.
        sheet.set_number(0, 0, 2.0).unwrap();
        assert_eq!(sheet.paste_range(2, 2).unwrap(), 4);
        assert_eq!(sheet.display_value(2, 2), "1");
        assert_eq!(sheet.display_value(2, 3), "label");
        assert!(sheet.get(3, 2).is_none());

        // Formulas are pasted verbatim and still read A1.
        assert!(matches!(
            &sheet.get(3, 3).unwrap().contents,
            CellType::Formula { expr, .. } if expr == "=A1*10"
        ));
        assert_eq!(sheet.display_value(3, 3), "20");
    }

    #[test]
    fn test_paste_clears_where_source_was_empty() {
        let mut sheet = seeded();
        sheet.set_number(3, 2, 99.0).unwrap();
        sheet.start_selection(0, 0).unwrap();
        sheet.extend_selection(1, 0).unwrap();
        sheet.copy_range().unwrap();
        sheet.paste_range(2, 2).unwrap();
        assert_eq!(sheet.display_value(2, 2), "1");
        assert_eq!(sheet.display_value(3, 2), "");
    }

    #[test]
    fn test_paste_truncates_at_corner() {
        let mut sheet = seeded();
        sheet.start_selection(0, 0).unwrap();
        sheet.extend_selection(1, 1).unwrap();
        sheet.copy_range().unwrap();
        assert_eq!(sheet.paste_range(4, 4).unwrap(), 1);
        assert_eq!(sheet.display_value(4, 4), "1");
        assert!(sheet.paste_range(5, 0).is_err());
    }

    #[test]
    fn test_single_cell_copy_keeps_formatting() {
        let mut sheet = seeded();
        sheet.set_format(0, 0, NumberFormat::Currency).unwrap();
        assert!(matches!(sheet.paste_cell(4, 0), Err(GridcalcError::EmptyClipboard)));
        sheet.copy_cell(0, 0).unwrap();
        sheet.paste_cell(4, 0).unwrap();
        assert_eq!(sheet.display_value(4, 0), "$1.00");
        let pasted = sheet.get(4, 0).unwrap();
        assert_eq!((pasted.row, pasted.col), (4, 0));
    }

    #[test]
    fn test_copied_unwritten_cell_pastes_as_clear() {
        let mut sheet = seeded();
        sheet.copy_cell(4, 4).unwrap();
        sheet.paste_cell(0, 1).unwrap();
        assert_eq!(sheet.display_value(0, 1), "");
    }

    #[test]
    fn test_formatted_empty_cell_copies_its_format() {
        let mut sheet = Sheet::new(6, 6).unwrap();
        sheet.set_format(0, 0, NumberFormat::Currency).unwrap();
        sheet.set_number(0, 1, 5.0).unwrap();
        sheet.start_selection(0, 0).unwrap();
        sheet.extend_selection(0, 1).unwrap();
        sheet.copy_range().unwrap();
        sheet.paste_range(3, 0).unwrap();

        let pasted = sheet.get(3, 0).unwrap();
        assert!(pasted.is_empty());
        assert_eq!(pasted.format, NumberFormat::Currency);
        sheet.set_number(0, 0, 2.0).unwrap();
        sheet.set_number(3, 0, 2.0).unwrap();
        assert_eq!(sheet.display_value(3, 0), sheet.display_value(0, 0));
        assert_eq!(sheet.display_value(3, 0), "$2.00");
        assert_eq!(sheet.display_value(3, 1), "5");
    }

    #[test]
    fn test_single_cell_copy_of_formatted_empty_cell() {
        let mut sheet = Sheet::new(4, 4).unwrap();
        sheet.set_format(1, 1, NumberFormat::Percentage).unwrap();
        sheet.copy_cell(1, 1).unwrap();
        sheet.paste_cell(2, 2).unwrap();
        assert_eq!(sheet.get(2, 2).unwrap().format, NumberFormat::Percentage);
        sheet.set_number(2, 2, 0.5).unwrap();
        assert_eq!(sheet.display_value(2, 2), "50.00%");
    }
}
