use super::{Document, UndoAction};
use crate::error::{GridcalcError, Result};
use crate::sheet::ColorLayer;
use crate::storage::parse_field;
use gridcalc_engine::engine::{CellRange, CellRef, Color, NumberFormat};

impl Document {
    /// Snapshot one position before modifying it.
    pub fn record_cell(&mut self, row: usize, col: usize) -> Result<()> {
        self.sheet.check_bounds(row, col)?;
        let old = self.sheet.snapshot(row, col);
        self.history.record(UndoAction::CellChange {
            at: CellRef::new(row, col),
            old,
            new: None,
        });
        Ok(())
    }

    /// Snapshot a block before modifying it.
    pub fn record_range(&mut self, range: CellRange) -> Result<()> {
        self.sheet.check_range(range)?;
        let old = self.sheet.snapshot_range(range);
        self.history.record(UndoAction::RangeChange {
            range,
            old,
            new: None,
        });
        Ok(())
    }

    pub fn record_column_resize(&mut self, col: usize) -> Result<()> {
        let old = self
            .sheet
            .column_width(col)
            .ok_or(GridcalcError::OutOfBounds { row: 0, col })?;
        self.history.record(UndoAction::ResizeColumn {
            col,
            old,
            new: None,
        });
        Ok(())
    }

    pub fn record_row_resize(&mut self, row: usize) -> Result<()> {
        let old = self
            .sheet
            .row_height(row)
            .ok_or(GridcalcError::OutOfBounds { row, col: 0 })?;
        self.history.record(UndoAction::ResizeRow {
            row,
            old,
            new: None,
        });
        Ok(())
    }

    /// Set cell contents from input text (number, text, formula or error code).
    pub fn set_cell_from_input(&mut self, row: usize, col: usize, input: &str) -> Result<()> {
        self.record_cell(row, col)?;
        self.sheet.set_input(row, col, parse_field(input))?;
        self.sheet.recalculate();
        self.modified = true;
        Ok(())
    }

    /// Clear the specified cell
    pub fn clear_cell(&mut self, row: usize, col: usize) -> Result<()> {
        self.record_cell(row, col)?;
        self.sheet.clear(row, col)?;
        self.sheet.recalculate();
        self.modified = true;
        Ok(())
    }

    /// Paste the single-cell clipboard.
    pub fn paste_cell(&mut self, row: usize, col: usize) -> Result<()> {
        if !self.sheet.has_copied_cell() {
            return Err(GridcalcError::EmptyClipboard);
        }
        self.record_cell(row, col)?;
        self.sheet.paste_cell(row, col)?;
        self.modified = true;
        Ok(())
    }

    /// Paste the range clipboard as one undoable step.
    pub fn paste_range(&mut self, dest_row: usize, dest_col: usize) -> Result<usize> {
        let area = self.sheet.paste_area(dest_row, dest_col)?;
        self.record_range(area)?;
        let written = self.sheet.paste_range(dest_row, dest_col)?;
        self.modified = true;
        Ok(written)
    }

    pub fn resize_column(&mut self, col: usize, delta: isize) -> Result<usize> {
        self.record_column_resize(col)?;
        let width = self.sheet.resize_column(col, delta)?;
        self.modified = true;
        Ok(width)
    }

    pub fn resize_row(&mut self, row: usize, delta: isize) -> Result<usize> {
        self.record_row_resize(row)?;
        let height = self.sheet.resize_row(row, delta)?;
        self.modified = true;
        Ok(height)
    }

    pub fn format_cell(&mut self, row: usize, col: usize, format: NumberFormat) -> Result<()> {
        self.record_cell(row, col)?;
        self.sheet.set_format(row, col, format)?;
        self.modified = true;
        Ok(())
    }

    pub fn format_range(&mut self, range: CellRange, format: NumberFormat) -> Result<()> {
        self.record_range(range)?;
        self.sheet.format_range(range, format)?;
        self.modified = true;
        Ok(())
    }

    pub fn color_range(
        &mut self,
        range: CellRange,
        layer: ColorLayer,
        color: Option<Color>,
    ) -> Result<()> {
        self.record_range(range)?;
        self.sheet.color_range(range, layer, color)?;
        self.modified = true;
        Ok(())
    }

    /// Undo the last action
    pub fn undo(&mut self) -> Result<()> {
        let action = self
            .history
            .step_back()
            .ok_or(GridcalcError::NothingToUndo)?;

        match action {
            UndoAction::CellChange { at, old, new } => {
                *new = Some(self.sheet.snapshot(at.row, at.col));
                self.sheet.restore(at.row, at.col, old.clone())?;
            }
            UndoAction::RangeChange { range, old, new } => {
                *new = Some(self.sheet.snapshot_range(*range));
                self.sheet.restore_range(*range, old.clone())?;
            }
            UndoAction::ResizeColumn { col, old, new } => {
                *new = self.sheet.column_width(*col);
                self.sheet.set_column_width(*col, *old)?;
            }
            UndoAction::ResizeRow { row, old, new } => {
                *new = self.sheet.row_height(*row);
                self.sheet.set_row_height(*row, *old)?;
            }
        }
        self.sheet.recalculate();
        self.modified = true;
        tracing::debug!(position = self.history.current_index(), "undo");
        Ok(())
    }

    /// Redo the last undone action
    pub fn redo(&mut self) -> Result<()> {
        let action = self
            .history
            .step_forward()
            .ok_or(GridcalcError::NothingToRedo)?;

        match action {
            UndoAction::CellChange { at, new, .. } => {
                if let Some(state) = new {
                    self.sheet.restore(at.row, at.col, state.clone())?;
                }
            }
            UndoAction::RangeChange { range, new, .. } => {
                if let Some(states) = new {
                    self.sheet.restore_range(*range, states.clone())?;
                }
            }
            UndoAction::ResizeColumn { col, new, .. } => {
                if let Some(width) = new {
                    self.sheet.set_column_width(*col, *width)?;
                }
            }
            UndoAction::ResizeRow { row, new, .. } => {
                if let Some(height) = new {
                    self.sheet.set_row_height(*row, *height)?;
                }
            }
        }
        self.sheet.recalculate();
        self.modified = true;
        tracing::debug!(position = self.history.current_index(), "redo");
        Ok(())
    }
}
