use gridcalc_engine::engine::{
    Alignment, Cell, CellError, CellRange, CellSource, Color, EvalContext, EvalLimits,
    FormulaResult, NumberFormat, evaluate_formula,
};

use super::clipboard::RangeClipboard;
use super::selection::Selection;
use crate::config::EngineConfig;
use crate::error::{GridcalcError, Result};
use crate::storage::CellInput;

pub const MIN_COLUMN_WIDTH: usize = 3;
pub const MAX_COLUMN_WIDTH: usize = 50;
pub const MIN_ROW_HEIGHT: usize = 1;
pub const MAX_ROW_HEIGHT: usize = 10;

/// The state of one grid position: None when nothing was ever written there.
pub type CellSnapshot = Option<Cell>;

/// Which of a cell's two colors to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorLayer {
    Text,
    Background,
}

/// A fixed-size grid of lazily allocated cells.
///
/// Positions are zero-based `(row, col)`. Reads outside the grid return
/// `None`; writes outside it fail with [`GridcalcError::OutOfBounds`].
pub struct Sheet {
    rows: usize,
    cols: usize,
    /// Row-major, `rows * cols` slots.
    pub(super) cells: Vec<Option<Box<Cell>>>,
    column_widths: Vec<usize>,
    row_heights: Vec<usize>,
    default_precision: usize,
    pub(super) limits: EvalLimits,
    pub(super) selection: Selection,
    pub(super) range_clipboard: RangeClipboard,
    /// Outer None: nothing copied yet.
    pub(super) cell_clipboard: Option<CellSnapshot>,
    pub(super) needs_recalc: bool,
}

impl Sheet {
    /// Create an empty sheet with default geometry and limits.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::with_config(&EngineConfig {
            rows,
            cols,
            ..EngineConfig::default()
        })
    }

    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        let (rows, cols) = (config.rows, config.cols);
        let slots = rows
            .checked_mul(cols)
            .filter(|&n| n > 0)
            .ok_or(GridcalcError::InvalidDimensions { rows, cols })?;
        config.validate()?;

        let width = config
            .default_column_width
            .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        if width != config.default_column_width {
            tracing::warn!(
                requested = config.default_column_width,
                used = width,
                "default column width out of range"
            );
        }
        let height = config
            .default_row_height
            .clamp(MIN_ROW_HEIGHT, MAX_ROW_HEIGHT);
        if height != config.default_row_height {
            tracing::warn!(
                requested = config.default_row_height,
                used = height,
                "default row height out of range"
            );
        }

        let mut cells = Vec::with_capacity(slots);
        cells.resize_with(slots, || None);
        Ok(Sheet {
            rows,
            cols,
            cells,
            column_widths: vec![width; cols],
            row_heights: vec![height; rows],
            default_precision: config.default_precision,
            limits: config.limits,
            selection: Selection::default(),
            range_clipboard: RangeClipboard::default(),
            cell_clipboard: None,
            needs_recalc: false,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Slot index of a position, or `OutOfBounds`.
    pub fn check_bounds(&self, row: usize, col: usize) -> Result<usize> {
        self.index(row, col)
            .ok_or(GridcalcError::OutOfBounds { row, col })
    }

    /// Ranges are normalized, so checking the far corner is enough.
    pub fn check_range(&self, range: CellRange) -> Result<()> {
        self.check_bounds(range.end_row, range.end_col).map(|_| ())
    }

    /// Read-only access; never allocates.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).and_then(|i| self.cells[i].as_deref())
    }

    pub fn get_or_create(&mut self, row: usize, col: usize) -> Result<&mut Cell> {
        let i = self.check_bounds(row, col)?;
        let precision = self.default_precision;
        let cell = self.cells[i].get_or_insert_with(|| {
            let mut cell = Cell::new_empty(row, col);
            cell.precision = precision;
            Box::new(cell)
        });
        Ok(cell.as_mut())
    }

    /// Every allocated cell, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten().map(|cell| cell.as_ref())
    }

    pub fn set_number(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.get_or_create(row, col)?.set_number(value);
        self.needs_recalc = true;
        Ok(())
    }

    pub fn set_string(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        self.get_or_create(row, col)?.set_text(text);
        self.needs_recalc = true;
        Ok(())
    }

    /// The stored expression always starts with '='.
    pub fn set_formula(&mut self, row: usize, col: usize, formula: &str) -> Result<()> {
        self.get_or_create(row, col)?.set_formula(formula);
        self.needs_recalc = true;
        Ok(())
    }

    pub fn set_error(&mut self, row: usize, col: usize, error: CellError) -> Result<()> {
        self.get_or_create(row, col)?.set_error(error);
        self.needs_recalc = true;
        Ok(())
    }

    /// Write classified input (see [`crate::storage::parse_field`]).
    pub fn set_input(&mut self, row: usize, col: usize, input: CellInput) -> Result<()> {
        match input {
            CellInput::Empty => self.clear(row, col),
            CellInput::Number(n) => self.set_number(row, col, n),
            CellInput::Text(s) => self.set_string(row, col, &s),
            CellInput::Formula(f) => self.set_formula(row, col, &f),
            CellInput::Error(e) => self.set_error(row, col, e),
        }
    }

    /// Reset a cell to empty, keeping its formatting. Never-written positions stay unallocated.
    pub fn clear(&mut self, row: usize, col: usize) -> Result<()> {
        let i = self.check_bounds(row, col)?;
        if let Some(cell) = self.cells[i].as_deref_mut() {
            cell.clear();
            self.needs_recalc = true;
        }
        Ok(())
    }

    pub fn display_value(&self, row: usize, col: usize) -> String {
        self.get(row, col)
            .map(|cell| cell.display_value())
            .unwrap_or_default()
    }

    /// Evaluate formula text against the current cell values without storing it.
    pub fn evaluate(&self, formula: &str) -> FormulaResult {
        evaluate_formula(self, formula, &EvalContext::new(self.limits))
    }

    pub fn snapshot(&self, row: usize, col: usize) -> CellSnapshot {
        self.get(row, col).cloned()
    }

    /// Put a position back exactly as a [`Sheet::snapshot`] saw it.
    pub fn restore(&mut self, row: usize, col: usize, state: CellSnapshot) -> Result<()> {
        let i = self.check_bounds(row, col)?;
        self.cells[i] = state.map(|mut cell| {
            cell.row = row;
            cell.col = col;
            Box::new(cell)
        });
        self.needs_recalc = true;
        Ok(())
    }

    /// Row-major snapshots of every position in the range.
    pub fn snapshot_range(&self, range: CellRange) -> Vec<CellSnapshot> {
        range.iter().map(|at| self.snapshot(at.row, at.col)).collect()
    }

    pub fn restore_range(&mut self, range: CellRange, states: Vec<CellSnapshot>) -> Result<()> {
        self.check_range(range)?;
        for (at, state) in range.iter().zip(states) {
            self.restore(at.row, at.col, state)?;
        }
        Ok(())
    }

    /// Smallest range from A1 covering every non-empty cell.
    pub fn used_extent(&self) -> Option<CellRange> {
        let mut extent: Option<(usize, usize)> = None;
        for cell in self.cells().filter(|cell| !cell.is_empty()) {
            let (rows, cols) = extent.unwrap_or((0, 0));
            extent = Some((rows.max(cell.row), cols.max(cell.col)));
        }
        extent.map(|(end_row, end_col)| CellRange {
            start_row: 0,
            start_col: 0,
            end_row,
            end_col,
        })
    }

    pub fn set_format(&mut self, row: usize, col: usize, format: NumberFormat) -> Result<()> {
        self.get_or_create(row, col)?.format = format;
        Ok(())
    }

    /// Precision changes how numbers read in text comparisons, so formulas rerun.
    pub fn set_precision(&mut self, row: usize, col: usize, precision: usize) -> Result<()> {
        self.get_or_create(row, col)?.precision = precision;
        self.needs_recalc = true;
        Ok(())
    }

    pub fn set_alignment(&mut self, row: usize, col: usize, align: Alignment) -> Result<()> {
        self.get_or_create(row, col)?.align = align;
        Ok(())
    }

    pub fn set_color(
        &mut self,
        row: usize,
        col: usize,
        layer: ColorLayer,
        color: Option<Color>,
    ) -> Result<()> {
        let cell = self.get_or_create(row, col)?;
        match layer {
            ColorLayer::Text => cell.text_color = color,
            ColorLayer::Background => cell.background_color = color,
        }
        Ok(())
    }

    pub fn set_text_color(&mut self, row: usize, col: usize, color: Option<Color>) -> Result<()> {
        self.set_color(row, col, ColorLayer::Text, color)
    }

    pub fn set_background_color(
        &mut self,
        row: usize,
        col: usize,
        color: Option<Color>,
    ) -> Result<()> {
        self.set_color(row, col, ColorLayer::Background, color)
    }

    pub fn format_range(&mut self, range: CellRange, format: NumberFormat) -> Result<()> {
        self.check_range(range)?;
        for at in range.iter() {
            self.set_format(at.row, at.col, format)?;
        }
        Ok(())
    }

    pub fn color_range(
        &mut self,
        range: CellRange,
        layer: ColorLayer,
        color: Option<Color>,
    ) -> Result<()> {
        self.check_range(range)?;
        for at in range.iter() {
            self.set_color(at.row, at.col, layer, color)?;
        }
        Ok(())
    }

    pub fn column_width(&self, col: usize) -> Option<usize> {
        self.column_widths.get(col).copied()
    }

    pub fn row_height(&self, row: usize) -> Option<usize> {
        self.row_heights.get(row).copied()
    }

    /// Set a column width, clamped to `MIN_COLUMN_WIDTH..=MAX_COLUMN_WIDTH`.
    pub fn set_column_width(&mut self, col: usize, width: usize) -> Result<usize> {
        let slot = self
            .column_widths
            .get_mut(col)
            .ok_or(GridcalcError::OutOfBounds { row: 0, col })?;
        *slot = width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        Ok(*slot)
    }

    /// Set a row height, clamped to `MIN_ROW_HEIGHT..=MAX_ROW_HEIGHT`.
    pub fn set_row_height(&mut self, row: usize, height: usize) -> Result<usize> {
        let slot = self
            .row_heights
            .get_mut(row)
            .ok_or(GridcalcError::OutOfBounds { row, col: 0 })?;
        *slot = height.clamp(MIN_ROW_HEIGHT, MAX_ROW_HEIGHT);
        Ok(*slot)
    }

    /// Grow or shrink a column; returns the new width.
    pub fn resize_column(&mut self, col: usize, delta: isize) -> Result<usize> {
        let current = self
            .column_width(col)
            .ok_or(GridcalcError::OutOfBounds { row: 0, col })?;
        self.set_column_width(col, current.saturating_add_signed(delta))
    }

    /// Grow or shrink a row; returns the new height.
    pub fn resize_row(&mut self, row: usize, delta: isize) -> Result<usize> {
        let current = self
            .row_height(row)
            .ok_or(GridcalcError::OutOfBounds { row, col: 0 })?;
        self.set_row_height(row, current.saturating_add_signed(delta))
    }
}

impl CellSource for Sheet {
    fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.get(row, col)
    }
}
