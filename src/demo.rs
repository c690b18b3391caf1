//! The sample sheet shown by `--demo`, and a plain-text grid renderer.

use gridcalc_core::{CellRef, Sheet};
use gridcalc_engine::engine::{Alignment, DateStyle, NumberFormat, TimeStyle};

/// Fill the sheet with the formatting and lookup examples.
pub fn populate(sheet: &mut Sheet) -> gridcalc_core::Result<()> {
    let labels = [
        ("A1", "Gridcalc demo"),
        ("A3", "Formatting Examples:"),
        ("A9", "VLOOKUP Example:"),
        ("A10", "Product"),
        ("B10", "Price"),
        ("A11", "Apple"),
        ("A12", "Orange"),
        ("A13", "Banana"),
        ("A15", "Lookup 'Orange':"),
        ("A16", "Average price:"),
        ("A17", "Median price:"),
        ("A18", "Price check:"),
    ];
    for (name, text) in labels {
        let at = cell(name);
        sheet.set_string(at.row, at.col, text)?;
    }

    // Each example is labelled with its format name in column A.
    let formatted = [
        ("B4", 0.1234, NumberFormat::Percentage),
        ("B5", 1234.56, NumberFormat::Currency),
        ("B6", 45000.0, NumberFormat::Date(DateStyle::MmDdYyyy)),
        ("B7", 0.5, NumberFormat::Time(TimeStyle::Hour12)),
    ];
    for (name, value, format) in formatted {
        let at = cell(name);
        sheet.set_string(at.row, 0, &format!("{}:", format.description()))?;
        sheet.set_number(at.row, at.col, value)?;
        sheet.set_format(at.row, at.col, format)?;
    }

    for (name, price) in [("B11", 0.5), ("B12", 0.75), ("B13", 0.3)] {
        let at = cell(name);
        sheet.set_number(at.row, at.col, price)?;
    }

    let formulas = [
        ("B15", "=VLOOKUP(\"Orange\",A10:B13,2,1)"),
        ("B16", "=AVG(B11:B13)"),
        ("B17", "=MEDIAN(B11:B13)"),
        ("B18", "=IF(B12>B11,\"Orange costs more\",\"Apple costs more\")"),
    ];
    for (name, formula) in formulas {
        let at = cell(name);
        sheet.set_formula(at.row, at.col, formula)?;
    }

    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 18)?;
    sheet.recalculate();
    Ok(())
}

/// Demo positions are literals, so every name parses.
fn cell(name: &str) -> CellRef {
    CellRef::parse(name).unwrap_or_else(|| CellRef::new(0, 0))
}

/// Render the used part of the sheet as fixed-width text with column headers.
pub fn render(sheet: &Sheet) -> String {
    let Some(extent) = sheet.used_extent() else {
        return String::new();
    };
    let widths: Vec<usize> = (0..=extent.end_col)
        .map(|col| sheet.column_width(col).unwrap_or(10))
        .collect();
    let gutter = (extent.end_row + 1).to_string().len();

    let mut out = format!("{:gutter$} ", "");
    for (col, &width) in widths.iter().enumerate() {
        out.push_str(&format!("{:^width$} ", CellRef::col_to_letters(col)));
    }
    out.push('\n');

    for row in 0..=extent.end_row {
        let mut line = format!("{:>gutter$} ", row + 1);
        for (col, &width) in widths.iter().enumerate() {
            let text: String = sheet.display_value(row, col).chars().take(width).collect();
            let align = sheet.get(row, col).map(|c| c.align).unwrap_or_default();
            let padded = match align {
                Alignment::Left => format!("{:<width$}", text),
                Alignment::Center => format!("{:^width$}", text),
                Alignment::Right => format!("{:>width$}", text),
            };
            line.push_str(&padded);
            line.push(' ');
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
