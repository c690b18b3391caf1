//! CSV text import/export.
//!
//! The host handles files; these functions only turn a sheet into CSV text
//! and back.

use super::parser::{CellInput, cell_input_string, parse_field};
use crate::error::{GridcalcError, Result};
use crate::sheet::Sheet;
use gridcalc_engine::engine::{Cell, CellType};

/// What a formula cell becomes in CSV.
///
/// Text that would otherwise read back as a number, formula or error code is
/// written with a leading `'` in both modes, so it loads as text again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CsvMode {
    /// Write formulas as `=...` and read them back as formulas.
    #[default]
    PreserveFormulas,
    /// Write display values; formulas read back as plain text.
    Flatten,
}

/// Export the sheet from A1 to the last used row and column.
///
/// Empty sheets export as an empty string.
pub fn to_csv_string(sheet: &Sheet, mode: CsvMode) -> String {
    let Some(extent) = sheet.used_extent() else {
        return String::new();
    };

    let mut out = String::new();
    for row in extent.start_row..=extent.end_row {
        let fields: Vec<String> = (extent.start_col..=extent.end_col)
            .map(|col| {
                let value = sheet
                    .get(row, col)
                    .map(|cell| cell_field(cell, mode))
                    .unwrap_or_default();
                escape_csv_field(&value)
            })
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn cell_field(cell: &Cell, mode: CsvMode) -> String {
    match (mode, &cell.contents) {
        (CsvMode::PreserveFormulas, _) => cell_input_string(cell),
        // Numbers keep full precision; only formulas are flattened to what the grid shows.
        (CsvMode::Flatten, CellType::Formula { .. }) => cell.display_value(),
        (CsvMode::Flatten, _) => cell_input_string(cell),
    }
}

/// Load CSV text into the sheet with A1 at the first field.
///
/// Empty fields leave their cell untouched. Fields beyond the sheet edge are
/// skipped. Returns the number of cells written.
pub fn load_csv_str(sheet: &mut Sheet, content: &str, mode: CsvMode) -> Result<usize> {
    let records = parse_csv_records(content)?;
    let mut written = 0;
    let mut skipped = 0;

    for (row, fields) in records.iter().enumerate() {
        for (col, field) in fields.iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            if row >= sheet.rows() || col >= sheet.cols() {
                skipped += 1;
                continue;
            }
            let input = match (parse_field(field), mode) {
                (CellInput::Formula(f), CsvMode::Flatten) => CellInput::Text(f),
                (input, _) => input,
            };
            sheet.set_input(row, col, input)?;
            written += 1;
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "CSV fields outside the sheet were dropped");
    }
    sheet.recalculate();
    tracing::debug!(written, records = records.len(), "loaded CSV");
    Ok(written)
}

/// Split CSV text into records, handling quoted fields.
///
/// Quoted fields may contain commas, doubled quotes and line breaks, and keep
/// their whitespace. Unquoted fields are trimmed.
pub(crate) fn parse_csv_records(content: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut chars = content.chars().peekable();

    fn finish_field(fields: &mut Vec<String>, current: &mut String, quoted: bool) {
        let field = std::mem::take(current);
        if quoted {
            fields.push(field);
        } else {
            fields.push(field.trim().to_string());
        }
    }

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    current.push(c);
                }
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                field_was_quoted = true;
                quote_line = line;
            }
            ',' => {
                finish_field(&mut fields, &mut current, field_was_quoted);
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                finish_field(&mut fields, &mut current, field_was_quoted);
                field_was_quoted = false;
                records.push(std::mem::take(&mut fields));
                line += 1;
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(GridcalcError::Parse {
            line: quote_line,
            message: "Unterminated quoted field".to_string(),
        });
    }
    if field_was_quoted || !current.is_empty() || !fields.is_empty() {
        finish_field(&mut fields, &mut current, field_was_quoted);
        records.push(fields);
    }
    Ok(records)
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    let needs_quotes = field.contains([',', '"', '\n', '\r'])
        || field.starts_with(char::is_whitespace)
        || field.ends_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
