//! Text bridges between cells and strings: field classification and
//! in-memory CSV.

mod csv;
mod parser;

pub use csv::{CsvMode, load_csv_str, to_csv_string};
pub use parser::{CellInput, TEXT_PREFIX, cell_input_string, parse_field};
