//! gridcalc_engine - Spreadsheet cell model, formula evaluator and builtins.

pub mod builtins;
pub mod engine;
