//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`) and
//!   matched case-insensitively.
//! - The functions here are pure: the evaluator gathers the argument values
//!   out of the sheet and hands them over as plain slices.
//! - If you add a new built-in, add it to `BUILTINS` and handle its
//!   [`Function`] in the evaluator.

use std::cmp::Ordering;

use crate::engine::Value;

/// Absolute tolerance used for numeric equality (MODE, `=`, VLOOKUP keys).
pub const EPSILON: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Sum,
    Avg,
    Max,
    Min,
    Median,
    Mode,
    If,
    Power,
    Vlookup,
}

/// How the evaluator parses a function's argument list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgShape {
    /// Ranges and scalars, flattened into one value list.
    Values,
    /// `(cond, a, b)`
    Condition,
    /// `(a, b)`
    Pair,
    /// `(key, range, col_index, [exact])`
    Lookup,
}

pub struct Builtin {
    pub name: &'static str,
    pub function: Function,
    pub shape: ArgShape,
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "SUM",
        function: Function::Sum,
        shape: ArgShape::Values,
        description: "Sum of numeric values",
    },
    Builtin {
        name: "AVG",
        function: Function::Avg,
        shape: ArgShape::Values,
        description: "Average of numeric values (0 when empty)",
    },
    Builtin {
        name: "MAX",
        function: Function::Max,
        shape: ArgShape::Values,
        description: "Maximum numeric value (0 when empty)",
    },
    Builtin {
        name: "MIN",
        function: Function::Min,
        shape: ArgShape::Values,
        description: "Minimum numeric value (0 when empty)",
    },
    Builtin {
        name: "MEDIAN",
        function: Function::Median,
        shape: ArgShape::Values,
        description: "Middle value, or the mean of the two middle values",
    },
    Builtin {
        name: "MODE",
        function: Function::Mode,
        shape: ArgShape::Values,
        description: "Most frequent value; the first one seen wins ties",
    },
    Builtin {
        name: "IF",
        function: Function::If,
        shape: ArgShape::Condition,
        description: "IF(cond, a, b): a when cond is non-zero, else b",
    },
    Builtin {
        name: "POWER",
        function: Function::Power,
        shape: ArgShape::Pair,
        description: "POWER(base, exp)",
    },
    Builtin {
        name: "VLOOKUP",
        function: Function::Vlookup,
        shape: ArgShape::Lookup,
        description: "VLOOKUP(key, range, col_index, [exact])",
    },
];

/// Resolve a function name, ignoring case.
pub fn lookup_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

/// Apply an aggregate [`Function`] to a value list. Non-aggregates return None.
pub fn aggregate(function: Function, values: &[f64]) -> Option<f64> {
    let result = match function {
        Function::Sum => sum(values),
        Function::Avg => avg(values),
        Function::Max => max(values),
        Function::Min => min(values),
        Function::Median => median(values),
        Function::Mode => mode(values),
        Function::If | Function::Power | Function::Vlookup => return None,
    };
    Some(result)
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sum(values) / values.len() as f64
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Sorts a copy; the caller's slice is left untouched.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn mode(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    let mut best = first;
    let mut best_count = 1;
    for (i, &candidate) in values.iter().enumerate() {
        let count = 1 + values[i + 1..]
            .iter()
            .filter(|&&v| (candidate - v).abs() < EPSILON)
            .count();
        if count > best_count {
            best_count = count;
            best = candidate;
        }
    }
    best
}

pub fn power(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

/// Compare a lookup cell against the key. Numbers compare with [`EPSILON`],
/// text compares ASCII case-insensitively, mixed types never compare.
fn compare_keys(cell: &Value, key: &Value) -> Option<Ordering> {
    match (cell, key) {
        (Value::Number(a), Value::Number(b)) => {
            if (a - b).abs() < EPSILON {
                Some(Ordering::Equal)
            } else {
                a.partial_cmp(b)
            }
        }
        (Value::Text(a), Value::Text(b)) => Some(a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())),
        _ => None,
    }
}

/// Find the row of `first_column` that VLOOKUP selects for `key`.
///
/// `None` entries (empty or errored cells) never match. Exact mode returns
/// the first equal key. Approximate mode assumes the column is sorted
/// ascending: it scans forward and keeps the latest candidate `<= key` that
/// is not smaller than the previous one.
pub fn vlookup_row(key: &Value, first_column: &[Option<Value>], exact: bool) -> Option<usize> {
    if exact {
        return first_column.iter().position(|cell| {
            cell.as_ref()
                .is_some_and(|c| compare_keys(c, key) == Some(Ordering::Equal))
        });
    }

    let mut best: Option<(usize, &Value)> = None;
    for (row, cell) in first_column.iter().enumerate() {
        let Some(cell) = cell else {
            continue;
        };
        if !matches!(compare_keys(cell, key), Some(Ordering::Less | Ordering::Equal)) {
            continue;
        }
        let closer = match best {
            None => true,
            Some((_, current)) => {
                matches!(compare_keys(cell, current), Some(Ordering::Greater | Ordering::Equal))
            }
        };
        if closer {
            best = Some((row, cell));
        }
    }
    best.map(|(row, _)| row)
}
