//! Intermediate values produced while evaluating a formula.

use super::cell::FormulaResult;
use super::error::CellError;

/// A scalar flowing through the evaluator.
///
/// Errors travel as values so that evaluation of the rest of the
/// expression can still consume the formula text.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(CellError),
}

impl Value {
    /// Coerce to a number; text is a `#VALUE!` in numeric context.
    pub fn as_number(&self) -> Result<f64, CellError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(_) => Err(CellError::Value),
            Value::Error(e) => Err(*e),
        }
    }

    pub fn error(&self) -> Option<CellError> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Apply a numeric binary operation, propagating the leftmost error.
    pub(crate) fn combine(
        self,
        rhs: Value,
        op: impl FnOnce(f64, f64) -> Result<f64, CellError>,
    ) -> Value {
        let result = self
            .as_number()
            .and_then(|l| rhs.as_number().map(|r| (l, r)))
            .and_then(|(l, r)| op(l, r));
        match result {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }

    pub fn into_result(self) -> FormulaResult {
        match self {
            Value::Number(n) => FormulaResult::number(n),
            Value::Text(s) => FormulaResult::text(s),
            Value::Error(e) => FormulaResult::error(e),
        }
    }
}

impl From<Result<f64, CellError>> for Value {
    fn from(result: Result<f64, CellError>) -> Self {
        match result {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_propagates_leftmost_error() {
        let v = Value::Error(CellError::Ref).combine(Value::Error(CellError::DivZero), |l, r| Ok(l + r));
        assert_eq!(v, Value::Error(CellError::Ref));

        let v = Value::Number(1.0).combine(Value::Text("x".into()), |l, r| Ok(l + r));
        assert_eq!(v, Value::Error(CellError::Value));
    }

    #[test]
    fn test_into_result_keeps_string_flag() {
        let result = Value::Text("pos".into()).into_result();
        assert!(result.is_string_result());
        assert_eq!(result.text.as_deref(), Some("pos"));
    }
}
