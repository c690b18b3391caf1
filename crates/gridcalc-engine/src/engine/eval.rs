//! Formula evaluation.
//!
//! The evaluator is a recursive-descent parser that computes while it parses:
//! there is no token stream and no AST, just a byte cursor into the formula
//! text. Grammar, highest binding first:
//!
//! ```text
//! factor     := number | "(" comparison ")" | function_call | cell_ref | range_ref
//!             | ("+" | "-") factor
//! term       := factor (("*" | "/") factor)*
//! arith      := term (("+" | "-") term)*
//! comparison := arith (("=" | "<>" | "<" | "<=" | ">" | ">=") arith)?
//! formula    := "="? comparison
//! ```
//!
//! Syntax errors abort through `?` and surface as `#PARSE!`. Every other
//! error travels as [`Value::Error`] so the rest of the text is still
//! consumed and checked.

use serde::Deserialize;
use std::cmp::Ordering;

use super::cell::{Cell, CellType, FormulaResult};
use super::cell_ref::{CellRange, CellRef, letters_to_col};
use super::error::CellError;
use super::format::format_number;
use super::value::Value;
use crate::builtins::{self, ArgShape, EPSILON, Function};

/// Read access to the cells a formula may reference.
pub trait CellSource {
    /// The cell at a position, or None when it was never written or lies
    /// outside the grid. Both read as empty.
    fn cell(&self, row: usize, col: usize) -> Option<&Cell>;
}

/// Resource caps applied while evaluating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalLimits {
    /// Most values a single function call may gather from its ranges.
    pub max_range_values: usize,
    /// Deepest nesting of parentheses, unary signs and function calls.
    pub max_nesting: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits {
            max_range_values: 1000,
            max_nesting: 64,
        }
    }
}

/// Per-evaluation state threaded through the parser.
#[derive(Clone, Debug, Default)]
pub struct EvalContext {
    /// The formula cell whose result is being computed, if any.
    pub current: Option<CellRef>,
    pub limits: EvalLimits,
}

impl EvalContext {
    pub fn new(limits: EvalLimits) -> Self {
        EvalContext {
            current: None,
            limits,
        }
    }

    pub fn for_cell(row: usize, col: usize, limits: EvalLimits) -> Self {
        EvalContext {
            current: Some(CellRef::new(row, col)),
            limits,
        }
    }
}

/// Evaluate formula text (with or without the leading '=') against `cells`.
pub fn evaluate_formula(cells: &dyn CellSource, formula: &str, ctx: &EvalContext) -> FormulaResult {
    let mut parser = Parser {
        text: formula,
        pos: 0,
        depth: 0,
        cells,
        ctx,
    };
    match parser.formula() {
        Ok(value) => value.into_result(),
        Err(err) => {
            tracing::debug!(
                formula,
                pos = err.pos,
                cell = ?ctx.current,
                "formula syntax error: {}",
                err.message
            );
            FormulaResult::error(CellError::Parse)
        }
    }
}

#[derive(Debug)]
struct SyntaxError {
    pos: usize,
    message: &'static str,
}

type Parse<T> = Result<T, SyntaxError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(self, ord: Option<Ordering>) -> bool {
        match self {
            CompareOp::Eq => ord == Some(Ordering::Equal),
            CompareOp::Ne => ord != Some(Ordering::Equal),
            CompareOp::Lt => ord == Some(Ordering::Less),
            CompareOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Gt => ord == Some(Ordering::Greater),
            CompareOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        }
    }

    /// `=` and `<>` use an absolute tolerance; the orderings are exact.
    fn numeric(self, l: f64, r: f64) -> bool {
        match self {
            CompareOp::Eq => (l - r).abs() < EPSILON,
            CompareOp::Ne => (l - r).abs() >= EPSILON,
            _ => self.holds(l.partial_cmp(&r)),
        }
    }
}

fn truth(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
    cells: &'a dyn CellSource,
    ctx: &'a EvalContext,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn fail<T>(&self, message: &'static str) -> Parse<T> {
        Err(SyntaxError {
            pos: self.pos,
            message,
        })
    }

    /// Skip whitespace and consume `byte` if it is next.
    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8, message: &'static str) -> Parse<()> {
        if self.eat(byte) { Ok(()) } else { self.fail(message) }
    }

    fn formula(&mut self) -> Parse<Value> {
        self.eat(b'=');
        let value = self.comparison()?;
        self.skip_ws();
        if self.pos < self.text.len() {
            return self.fail("unexpected trailing input");
        }
        Ok(value)
    }

    fn comparison_op(&mut self) -> Option<CompareOp> {
        self.skip_ws();
        let (op, width) = match (self.peek()?, self.peek_at(1)) {
            (b'>', Some(b'=')) => (CompareOp::Ge, 2),
            (b'>', _) => (CompareOp::Gt, 1),
            (b'<', Some(b'=')) => (CompareOp::Le, 2),
            (b'<', Some(b'>')) => (CompareOp::Ne, 2),
            (b'<', _) => (CompareOp::Lt, 1),
            (b'=', _) => (CompareOp::Eq, 1),
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn comparison(&mut self) -> Parse<Value> {
        if let Some(value) = self.string_comparison()? {
            return Ok(value);
        }
        let left = self.arith()?;
        let Some(op) = self.comparison_op() else {
            return Ok(left);
        };
        let right = self.arith()?;
        Ok(left.combine(right, |l, r| Ok(truth(op.numeric(l, r)))))
    }

    /// `CELL op "literal"` compares the cell's text instead of coercing to numbers.
    fn string_comparison(&mut self) -> Parse<Option<Value>> {
        let start = self.pos;
        let matched = self.bare_cell_ref().and_then(|cell| {
            let op = self.comparison_op()?;
            self.skip_ws();
            (self.peek() == Some(b'"')).then_some((cell, op))
        });
        let Some((cell, op)) = matched else {
            self.pos = start;
            return Ok(None);
        };
        let literal = self.string_literal()?;
        let value = match self.cell_text(cell) {
            Ok(text) => Value::Number(truth(op.holds(Some(text.as_str().cmp(literal.as_str()))))),
            Err(e) => Value::Error(e),
        };
        Ok(Some(value))
    }

    fn arith(&mut self) -> Parse<Value> {
        let mut acc = self.term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = acc.combine(rhs, |l, r| Ok(l + r));
                }
                Some(b'-') => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    acc = acc.combine(rhs, |l, r| Ok(l - r));
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Parse<Value> {
        let mut acc = self.factor()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    acc = acc.combine(rhs, |l, r| Ok(l * r));
                }
                Some(b'/') => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    acc = acc.combine(rhs, |l, r| {
                        if r == 0.0 {
                            Err(CellError::DivZero)
                        } else {
                            Ok(l / r)
                        }
                    });
                }
                _ => return Ok(acc),
            }
        }
    }

    fn factor(&mut self) -> Parse<Value> {
        self.skip_ws();
        if self.depth >= self.ctx.limits.max_nesting {
            return self.fail("formula nested too deeply");
        }
        self.depth += 1;
        let value = self.factor_inner();
        self.depth -= 1;
        value
    }

    fn factor_inner(&mut self) -> Parse<Value> {
        match self.peek() {
            None => self.fail("unexpected end of formula"),
            Some(b'(') => {
                self.pos += 1;
                let value = self.comparison()?;
                self.expect(b')', "expected ')'")?;
                Ok(value)
            }
            Some(b'-') => {
                self.pos += 1;
                let value = self.factor()?;
                Ok(value.as_number().map(|n| -n).into())
            }
            Some(b'+') => {
                self.pos += 1;
                let value = self.factor()?;
                Ok(value.as_number().into())
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => self.number(),
            Some(b'"') => self.fail("string literal not allowed here"),
            Some(b) if b.is_ascii_alphabetic() => {
                let start = self.pos;
                let name = self.identifier();
                self.skip_ws();
                if self.peek() == Some(b'(') {
                    return self.function_call(name);
                }
                self.pos = start;
                self.reference()
            }
            Some(_) => self.fail("unexpected character"),
        }
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn number(&mut self) -> Parse<Value> {
        let start = self.pos;
        let mut count = self.digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            count += self.digits();
        }
        if count == 0 {
            return self.fail("malformed number");
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                self.pos = mark;
            }
        }
        match self.text[start..self.pos].parse::<f64>() {
            Ok(n) => Ok(Value::Number(n)),
            Err(_) => self.fail("malformed number"),
        }
    }

    /// Double-quoted literal; `""` inside the quotes is an escaped quote.
    fn string_literal(&mut self) -> Parse<String> {
        self.skip_ws();
        if self.peek() != Some(b'"') {
            return self.fail("expected string literal");
        }
        self.pos += 1;
        let mut out = String::new();
        loop {
            let rest = &self.text[self.pos..];
            let Some(end) = rest.find('"') else {
                return self.fail("unterminated string literal");
            };
            out.push_str(&rest[..end]);
            self.pos += end + 1;
            if self.peek() == Some(b'"') {
                out.push('"');
                self.pos += 1;
            } else {
                return Ok(out);
            }
        }
    }

    /// Letters then digits, with no whitespace. Restores the cursor on failure.
    fn ref_token(&mut self) -> Option<CellRef> {
        let start = self.pos;
        let letters = self.identifier();
        let digits_start = self.pos;
        let parsed = if !letters.is_empty() && self.digits() > 0 {
            let col = letters_to_col(letters);
            let row = self.text[digits_start..self.pos]
                .parse::<usize>()
                .ok()
                .and_then(|r| r.checked_sub(1));
            col.zip(row).map(|(col, row)| CellRef::new(row, col))
        } else {
            None
        };
        if parsed.is_none() {
            self.pos = start;
        }
        parsed
    }

    /// A single cell reference that is not part of a range or a call.
    fn bare_cell_ref(&mut self) -> Option<CellRef> {
        let start = self.pos;
        self.skip_ws();
        let cell = self.ref_token();
        let standalone = cell.is_some()
            && !self
                .peek()
                .is_some_and(|b| b == b':' || b == b'(' || b.is_ascii_alphanumeric());
        if standalone {
            cell
        } else {
            self.pos = start;
            None
        }
    }

    fn range_token(&mut self) -> Option<CellRange> {
        let start = self.pos;
        let first = self.ref_token();
        let range = first.and_then(|first| {
            if self.peek() != Some(b':') {
                return None;
            }
            self.pos += 1;
            let second = self.ref_token()?;
            Some(CellRange::from_corners(first, second))
        });
        if range.is_none() {
            self.pos = start;
        }
        range
    }

    fn reference(&mut self) -> Parse<Value> {
        let Some(first) = self.ref_token() else {
            return self.fail("invalid cell reference");
        };
        if self.peek() != Some(b':') {
            return Ok(self.cell_value(first));
        }
        self.pos += 1;
        let Some(second) = self.ref_token() else {
            return self.fail("invalid range");
        };
        // A bare range outside a function call is shorthand for its SUM.
        let range = CellRange::from_corners(first, second);
        Ok(self.range_values(range).map(|v| builtins::sum(&v)).into())
    }

    /// A cell's value in numeric context.
    fn cell_value(&self, at: CellRef) -> Value {
        let Some(cell) = self.cells.cell(at.row, at.col) else {
            return Value::Number(0.0);
        };
        match &cell.contents {
            CellType::Empty => Value::Number(0.0),
            CellType::Number(n) => Value::Number(*n),
            CellType::Text(_) => Value::Error(CellError::Value),
            CellType::Formula { cached, .. } => match (cached.error, &cached.text) {
                (Some(e), _) => Value::Error(e),
                (None, Some(_)) => Value::Error(CellError::Value),
                (None, None) => Value::Number(cached.value),
            },
            CellType::Error(e) => Value::Error(*e),
        }
    }

    /// A cell's value where text is allowed (lookup keys and results).
    fn cell_scalar(&self, at: CellRef) -> Value {
        let Some(cell) = self.cells.cell(at.row, at.col) else {
            return Value::Number(0.0);
        };
        match &cell.contents {
            CellType::Text(s) => Value::Text(s.clone()),
            CellType::Formula { cached, .. } if cached.is_string_result() => {
                Value::Text(cached.text.clone().unwrap_or_default())
            }
            _ => self.cell_value(at),
        }
    }

    /// A cell rendered as text for string comparisons.
    fn cell_text(&self, at: CellRef) -> Result<String, CellError> {
        let Some(cell) = self.cells.cell(at.row, at.col) else {
            return Ok(String::new());
        };
        match &cell.contents {
            CellType::Empty => Ok(String::new()),
            CellType::Text(s) => Ok(s.clone()),
            CellType::Number(n) => Ok(format_number(*n, cell.precision)),
            CellType::Formula { cached, .. } => match (cached.error, &cached.text) {
                (Some(e), _) => Err(e),
                (None, Some(s)) => Ok(s.clone()),
                (None, None) => Ok(format_number(cached.value, cell.precision)),
            },
            CellType::Error(e) => Err(*e),
        }
    }

    /// A cell in a VLOOKUP key column; empty and errored cells never match.
    fn lookup_cell(&self, at: CellRef) -> Option<Value> {
        let cell = self.cells.cell(at.row, at.col)?;
        match &cell.contents {
            CellType::Empty | CellType::Error(_) => None,
            _ => match self.cell_scalar(at) {
                Value::Error(_) => None,
                value => Some(value),
            },
        }
    }

    /// Numeric values of a range. Empty cells count as 0; text and errors are skipped.
    fn range_values(&self, range: CellRange) -> Result<Vec<f64>, CellError> {
        let limit = self.ctx.limits.max_range_values;
        let mut values = Vec::new();
        for at in range.iter() {
            let value = match self.cells.cell(at.row, at.col) {
                None => Some(0.0),
                Some(cell) if cell.is_empty() => Some(0.0),
                Some(cell) => cell.number_value(),
            };
            if let Some(v) = value {
                if values.len() >= limit {
                    return Err(CellError::TooManyValues);
                }
                values.push(v);
            }
        }
        Ok(values)
    }

    fn function_call(&mut self, name: &str) -> Parse<Value> {
        let Some(builtin) = builtins::lookup_builtin(name) else {
            return self.fail("unknown function");
        };
        self.expect(b'(', "expected '('")?;
        match builtin.shape {
            ArgShape::Values => self.values_call(builtin.function),
            ArgShape::Condition => self.if_call(),
            ArgShape::Pair => self.power_call(),
            ArgShape::Lookup => self.vlookup_call(),
        }
    }

    /// One aggregate argument: a range, or any scalar expression.
    fn values_arg(&mut self) -> Parse<Result<Vec<f64>, CellError>> {
        let start = self.pos;
        self.skip_ws();
        if let Some(range) = self.range_token() {
            self.skip_ws();
            if matches!(self.peek(), Some(b',' | b')')) {
                return Ok(self.range_values(range));
            }
        }
        self.pos = start;
        let value = self.comparison()?;
        Ok(value.as_number().map(|n| vec![n]))
    }

    fn values_call(&mut self, function: Function) -> Parse<Value> {
        let limit = self.ctx.limits.max_range_values;
        let mut values = Vec::new();
        let mut error = None;
        loop {
            match self.values_arg()? {
                Ok(mut arg) if error.is_none() => {
                    if values.len() + arg.len() > limit {
                        error = Some(CellError::TooManyValues);
                    } else {
                        values.append(&mut arg);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error.get_or_insert(e);
                }
            }
            if !self.eat(b',') {
                break;
            }
        }
        self.expect(b')', "expected ')' after arguments")?;
        if let Some(e) = error {
            return Ok(Value::Error(e));
        }
        Ok(match builtins::aggregate(function, &values) {
            Some(n) => Value::Number(n),
            None => Value::Error(CellError::Value),
        })
    }

    /// An IF branch: a string literal or an expression.
    fn branch(&mut self) -> Parse<Value> {
        self.skip_ws();
        if self.peek() == Some(b'"') {
            return self.string_literal().map(Value::Text);
        }
        self.comparison()
    }

    fn if_call(&mut self) -> Parse<Value> {
        let condition = self.comparison()?;
        self.expect(b',', "expected ',' after IF condition")?;
        let when_true = self.branch()?;
        self.expect(b',', "expected ',' after IF true branch")?;
        let when_false = self.branch()?;
        self.expect(b')', "expected ')' after IF")?;
        Ok(match condition.as_number() {
            Err(e) => Value::Error(e),
            Ok(c) if c != 0.0 => when_true,
            Ok(_) => when_false,
        })
    }

    fn power_call(&mut self) -> Parse<Value> {
        let base = self.comparison()?;
        self.expect(b',', "expected ',' in POWER")?;
        let exponent = self.comparison()?;
        self.expect(b')', "expected ')' after POWER")?;
        Ok(base.combine(exponent, |b, e| Ok(builtins::power(b, e))))
    }

    fn lookup_key(&mut self) -> Parse<Value> {
        self.skip_ws();
        if self.peek() == Some(b'"') {
            return self.string_literal().map(Value::Text);
        }
        let start = self.pos;
        if let Some(cell) = self.bare_cell_ref() {
            self.skip_ws();
            if self.peek() == Some(b',') {
                return Ok(self.cell_scalar(cell));
            }
        }
        self.pos = start;
        self.comparison()
    }

    /// The table argument: a bare range or a quoted range string.
    fn table_arg(&mut self) -> Parse<Result<CellRange, CellError>> {
        self.skip_ws();
        if self.peek() == Some(b'"') {
            let literal = self.string_literal()?;
            return Ok(CellRange::parse(&literal).ok_or(CellError::Ref));
        }
        match self.range_token() {
            Some(range) => Ok(Ok(range)),
            None => self.fail("expected a range"),
        }
    }

    fn vlookup_call(&mut self) -> Parse<Value> {
        let key = self.lookup_key()?;
        self.expect(b',', "expected ',' after VLOOKUP key")?;
        let table = self.table_arg()?;
        self.expect(b',', "expected ',' after VLOOKUP range")?;
        let col_index = self.comparison()?;
        let exact = if self.eat(b',') {
            Some(self.comparison()?)
        } else {
            None
        };
        self.expect(b')', "expected ')' after VLOOKUP")?;
        Ok(self
            .vlookup(key, table, col_index, exact)
            .unwrap_or_else(Value::Error))
    }

    fn vlookup(
        &self,
        key: Value,
        table: Result<CellRange, CellError>,
        col_index: Value,
        exact: Option<Value>,
    ) -> Result<Value, CellError> {
        if let Some(e) = key.error() {
            return Err(e);
        }
        let table = table?;
        let col_index = col_index.as_number()?.trunc();
        let exact = match exact {
            Some(flag) => flag.as_number()? != 0.0,
            None => false,
        };
        if !(1.0..=table.width() as f64).contains(&col_index) {
            return Err(CellError::Ref);
        }
        if table.height() > self.ctx.limits.max_range_values {
            return Err(CellError::TooManyValues);
        }
        let column: Vec<Option<Value>> = (table.start_row..=table.end_row)
            .map(|row| self.lookup_cell(CellRef::new(row, table.start_col)))
            .collect();
        let hit = builtins::vlookup_row(&key, &column, exact).ok_or(CellError::NotAvailable)?;
        let result_col = table.start_col + col_index as usize - 1;
        Ok(self.cell_scalar(CellRef::new(table.start_row + hit, result_col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestGrid {
        cells: HashMap<CellRef, Cell>,
    }

    impl TestGrid {
        fn cell_mut(&mut self, name: &str) -> &mut Cell {
            let at = CellRef::parse(name).unwrap();
            self.cells
                .entry(at)
                .or_insert_with(|| Cell::new_empty(at.row, at.col))
        }

        fn number(&mut self, name: &str, n: f64) -> &mut Self {
            self.cell_mut(name).set_number(n);
            self
        }

        fn text(&mut self, name: &str, s: &str) -> &mut Self {
            self.cell_mut(name).set_text(s);
            self
        }

        fn cached(&mut self, name: &str, result: FormulaResult) -> &mut Self {
            let cell = self.cell_mut(name);
            cell.set_formula("=0");
            if let CellType::Formula { cached, .. } = &mut cell.contents {
                *cached = result;
            }
            self
        }

        fn eval(&self, formula: &str) -> FormulaResult {
            evaluate_formula(self, formula, &EvalContext::default())
        }

        fn num(&self, formula: &str) -> f64 {
            let result = self.eval(formula);
            assert_eq!(result.error, None, "unexpected error for {}", formula);
            assert!(result.text.is_none(), "unexpected text for {}", formula);
            result.value
        }

        fn err(&self, formula: &str) -> Option<CellError> {
            self.eval(formula).error
        }
    }

    impl CellSource for TestGrid {
        fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
            self.cells.get(&CellRef::new(row, col))
        }
    }

    #[test]
    fn test_precedence_and_parentheses() {
        let grid = TestGrid::default();
        assert_eq!(grid.num("=2+3*4"), 14.0);
        assert_eq!(grid.num("=(2+3)*4"), 20.0);
        assert_eq!(grid.num("= 10 - 4 - 3"), 3.0);
        assert_eq!(grid.num("=8/4/2"), 1.0);
        assert_eq!(grid.num("2*-3"), -6.0);
        assert_eq!(grid.num("=-(1+2)"), -3.0);
        assert_eq!(grid.num("=1.5e2+.5"), 150.5);
    }

    #[test]
    fn test_syntax_errors_are_parse() {
        let grid = TestGrid::default();
        for bad in ["=", "=2+", "=(1+2", "=2+3)", "=1 2", "=\"x\"", "=NOPE(1)", "=A1:", "=SUM(A1:A2"] {
            assert_eq!(grid.err(bad), Some(CellError::Parse), "formula {}", bad);
        }
    }

    #[test]
    fn test_division_by_zero_propagates_through_reference() {
        let mut grid = TestGrid::default();
        grid.number("A1", 5.0);
        assert_eq!(grid.err("=A1/0"), Some(CellError::DivZero));
        grid.cached("B1", FormulaResult::error(CellError::DivZero));
        assert_eq!(grid.err("=B1+1"), Some(CellError::DivZero));
    }

    #[test]
    fn test_text_cell_in_numeric_context_is_value_error() {
        let mut grid = TestGrid::default();
        grid.text("A1", "hello");
        assert_eq!(grid.err("=A1*2"), Some(CellError::Value));
        grid.cached("A2", FormulaResult::text("pos"));
        assert_eq!(grid.err("=A2+1"), Some(CellError::Value));
    }

    #[test]
    fn test_empty_and_missing_cells_read_as_zero() {
        let grid = TestGrid::default();
        assert_eq!(grid.num("=Z99+1"), 1.0);
    }

    #[test]
    fn test_bare_range_is_sum_and_skips_text() {
        let mut grid = TestGrid::default();
        grid.number("A1", 1.0).number("A2", 2.0).text("A3", "x");
        assert_eq!(grid.num("=A1:A3"), 3.0);
        assert_eq!(grid.num("=SUM(A1:A3)"), 3.0);
        assert_eq!(grid.num("=sum(a3:a1)"), 3.0);
    }

    #[test]
    fn test_aggregates_over_ranges_and_scalars() {
        let mut grid = TestGrid::default();
        grid.number("A1", 4.0).number("A2", 1.0).number("A3", 3.0).number("A4", 2.0);
        assert_eq!(grid.num("=AVG(A1:A4)"), 2.5);
        assert_eq!(grid.num("=MAX(A1:A4)"), 4.0);
        assert_eq!(grid.num("=MIN(A1:A4)"), 1.0);
        assert_eq!(grid.num("=MEDIAN(A1:A4)"), 2.5);
        assert_eq!(grid.num("=MEDIAN(A1:A3)"), 3.0);
        assert_eq!(grid.num("=SUM(A1)"), 4.0);
        assert_eq!(grid.num("=SUM(7)"), 7.0);
        assert_eq!(grid.num("=SUM(A1:A2, 10, A4)"), 17.0);
        assert_eq!(grid.num("=SUM(A1:A2)*2"), 10.0);
    }

    #[test]
    fn test_empty_cells_count_in_average() {
        let mut grid = TestGrid::default();
        grid.number("A1", 3.0).number("A2", 3.0);
        assert_eq!(grid.num("=AVG(A1:A3)"), 2.0);
    }

    #[test]
    fn test_range_value_limit() {
        let grid = TestGrid::default();
        let ctx = EvalContext::new(EvalLimits {
            max_range_values: 4,
            ..EvalLimits::default()
        });
        let ok = evaluate_formula(&grid, "=SUM(A1:B2)", &ctx);
        assert_eq!(ok.error, None);
        let too_many = evaluate_formula(&grid, "=SUM(A1:A5)", &ctx);
        assert_eq!(too_many.error, Some(CellError::TooManyValues));
        let split = evaluate_formula(&grid, "=SUM(A1:A3, B1:B3)", &ctx);
        assert_eq!(split.error, Some(CellError::TooManyValues));
    }

    #[test]
    fn test_vlookup_table_height_limit() {
        let mut grid = TestGrid::default();
        grid.number("A1", 1.0).number("B1", 10.0);
        let ctx = EvalContext::new(EvalLimits {
            max_range_values: 4,
            ..EvalLimits::default()
        });
        let fits = evaluate_formula(&grid, "=VLOOKUP(1, A1:B4, 2, 1)", &ctx);
        assert_eq!(fits, FormulaResult::number(10.0));
        let too_tall = evaluate_formula(&grid, "=VLOOKUP(1, A1:B5, 2, 1)", &ctx);
        assert_eq!(too_tall.error, Some(CellError::TooManyValues));
    }

    #[test]
    fn test_nesting_limit_is_a_parse_error() {
        let grid = TestGrid::default();
        let deep = format!("={}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(grid.err(&deep), Some(CellError::Parse));
        let shallow = format!("={}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(grid.num(&shallow), 1.0);
    }

    #[test]
    fn test_numeric_comparisons() {
        let mut grid = TestGrid::default();
        grid.number("A1", 5.0);
        assert_eq!(grid.num("=A1>0"), 1.0);
        assert_eq!(grid.num("=A1<0"), 0.0);
        assert_eq!(grid.num("=A1>=5"), 1.0);
        assert_eq!(grid.num("=A1<=4"), 0.0);
        assert_eq!(grid.num("=A1<>5"), 0.0);
        assert_eq!(grid.num("=0.1+0.2=0.3"), 1.0);
        assert_eq!(grid.num("=0.1+0.2<>0.3"), 0.0);
    }

    #[test]
    fn test_string_comparison_against_cell() {
        let mut grid = TestGrid::default();
        grid.text("A1", "apple").number("A2", 2.5);
        grid.cached("A3", FormulaResult::text("pos"));
        grid.cached("A4", FormulaResult::error(CellError::Ref));
        assert_eq!(grid.num("=A1=\"apple\""), 1.0);
        assert_eq!(grid.num("=A1=\"Apple\""), 0.0);
        assert_eq!(grid.num("=A1<\"banana\""), 1.0);
        assert_eq!(grid.num("=A1<>\"pear\""), 1.0);
        assert_eq!(grid.num("=A2=\"2.5\""), 1.0);
        assert_eq!(grid.num("=A3=\"pos\""), 1.0);
        assert_eq!(grid.num("=B9=\"\""), 1.0);
        assert_eq!(grid.err("=A4=\"x\""), Some(CellError::Ref));
    }

    #[test]
    fn test_if_produces_string_results() {
        let mut grid = TestGrid::default();
        grid.number("A1", 5.0);
        let result = grid.eval("=IF(A1>0,\"pos\",\"nonpos\")");
        assert!(result.is_string_result());
        assert_eq!(result.text.as_deref(), Some("pos"));

        grid.number("A1", -1.0);
        let result = grid.eval("=IF(A1>0,\"pos\",\"nonpos\")");
        assert_eq!(result.text.as_deref(), Some("nonpos"));

        assert_eq!(grid.num("=IF(A1>0, 1, A1*10)"), -10.0);
        assert_eq!(grid.num("=if(1, 2, 3) + 1"), 3.0);
    }

    #[test]
    fn test_if_ignores_errors_in_untaken_branch() {
        let grid = TestGrid::default();
        assert_eq!(grid.num("=IF(1, 4, 1/0)"), 4.0);
        assert_eq!(grid.err("=IF(0, 4, 1/0)"), Some(CellError::DivZero));
        assert_eq!(grid.err("=IF(1, 4)"), Some(CellError::Parse));
        assert_eq!(grid.err("=IF(1/0, 1, 2)"), Some(CellError::DivZero));
    }

    #[test]
    fn test_if_with_string_condition() {
        let mut grid = TestGrid::default();
        grid.text("B1", "yes");
        let result = grid.eval("=IF(B1=\"yes\", \"on\", \"off\")");
        assert_eq!(result.text.as_deref(), Some("on"));
    }

    #[test]
    fn test_power() {
        let grid = TestGrid::default();
        assert_eq!(grid.num("=POWER(2, 10)"), 1024.0);
        assert_eq!(grid.num("=POWER(9, 0.5)"), 3.0);
        assert_eq!(grid.err("=POWER(2)"), Some(CellError::Parse));
    }

    fn fruit_table() -> TestGrid {
        let mut grid = TestGrid::default();
        grid.text("A1", "Apple").number("B1", 0.5);
        grid.text("A2", "Orange").number("B2", 0.75);
        grid.text("A3", "Banana").number("B3", 0.3);
        grid
    }

    #[test]
    fn test_vlookup_exact_text() {
        let grid = fruit_table();
        assert_eq!(grid.num("=VLOOKUP(\"Orange\", A1:B3, 2, 1)"), 0.75);
        assert_eq!(grid.err("=VLOOKUP(\"Kiwi\", A1:B3, 2, 1)"), Some(CellError::NotAvailable));
        assert_eq!(grid.num("=VLOOKUP(\"Banana\", \"A1:B3\", 2, 1)"), 0.3);
    }

    #[test]
    fn test_vlookup_returns_text_column() {
        let grid = fruit_table();
        let result = grid.eval("=VLOOKUP(\"Apple\", A1:B3, 1, 1)");
        assert_eq!(result.text.as_deref(), Some("Apple"));
    }

    #[test]
    fn test_vlookup_key_from_cell_and_bad_index() {
        let mut grid = fruit_table();
        grid.text("D1", "Banana");
        assert_eq!(grid.num("=VLOOKUP(D1, A1:B3, 2, 1)"), 0.3);
        assert_eq!(grid.err("=VLOOKUP(D1, A1:B3, 3, 1)"), Some(CellError::Ref));
        assert_eq!(grid.err("=VLOOKUP(D1, A1:B3, 0, 1)"), Some(CellError::Ref));
        assert_eq!(grid.err("=VLOOKUP(D1, \"bogus\", 2, 1)"), Some(CellError::Ref));
    }

    #[test]
    fn test_vlookup_approximate_numeric() {
        let mut grid = TestGrid::default();
        grid.number("A1", 0.0).number("B1", 1.0);
        grid.number("A2", 100.0).number("B2", 2.0);
        grid.number("A3", 500.0).number("B3", 3.0);
        assert_eq!(grid.num("=VLOOKUP(250, A1:B3, 2)"), 2.0);
        assert_eq!(grid.num("=VLOOKUP(500, A1:B3, 2, 0)"), 3.0);
        assert_eq!(grid.num("=VLOOKUP(9999, A1:B3, 2)"), 3.0);
        assert_eq!(grid.err("=VLOOKUP(-1, A1:B3, 2)"), Some(CellError::NotAvailable));
        assert_eq!(grid.err("=VLOOKUP(250, A1:B3, 2, 1)"), Some(CellError::NotAvailable));
    }
}
