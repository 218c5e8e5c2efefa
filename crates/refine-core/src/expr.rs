//! Minimal expression evaluator behind text transforms
//!
//! The engine only depends on the `evaluate` signature: an expression plus a
//! cell context produces a value or an explicit, recoverable error. The
//! language itself is deliberately small: the `value` variable, single-quoted
//! string literals, and nested calls of a fixed builtin set.

use crate::table::CellValue;
use thiserror::Error;

/// A per-cell evaluation failure. Recoverable: handled by the operation's
/// on-error policy, never aborts the whole operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EvalError(pub String);

/// The cell a transform expression is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    /// Current value of the target cell
    pub value: &'a CellValue,
    /// Row index of the cell
    pub row_index: usize,
    /// Slot index of the cell
    pub cell_index: usize,
}

/// Evaluate an expression against a cell, producing a candidate new value
pub fn evaluate(expression: &str, ctx: &CellContext<'_>) -> Result<CellValue, EvalError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut parser = Parser {
        chars: &chars,
        pos: 0,
        ctx,
    };
    let value = parser.parse_expr()?;
    parser.skip_ws();
    if parser.pos != parser.chars.len() {
        return Err(EvalError(format!(
            "unexpected trailing input at offset {}",
            parser.pos
        )));
    }
    Ok(value)
}

struct Parser<'a, 'b> {
    chars: &'a [char],
    pos: usize,
    ctx: &'a CellContext<'b>,
}

impl Parser<'_, '_> {
    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, expected: char) -> Result<(), EvalError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(EvalError(format!(
                "expected '{}' at offset {}",
                expected, self.pos
            )))
        }
    }

    fn parse_expr(&mut self) -> Result<CellValue, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some('\'') => self.parse_string_literal(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.parse_ident_or_call(),
            Some(c) => Err(EvalError(format!(
                "unexpected character '{}' at offset {}",
                c, self.pos
            ))),
            None => Err(EvalError("unexpected end of expression".to_string())),
        }
    }

    fn parse_string_literal(&mut self) -> Result<CellValue, EvalError> {
        self.expect('\'')?;
        let mut s = String::new();
        loop {
            match self.peek() {
                Some('\'') => {
                    self.pos += 1;
                    return Ok(CellValue::String(s));
                }
                Some(c) => {
                    s.push(c);
                    self.pos += 1;
                }
                None => return Err(EvalError("unterminated string literal".to_string())),
            }
        }
    }

    fn parse_ident_or_call(&mut self) -> Result<CellValue, EvalError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().collect();

        self.skip_ws();
        if self.peek() != Some('(') {
            return match ident.as_str() {
                "value" => Ok(self.ctx.value.clone()),
                other => Err(EvalError(format!("unknown variable '{}'", other))),
            };
        }

        self.expect('(')?;
        let mut args = Vec::new();
        self.skip_ws();
        if self.peek() != Some(')') {
            loop {
                args.push(self.parse_expr()?);
                self.skip_ws();
                if self.peek() == Some(',') {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(')')?;

        apply_builtin(&ident, &args)
    }
}

fn arg_string(args: &[CellValue], index: usize, function: &str) -> Result<String, EvalError> {
    args.get(index)
        .map(|v| v.to_string_value())
        .ok_or_else(|| EvalError(format!("{}: missing argument {}", function, index + 1)))
}

fn arity(function: &str, args: &[CellValue], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError(format!(
            "{} expects {} argument(s), got {}",
            function,
            expected,
            args.len()
        )))
    }
}

fn apply_builtin(function: &str, args: &[CellValue]) -> Result<CellValue, EvalError> {
    match function {
        "trim" => {
            arity(function, args, 1)?;
            Ok(CellValue::String(
                arg_string(args, 0, function)?.trim().to_string(),
            ))
        }
        "to_upper" => {
            arity(function, args, 1)?;
            Ok(CellValue::String(arg_string(args, 0, function)?.to_uppercase()))
        }
        "to_lower" => {
            arity(function, args, 1)?;
            Ok(CellValue::String(arg_string(args, 0, function)?.to_lowercase()))
        }
        "length" => {
            arity(function, args, 1)?;
            Ok(CellValue::Integer(
                arg_string(args, 0, function)?.chars().count() as i64,
            ))
        }
        "replace" => {
            arity(function, args, 3)?;
            let subject = arg_string(args, 0, function)?;
            let from = arg_string(args, 1, function)?;
            let to = arg_string(args, 2, function)?;
            if from.is_empty() {
                return Err(EvalError("replace: search string is empty".to_string()));
            }
            Ok(CellValue::String(subject.replace(&from, &to)))
        }
        "strip" => {
            arity(function, args, 2)?;
            let subject = arg_string(args, 0, function)?;
            let affix = arg_string(args, 1, function)?;
            let stripped = subject
                .strip_prefix(&affix)
                .or_else(|| subject.strip_suffix(&affix))
                .unwrap_or(subject.as_str());
            Ok(CellValue::String(stripped.to_string()))
        }
        other => Err(EvalError(format!("unknown function '{}'", other))),
    }
}
