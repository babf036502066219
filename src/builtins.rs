// ABOUTME: Built-in functions callable without a module prefix (§4.4)

use crate::error::{HplError, Position};
use crate::value::Value;
use std::io::Write;

/// Looks up and calls a built-in by name, or returns `None` if `name` isn't
/// one of the fixed built-in set — the caller (a bare `Call` with no
/// matching top-level function) then reports an undefined-name error
/// instead of a built-in-specific one.
pub fn call(name: &str, args: &[Value], pos: Position) -> Option<Result<Value, HplError>> {
    let result = match name {
        "len" => len(args, pos),
        "int" => int(args, pos),
        "str" => str_fn(args, pos),
        "type" => type_fn(args, pos),
        "abs" => abs(args, pos),
        "max" => max(args, pos),
        "min" => min(args, pos),
        "input" => input(args, pos),
        _ => return None,
    };
    Some(result)
}

fn arity_error(name: &str, expected: &str, got: usize, pos: Position) -> HplError {
    HplError::value(
        name,
        format!("expected {expected} argument(s), got {got}"),
        pos,
    )
}

fn type_error(name: &str, expected: &str, got: &Value, pos: Position) -> HplError {
    HplError::type_error(name, expected, got.type_name(), pos)
}

/// `len(array|string)`: element count or character count.
fn len(args: &[Value], pos: Position) -> Result<Value, HplError> {
    if args.len() != 1 {
        return Err(arity_error("len", "1", args.len(), pos));
    }
    match &args[0] {
        Value::Array(items) => Ok(Value::Int(items.borrow().len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        other => Err(type_error("len", "array or string", other, pos)),
    }
}

/// `int(value)`: numeric/string coercion to an integer. A string that
/// doesn't parse is a value error, not a type error, since the operand's
/// type was correct.
fn int(args: &[Value], pos: Position) -> Result<Value, HplError> {
    if args.len() != 1 {
        return Err(arity_error("int", "1", args.len(), pos));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) => Ok(Value::Int(*n as i64)),
        Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| HplError::value("int", format!("cannot parse '{s}' as an integer"), pos)),
        other => Err(type_error("int", "number, bool, or string", other, pos)),
    }
}

/// `str(value)`: the uniform display conversion every value supports.
fn str_fn(args: &[Value], pos: Position) -> Result<Value, HplError> {
    if args.len() != 1 {
        return Err(arity_error("str", "1", args.len(), pos));
    }
    Ok(Value::Str(args[0].to_string()))
}

/// `type(value)`: the runtime type name used throughout error messages.
fn type_fn(args: &[Value], pos: Position) -> Result<Value, HplError> {
    if args.len() != 1 {
        return Err(arity_error("type", "1", args.len(), pos));
    }
    Ok(Value::Str(args[0].type_name().to_string()))
}

/// `abs(number)`: magnitude, preserving int-vs-float.
fn abs(args: &[Value], pos: Position) -> Result<Value, HplError> {
    if args.len() != 1 {
        return Err(arity_error("abs", "1", args.len(), pos));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(n.abs())),
        Value::Float(n) => Ok(Value::Float(n.abs())),
        other => Err(type_error("abs", "number", other, pos)),
    }
}

/// `max(a, b, …)` / `min(a, b, …)`: variadic, numeric-only, preserving the
/// winning argument's own int-vs-float tag rather than forcing a common
/// type.
fn max(args: &[Value], pos: Position) -> Result<Value, HplError> {
    extremum(args, pos, "max", |a, b| a > b)
}

fn min(args: &[Value], pos: Position) -> Result<Value, HplError> {
    extremum(args, pos, "min", |a, b| a < b)
}

fn extremum(
    args: &[Value],
    pos: Position,
    name: &str,
    better: impl Fn(f64, f64) -> bool,
) -> Result<Value, HplError> {
    if args.is_empty() {
        return Err(arity_error(name, "at least 1", 0, pos));
    }
    let mut best = &args[0];
    let mut best_num = as_f64(best, name, pos)?;
    for candidate in &args[1..] {
        let candidate_num = as_f64(candidate, name, pos)?;
        if better(candidate_num, best_num) {
            best = candidate;
            best_num = candidate_num;
        }
    }
    Ok(best.clone())
}

fn as_f64(value: &Value, name: &str, pos: Position) -> Result<f64, HplError> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        other => Err(type_error(name, "number", other, pos)),
    }
}

/// `input()` / `input(prompt)`: prints the optional prompt without a
/// trailing newline, then reads one line from stdin with the trailing
/// newline stripped (§9's resolved open question).
fn input(args: &[Value], pos: Position) -> Result<Value, HplError> {
    if args.len() > 1 {
        return Err(arity_error("input", "0 or 1", args.len(), pos));
    }
    if let Some(prompt) = args.first() {
        print!("{prompt}");
        std::io::stdout()
            .flush()
            .map_err(|e| HplError::value("input", format!("failed to flush stdout: {e}"), pos))?;
    }
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| HplError::value("input", format!("failed to read stdin: {e}"), pos))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::Str(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> Position {
        Position::unknown()
    }

    #[test]
    fn len_counts_array_and_string() {
        assert!(matches!(
            call("len", &[Value::new_array(vec![Value::Int(1), Value::Int(2)])], p()),
            Some(Ok(Value::Int(2)))
        ));
        assert!(matches!(
            call("len", &[Value::Str("hi".into())], p()),
            Some(Ok(Value::Int(2)))
        ));
    }

    #[test]
    fn len_rejects_non_collection() {
        let err = call("len", &[Value::Int(1)], p()).unwrap().unwrap_err();
        assert!(matches!(err, HplError::Type { .. }));
    }

    #[test]
    fn int_parses_and_truncates() {
        assert!(matches!(call("int", &[Value::Str("42".into())], p()), Some(Ok(Value::Int(42)))));
        assert!(matches!(call("int", &[Value::Float(3.9)], p()), Some(Ok(Value::Int(3)))));
    }

    #[test]
    fn int_on_bad_string_is_value_error() {
        let err = call("int", &[Value::Str("nope".into())], p()).unwrap().unwrap_err();
        assert!(matches!(err, HplError::Value { .. }));
    }

    #[test]
    fn str_uses_display_conversion() {
        assert!(matches!(
            call("str", &[Value::Bool(true)], p()),
            Some(Ok(Value::Str(s))) if s == "true"
        ));
    }

    #[test]
    fn type_returns_type_name() {
        assert!(matches!(
            call("type", &[Value::Null], p()),
            Some(Ok(Value::Str(s))) if s == "null"
        ));
    }

    #[test]
    fn abs_preserves_number_kind() {
        assert!(matches!(call("abs", &[Value::Int(-5)], p()), Some(Ok(Value::Int(5)))));
        assert!(matches!(call("abs", &[Value::Float(-1.5)], p()), Some(Ok(Value::Float(n))) if n == 1.5));
    }

    #[test]
    fn max_and_min_pick_winning_argument_unchanged() {
        assert!(matches!(
            call("max", &[Value::Int(1), Value::Float(2.5), Value::Int(2)], p()),
            Some(Ok(Value::Float(n))) if n == 2.5
        ));
        assert!(matches!(
            call("min", &[Value::Int(1), Value::Float(2.5), Value::Int(2)], p()),
            Some(Ok(Value::Int(1)))
        ));
    }

    #[test]
    fn unknown_builtin_returns_none() {
        assert!(call("nonexistent", &[], p()).is_none());
    }
}
