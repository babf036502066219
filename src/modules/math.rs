// ABOUTME: Built-in `math` stdlib module (§4.5 layer 1)

use crate::error::{HplError, Position};
use crate::module::{ModuleDescriptor, StdlibModule};
use crate::value::Value;
use hpl_macros::module_fn;

fn one_number(args: &[Value], name: &str) -> Result<f64, HplError> {
    match args.first() {
        Some(Value::Int(n)) => Ok(*n as f64),
        Some(Value::Float(n)) => Ok(*n),
        Some(other) => Err(HplError::type_error(name, "number", other.type_name(), Position::unknown())),
        None => Err(HplError::value(name, "expected 1 argument, got 0", Position::unknown())),
    }
}

#[module_fn(arity = "1")]
/// Square root of a number. A negative argument is a value error, since
/// HPL has no complex type to hold the result.
pub fn sqrt(args: &[Value]) -> Result<Value, HplError> {
    let n = one_number(args, "math.sqrt")?;
    if n < 0.0 {
        return Err(HplError::value("math.sqrt", "argument must be non-negative", Position::unknown()));
    }
    Ok(Value::Float(n.sqrt()))
}

#[module_fn(arity = "2")]
/// Raises `base` to `exponent`. Stays an integer when both arguments are
/// integers and the exponent is non-negative; otherwise promotes to float.
pub fn pow(args: &[Value]) -> Result<Value, HplError> {
    match (&args[0], &args[1]) {
        (Value::Int(base), Value::Int(exp)) if *exp >= 0 => {
            Ok(Value::Int(base.pow(*exp as u32)))
        }
        _ => {
            let base = one_number(&args[..1], "math.pow")?;
            let exp = one_number(&args[1..], "math.pow")?;
            Ok(Value::Float(base.powf(exp)))
        }
    }
}

#[module_fn(arity = "1")]
/// Rounds down to the nearest integer.
pub fn floor(args: &[Value]) -> Result<Value, HplError> {
    Ok(Value::Int(one_number(args, "math.floor")?.floor() as i64))
}

#[module_fn(arity = "1")]
/// Rounds up to the nearest integer.
pub fn ceil(args: &[Value]) -> Result<Value, HplError> {
    Ok(Value::Int(one_number(args, "math.ceil")?.ceil() as i64))
}

#[module_fn(arity = "1")]
/// Rounds to the nearest integer, halves away from zero.
pub fn round(args: &[Value]) -> Result<Value, HplError> {
    Ok(Value::Int(one_number(args, "math.round")?.round() as i64))
}

fn build() -> ModuleDescriptor {
    ModuleDescriptor::new("math")
        .with_functions([
            sqrt_entry(),
            pow_entry(),
            floor_entry(),
            ceil_entry(),
            round_entry(),
        ])
        .with_constant("pi", Value::Float(std::f64::consts::PI))
        .with_constant("e", Value::Float(std::f64::consts::E))
}

inventory::submit! { StdlibModule { name: "math", build } }
