// ABOUTME: Built-in `json` stdlib module (§4.5 layer 1)

use crate::error::{HplError, Position};
use crate::module::{ModuleDescriptor, StdlibModule};
use crate::value::Value;
use hpl_macros::module_fn;

/// Converts a runtime value to JSON. HPL has no map/object-literal type, so
/// a JSON object round-trips as an array of `[key, value]` two-element
/// arrays rather than being lost entirely; `Value::Object`/`Value::Module`
/// have no JSON representation and are a type error.
fn value_to_json(value: &Value) -> Result<serde_json::Value, HplError> {
    match value {
        Value::Int(n) => Ok(serde_json::Value::Number((*n).into())),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| HplError::value("json.encode", format!("cannot encode {n} as JSON"), Position::unknown())),
        Value::Str(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Null => Ok(serde_json::Value::Null),
        Value::Array(items) => {
            let encoded: Result<Vec<_>, _> = items.borrow().iter().map(value_to_json).collect();
            Ok(serde_json::Value::Array(encoded?))
        }
        other => Err(HplError::type_error(
            "json.encode",
            "int, float, string, bool, null, or array",
            other.type_name(),
            Position::unknown(),
        )),
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::new_array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::new_array(
            map.iter()
                .map(|(k, v)| Value::new_array(vec![Value::Str(k.clone()), json_to_value(v)]))
                .collect(),
        ),
    }
}

#[module_fn(arity = "1")]
/// Encodes a value as a compact JSON string.
pub fn encode(args: &[Value]) -> Result<Value, HplError> {
    let json = value_to_json(&args[0])?;
    serde_json::to_string(&json)
        .map(Value::Str)
        .map_err(|e| HplError::value("json.encode", e.to_string(), Position::unknown()))
}

#[module_fn(arity = "1")]
/// Encodes a value as an indented, human-readable JSON string.
pub fn pretty(args: &[Value]) -> Result<Value, HplError> {
    let json = value_to_json(&args[0])?;
    serde_json::to_string_pretty(&json)
        .map(Value::Str)
        .map_err(|e| HplError::value("json.pretty", e.to_string(), Position::unknown()))
}

#[module_fn(arity = "1")]
/// Decodes a JSON string into a value. Malformed JSON is a value error,
/// since the argument's type (string) was correct.
pub fn decode(args: &[Value]) -> Result<Value, HplError> {
    let text = match &args[0] {
        Value::Str(s) => s,
        other => return Err(HplError::type_error("json.decode", "string", other.type_name(), Position::unknown())),
    };
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| HplError::value("json.decode", e.to_string(), Position::unknown()))?;
    Ok(json_to_value(&json))
}

fn build() -> ModuleDescriptor {
    ModuleDescriptor::new("json").with_functions([encode_entry(), pretty_entry(), decode_entry()])
}

inventory::submit! { StdlibModule { name: "json", build } }
