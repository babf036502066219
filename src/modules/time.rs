// ABOUTME: Built-in `time` stdlib module (§4.5 layer 1)

use crate::error::{HplError, Position};
use crate::module::{ModuleDescriptor, StdlibModule};
use crate::value::Value;
use hpl_macros::module_fn;
use std::time::{SystemTime, UNIX_EPOCH};

#[module_fn(arity = "0")]
/// Seconds since the Unix epoch, as a float for sub-second resolution.
pub fn now(_args: &[Value]) -> Result<Value, HplError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| HplError::value("time.now", e.to_string(), Position::unknown()))?;
    Ok(Value::Float(elapsed.as_secs_f64()))
}

#[module_fn(arity = "1")]
/// Blocks the current thread for the given number of seconds.
pub fn sleep(args: &[Value]) -> Result<Value, HplError> {
    let seconds = match &args[0] {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        other => return Err(HplError::type_error("time.sleep", "number", other.type_name(), Position::unknown())),
    };
    if seconds < 0.0 {
        return Err(HplError::value("time.sleep", "duration must be non-negative", Position::unknown()));
    }
    std::thread::sleep(std::time::Duration::from_secs_f64(seconds));
    Ok(Value::Null)
}

fn build() -> ModuleDescriptor {
    ModuleDescriptor::new("time").with_functions([now_entry(), sleep_entry()])
}

inventory::submit! { StdlibModule { name: "time", build } }
