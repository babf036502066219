// ABOUTME: Built-in `os` stdlib module (§4.5 layer 1)

use crate::error::{HplError, Position};
use crate::module::{ModuleDescriptor, StdlibModule};
use crate::value::Value;
use hpl_macros::module_fn;

#[module_fn(arity = "1")]
/// Reads an environment variable, returning `null` when it isn't set.
pub fn getenv(args: &[Value]) -> Result<Value, HplError> {
    let name = match &args[0] {
        Value::Str(s) => s,
        other => return Err(HplError::type_error("os.getenv", "string", other.type_name(), Position::unknown())),
    };
    Ok(std::env::var(name).map(Value::Str).unwrap_or(Value::Null))
}

#[module_fn(arity = "1")]
/// Runs a shell command and returns its captured stdout, trimmed of a
/// trailing newline. A non-zero exit status is a value error carrying
/// stderr, since the command itself was well-formed.
pub fn execute(args: &[Value]) -> Result<Value, HplError> {
    let command = match &args[0] {
        Value::Str(s) => s,
        other => return Err(HplError::type_error("os.execute", "string", other.type_name(), Position::unknown())),
    };
    let output = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|e| HplError::value("os.execute", e.to_string(), Position::unknown()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(HplError::value("os.execute", format!("command failed: {stderr}"), Position::unknown()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
    Ok(Value::Str(stdout))
}

#[module_fn(arity = "0")]
/// The current working directory.
pub fn cwd(_args: &[Value]) -> Result<Value, HplError> {
    std::env::current_dir()
        .map(|p| Value::Str(p.to_string_lossy().into_owned()))
        .map_err(|e| HplError::value("os.cwd", e.to_string(), Position::unknown()))
}

fn build() -> ModuleDescriptor {
    ModuleDescriptor::new("os").with_functions([getenv_entry(), execute_entry(), cwd_entry()])
}

inventory::submit! { StdlibModule { name: "os", build } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getenv_returns_null_for_unset_variable() {
        let m = build();
        let result = m.call("getenv", &[Value::Str("HPL_TEST_UNSET_VAR_XYZ".into())]).unwrap();
        assert!(matches!(result, Value::Null));
    }

    #[test]
    fn execute_runs_a_shell_command() {
        let m = build();
        let result = m.call("execute", &[Value::Str("echo hi".into())]).unwrap();
        assert!(matches!(result, Value::Str(s) if s == "hi"));
    }

    #[test]
    fn execute_failing_command_is_value_error() {
        let m = build();
        let err = m.call("execute", &[Value::Str("exit 1".into())]).unwrap_err();
        assert!(matches!(err, HplError::Value { .. }));
    }

    #[test]
    fn cwd_returns_a_non_empty_string() {
        let m = build();
        let result = m.call("cwd", &[]).unwrap();
        assert!(matches!(result, Value::Str(s) if !s.is_empty()));
    }
}
