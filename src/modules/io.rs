// ABOUTME: Built-in `io` stdlib module (§4.5 layer 1)

use crate::error::{HplError, Position};
use crate::module::{ModuleDescriptor, StdlibModule};
use crate::value::Value;
use hpl_macros::module_fn;

fn as_path(args: &[Value], name: &str) -> Result<&str, HplError> {
    match args.first() {
        Some(Value::Str(s)) => Ok(s.as_str()),
        Some(other) => Err(HplError::type_error(name, "string", other.type_name(), Position::unknown())),
        None => Err(HplError::value(name, "expected a path argument", Position::unknown())),
    }
}

#[module_fn(arity = "1")]
/// Reads an entire file's contents as a string.
pub fn read_file(args: &[Value]) -> Result<Value, HplError> {
    let path = as_path(args, "io.read_file")?;
    std::fs::read_to_string(path)
        .map(Value::Str)
        .map_err(|e| HplError::value("io.read_file", e.to_string(), Position::unknown()))
}

#[module_fn(arity = "2")]
/// Writes a string to a file, overwriting any existing contents.
pub fn write_file(args: &[Value]) -> Result<Value, HplError> {
    let path = as_path(args, "io.write_file")?;
    let contents = match &args[1] {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    };
    std::fs::write(path, contents)
        .map(|_| Value::Null)
        .map_err(|e| HplError::value("io.write_file", e.to_string(), Position::unknown()))
}

#[module_fn(arity = "2")]
/// Appends a string to the end of a file, creating it if it doesn't exist.
pub fn append_file(args: &[Value]) -> Result<Value, HplError> {
    use std::io::Write;
    let path = as_path(args, "io.append_file")?;
    let contents = match &args[1] {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    };
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| f.write_all(contents.as_bytes()))
        .map(|_| Value::Null)
        .map_err(|e| HplError::value("io.append_file", e.to_string(), Position::unknown()))
}

#[module_fn(arity = "1")]
/// Whether a file or directory exists at the given path.
pub fn exists(args: &[Value]) -> Result<Value, HplError> {
    let path = as_path(args, "io.exists")?;
    Ok(Value::Bool(std::path::Path::new(path).exists()))
}

fn build() -> ModuleDescriptor {
    ModuleDescriptor::new("io").with_functions([
        read_file_entry(),
        write_file_entry(),
        append_file_entry(),
        exists_entry(),
    ])
}

inventory::submit! { StdlibModule { name: "io", build } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let m = build();
        let path = std::env::temp_dir().join(format!("hpl_io_test_{}", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        m.call("write_file", &[Value::Str(path_str.clone()), Value::Str("hello".into())])
            .unwrap();
        let read = m.call("read_file", &[Value::Str(path_str.clone())]).unwrap();
        assert!(matches!(read, Value::Str(s) if s == "hello"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn exists_reports_missing_path_as_false() {
        let m = build();
        let result = m.call("exists", &[Value::Str("/nonexistent/path/hpl-test".into())]).unwrap();
        assert!(matches!(result, Value::Bool(false)));
    }

    #[test]
    fn read_file_missing_is_value_error() {
        let m = build();
        let err = m.call("read_file", &[Value::Str("/nonexistent/path/hpl-test".into())]).unwrap_err();
        assert!(matches!(err, HplError::Value { .. }));
    }
}
