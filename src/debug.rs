// ABOUTME: Debug report assembled on an uncaught error, consumed by the hpl-debug binary

use crate::error::HplError;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// Everything §7 requires an uncaught error to be able to report: the error
/// kind and message, its source location if known, the call stack
/// (innermost last), and a snapshot of the scopes at the failure point.
pub struct DebugReport {
    pub kind: &'static str,
    pub message: String,
    pub position: Option<(usize, usize)>,
    pub call_stack: Vec<String>,
    pub locals: HashMap<String, Value>,
    pub globals: HashMap<String, Value>,
}

impl DebugReport {
    pub fn new(
        error: &HplError,
        call_stack: Vec<String>,
        locals: HashMap<String, Value>,
        globals: HashMap<String, Value>,
    ) -> Self {
        DebugReport {
            kind: error.kind(),
            message: error.to_string(),
            position: error.position().0,
            call_stack,
            locals,
            globals,
        }
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} error: {}", self.kind, self.message)?;
        if let Some((line, column)) = self.position {
            writeln!(f, "  at {line}:{column}")?;
        }

        writeln!(f, "\ncall stack (innermost last):")?;
        if self.call_stack.is_empty() {
            writeln!(f, "  <empty>")?;
        } else {
            for frame in &self.call_stack {
                writeln!(f, "  {frame}")?;
            }
        }

        writeln!(f, "\nlocals:")?;
        if self.locals.is_empty() {
            writeln!(f, "  <empty>")?;
        } else {
            let mut names: Vec<_> = self.locals.keys().collect();
            names.sort();
            for name in names {
                writeln!(f, "  {name} = {}", self.locals[name])?;
            }
        }

        writeln!(f, "\nglobals:")?;
        if self.globals.is_empty() {
            writeln!(f, "  <empty>")?;
        } else {
            let mut names: Vec<_> = self.globals.keys().collect();
            names.sort();
            for name in names {
                writeln!(f, "  {name} = {}", self.globals[name])?;
            }
        }

        Ok(())
    }
}
