// ABOUTME: Error types for lexing, parsing, and evaluation failures in HPL

use std::fmt;
use thiserror::Error;

/// A source position, when one is available. Lexical and syntactic errors
/// always carry one; evaluation errors carry one when the failing AST node
/// kept its span. Displays as `" at L:C"`, or nothing when unknown, so it
/// can be spliced directly onto the end of an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(pub Option<(usize, usize)>);

impl Position {
    pub const fn unknown() -> Self {
        Position(None)
    }
}

impl From<(usize, usize)> for Position {
    fn from(pos: (usize, usize)) -> Self {
        Position(Some(pos))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((line, col)) => write!(f, " at {line}:{col}"),
            None => Ok(()),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum HplError {
    /// A character sequence could not be tokenized, or indentation was
    /// inconsistent with an open block.
    #[error("lexical error: {message}{position}")]
    Lexical { message: String, position: Position },

    /// The token stream did not match the grammar.
    #[error("expected {expected}, got {actual} at {line}:{column}")]
    Syntactic {
        expected: String,
        actual: String,
        line: usize,
        column: usize,
    },

    /// A name (variable, function, class, module, or attribute) was not
    /// found in the scope it was looked up in.
    #[error("undefined name '{name}'{position}")]
    Name { name: String, position: Position },

    /// An operator or built-in received a value of the wrong runtime type.
    #[error("{context}: expected {expected}, got {actual}{position}")]
    Type {
        context: String,
        expected: String,
        actual: String,
        position: Position,
    },

    /// An operation received a value of the right type but an invalid
    /// value (wrong arity, out-of-range index, malformed argument).
    #[error("{context}: {message}{position}")]
    Value {
        context: String,
        message: String,
        position: Position,
    },

    /// A user script raised this error explicitly (via a `throw`-style
    /// statement); it is the only kind a `try`/`catch` block may observe.
    #[error("{message}")]
    User { message: String },
}

impl HplError {
    pub fn lexical(message: impl Into<String>, line: usize, column: usize) -> Self {
        HplError::Lexical {
            message: message.into(),
            position: Position(Some((line, column))),
        }
    }

    pub fn syntactic(
        expected: impl Into<String>,
        actual: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        HplError::Syntactic {
            expected: expected.into(),
            actual: actual.into(),
            line,
            column,
        }
    }

    pub fn name(name: impl Into<String>, position: Position) -> Self {
        HplError::Name {
            name: name.into(),
            position,
        }
    }

    pub fn type_error(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        position: Position,
    ) -> Self {
        HplError::Type {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
            position,
        }
    }

    pub fn value(
        context: impl Into<String>,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        HplError::Value {
            context: context.into(),
            message: message.into(),
            position,
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        HplError::User {
            message: message.into(),
        }
    }

    /// The taxonomy kind this error belongs to, for debug reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            HplError::Lexical { .. } => "Lexical",
            HplError::Syntactic { .. } => "Syntactic",
            HplError::Name { .. } => "Name",
            HplError::Type { .. } => "Type",
            HplError::Value { .. } => "Value",
            HplError::User { .. } => "User",
        }
    }

    /// The bare message text, without the kind-specific context prefix or
    /// position suffix `Display` adds — what a `try`/`catch` binds to its
    /// catch variable (§7: "bind the message to the catch variable as a
    /// string"), not the fully-decorated error report.
    pub fn message(&self) -> String {
        match self {
            HplError::Lexical { message, .. } => message.clone(),
            HplError::Syntactic { expected, actual, .. } => format!("expected {expected}, got {actual}"),
            HplError::Name { name, .. } => format!("undefined name '{name}'"),
            HplError::Type { expected, actual, .. } => format!("expected {expected}, got {actual}"),
            HplError::Value { message, .. } => message.clone(),
            HplError::User { message } => message.clone(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            HplError::Lexical { position, .. } => *position,
            HplError::Syntactic { line, column, .. } => Position(Some((*line, *column))),
            HplError::Name { position, .. } => *position,
            HplError::Type { position, .. } => *position,
            HplError::Value { position, .. } => *position,
            HplError::User { .. } => Position::unknown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_error_includes_position() {
        let err = HplError::type_error("add", "number", "string", Position(Some((3, 7))));
        assert_eq!(err.to_string(), "add: expected number, got string at 3:7");
    }

    #[test]
    fn user_error_message_is_bare() {
        let err = HplError::user("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn syntactic_error_format_matches_parser_contract() {
        let err = HplError::syntactic("')'", "';'", 4, 12);
        assert_eq!(err.to_string(), "expected ')', got ';' at 4:12");
    }

    #[test]
    fn message_strips_context_prefix_and_position() {
        let err = HplError::value("/", "Division by zero", Position(Some((1, 20))));
        assert_eq!(err.to_string(), "/: Division by zero at 1:20");
        assert_eq!(err.message(), "Division by zero");
    }

    #[test]
    fn unknown_position_displays_as_nothing() {
        assert_eq!(Position::unknown().to_string(), "");
        assert_eq!(Position(Some((1, 1))).to_string(), " at 1:1");
    }
}
