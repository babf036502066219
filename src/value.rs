// ABOUTME: Runtime value types for HPL: the tagged union every expression evaluates to

use crate::class::ObjectDescriptor;
use crate::module::ModuleDescriptor;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The dynamically-typed runtime value every HPL expression evaluates to.
///
/// `Int` and `Float` are kept distinct (rather than one `Number(f64)`, as a
/// simpler interpreter might do) so that an integer literal stays an integer
/// through arithmetic unless it is mixed with a float operand. `Array` and
/// `Object` hold their payload behind `Rc<RefCell<_>>` since HPL arrays and
/// objects are reference types: two variables holding "the same" array or
/// object must observe each other's mutations.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<ObjectDescriptor>),
    Module(Rc<ModuleDescriptor>),
}

impl Value {
    pub fn new_array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// The name used in type-mismatch error messages and by the `type`
    /// built-in.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Module(_) => "module",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Str(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(obj) => write!(f, "<{} object>", obj.class),
            Value::Module(module) => write!(f, "<module {}>", module.name),
        }
    }
}
