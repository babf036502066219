// ABOUTME: Scope module: the exactly-two-level local/global binding model

use crate::error::{HplError, Position};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// HPL's scope model is deliberately flat: a call frame's own locals, and
/// one shared table of globals behind every frame. There is no arbitrary
/// lexical parent chain — a function body never closes over an enclosing
/// function's locals, only over the globals every frame shares.
#[derive(Debug)]
pub struct Scope {
    locals: RefCell<HashMap<String, Value>>,
    globals: Rc<RefCell<HashMap<String, Value>>>,
}

impl Scope {
    /// A fresh global scope: its own locals table doubles as the globals
    /// table until the first call frame is pushed.
    pub fn global() -> Self {
        let globals = Rc::new(RefCell::new(HashMap::new()));
        Scope {
            locals: RefCell::new(HashMap::new()),
            globals,
        }
    }

    /// A new call frame sharing `self`'s globals handle but starting with
    /// empty locals.
    pub fn new_frame(&self) -> Scope {
        Scope {
            locals: RefCell::new(HashMap::new()),
            globals: self.globals.clone(),
        }
    }

    pub fn define_local(&self, name: impl Into<String>, value: Value) {
        self.locals.borrow_mut().insert(name.into(), value);
    }

    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.globals.borrow_mut().insert(name.into(), value);
    }

    /// Local lookup first, then global — the only two levels HPL has.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.locals.borrow().get(name) {
            tracing::trace!(name, scope = "local", "variable resolved");
            return Some(value.clone());
        }
        let found = self.globals.borrow().get(name).cloned();
        tracing::trace!(name, scope = "global", found = found.is_some(), "variable resolved");
        found
    }

    /// Assigns to an existing binding, preferring the level where the name
    /// is already bound; a name bound nowhere yet is created as a local
    /// (invariant 4) — globals are seeded only by declared objects and the
    /// module registry, never conjured by a bare assignment, so a method's
    /// fresh variable never leaks into the caller's locals (invariant 3).
    pub fn assign(&self, name: &str, value: Value) {
        if self.locals.borrow().contains_key(name) {
            self.locals.borrow_mut().insert(name.to_string(), value);
            return;
        }
        if self.globals.borrow().contains_key(name) {
            self.globals.borrow_mut().insert(name.to_string(), value);
            return;
        }
        self.locals.borrow_mut().insert(name.to_string(), value);
    }

    pub fn require(&self, name: &str) -> Result<Value, HplError> {
        self.get(name)
            .ok_or_else(|| HplError::name(name.to_string(), Position::unknown()))
    }

    /// A clone of this frame's locals, for the debug report (§7) taken at
    /// the point a call fails.
    pub fn locals_snapshot(&self) -> HashMap<String, Value> {
        self.locals.borrow().clone()
    }

    /// A clone of the shared globals table, likewise for the debug report.
    pub fn globals_snapshot(&self) -> HashMap<String, Value> {
        self.globals.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_shadows_global() {
        let global = Scope::global();
        global.define_global("x", Value::Int(1));

        let frame = global.new_frame();
        frame.define_local("x", Value::Int(2));

        match frame.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, 2),
            _ => panic!("expected local shadow"),
        }
    }

    #[test]
    fn frame_sees_globals_defined_before_and_after_it_is_created() {
        let global = Scope::global();
        global.define_global("a", Value::Int(1));
        let frame = global.new_frame();
        global.define_global("b", Value::Int(2));

        assert!(matches!(frame.get("a"), Some(Value::Int(1))));
        assert!(matches!(frame.get("b"), Some(Value::Int(2))));
    }

    #[test]
    fn frame_does_not_see_another_frames_locals() {
        let global = Scope::global();
        let frame_a = global.new_frame();
        frame_a.define_local("x", Value::Int(1));
        let frame_b = global.new_frame();

        assert!(frame_b.get("x").is_none());
    }

    #[test]
    fn undefined_name_is_a_name_error() {
        let global = Scope::global();
        let err = global.require("missing").unwrap_err();
        assert!(matches!(err, HplError::Name { .. }));
    }

    #[test]
    fn assign_to_undeclared_name_creates_a_local_not_a_global() {
        let global = Scope::global();
        let frame = global.new_frame();
        frame.assign("y", Value::Int(5));

        let other_frame = global.new_frame();
        assert!(other_frame.get("y").is_none());
        assert!(matches!(frame.get("y"), Some(Value::Int(5))));
    }

    #[test]
    fn assign_to_name_already_global_updates_global_in_place() {
        let global = Scope::global();
        global.define_global("g", Value::Int(1));
        let frame = global.new_frame();
        frame.assign("g", Value::Int(2));

        let other_frame = global.new_frame();
        assert!(matches!(other_frame.get("g"), Some(Value::Int(2))));
    }
}
