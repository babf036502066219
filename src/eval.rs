// ABOUTME: Tree-walking evaluator: scopes, this/call-stack discipline, method dispatch, control flow

use crate::ast::{BinaryOp, Block, Expr, FunctionDescriptor, Stmt};
use crate::builtins;
use crate::class::{ClassRegistry, ObjectDescriptor};
use crate::document::{CallArg, CallDirective, ParsedEnvironment};
use crate::env::Scope;
use crate::error::{HplError, Position};
use crate::module::{HostModuleLoader, ModuleDescriptor, ModuleResolver, ResolvedModule};
use crate::value::Value;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// The non-error control-flow signal an executed statement can produce.
/// `return`/`break`/`continue` need to unwind through nested blocks without
/// looking like a failure, so they travel as this rather than as an
/// `HplError` — a `try`/`catch` around them therefore can never observe or
/// intercept them (§7's propagation policy), since it only ever sees `Err`.
enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// One call-stack entry, kept only for the debug report (§7): `"<object>.
/// <method>()"` for a method call, `"<name>()"` for a top-level or module
/// function call.
struct Frame {
    label: String,
}

/// Pops the innermost call-stack frame on drop. Every exit out of a call —
/// normal completion, an early `?`-propagated error, a `Completion::Return`
/// bubbling out — runs through this, so the stack is exactly as it was
/// before the call on every path (invariant 3).
struct CallGuard<'a> {
    stack: &'a RefCell<Vec<Frame>>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Pops the innermost `this` binding on drop, the same RAII discipline as
/// `CallGuard` applied to invariant 2: a method call's `this` is restored
/// for its caller regardless of how the call ends.
struct ThisGuard<'a> {
    stack: &'a RefCell<Vec<Value>>,
}

impl Drop for ThisGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Walks the AST produced by `parser`/`document` against a fixed class
/// registry and top-level function set, maintaining the two-level scope
/// model, the call stack, and the `this` stack described in §3 and §4.4.
pub struct Evaluator<'a> {
    classes: ClassRegistry,
    functions: HashMap<String, Rc<FunctionDescriptor>>,
    call: Option<CallDirective>,
    global: Scope,
    call_stack: RefCell<Vec<Frame>>,
    this_stack: RefCell<Vec<Value>>,
    resolver: ModuleResolver<'a>,
    search_path: Vec<PathBuf>,
    /// Call stack plus locals/globals captured at the innermost frame the
    /// first time an error escapes uncaught, for the debug report (§7).
    /// Captured here rather than read back from `call_stack` after `run`
    /// returns, since every frame's `CallGuard` pops itself on the way out —
    /// by the time an error reaches the caller the stack is already empty.
    /// `None` once consumed by `take_failure_snapshot`, or if nothing has
    /// failed yet.
    failure_snapshot: RefCell<Option<(Vec<String>, HashMap<String, Value>, HashMap<String, Value>)>>,
}

impl<'a> Evaluator<'a> {
    /// Builds an evaluator from a fully merged document environment:
    /// constructs the declared `objects` (invoking `init` where a class
    /// defines one), then processes the document's top-level `imports` into
    /// global bindings, before any statement has executed.
    pub fn new(env: ParsedEnvironment, search_path: Vec<PathBuf>) -> Result<Self, HplError> {
        Self::with_host_loader(env, search_path, None)
    }

    pub fn with_host_loader(
        env: ParsedEnvironment,
        search_path: Vec<PathBuf>,
        host_loader: Option<&'a dyn HostModuleLoader>,
    ) -> Result<Self, HplError> {
        let mut resolver = ModuleResolver::new(search_path.clone());
        if let Some(loader) = host_loader {
            resolver = resolver.with_host_loader(loader);
        }

        let evaluator = Evaluator {
            classes: env.classes,
            functions: env.functions,
            call: env.call,
            global: Scope::global(),
            call_stack: RefCell::new(Vec::new()),
            this_stack: RefCell::new(Vec::new()),
            resolver,
            search_path,
            failure_snapshot: RefCell::new(None),
        };

        for (name, class_name) in &env.objects {
            let obj = evaluator.construct_object(class_name)?;
            evaluator.global.define_global(name.clone(), Value::Object(obj));
        }

        for import in &env.imports {
            evaluator.import_module(&import.module, import.alias.as_deref())?;
        }

        Ok(evaluator)
    }

    /// Dispatches per §4.4's entry rule: run the `call` directive's target if
    /// one was declared, else fall back to a zero-argument `main`, else do
    /// nothing.
    pub fn run(&self) -> Result<(), HplError> {
        if let Some(directive) = &self.call {
            let args = directive
                .args
                .iter()
                .map(|a| self.eval_call_arg(a))
                .collect::<Result<Vec<_>, _>>()?;
            self.call_named(&directive.name, args)?;
            return Ok(());
        }
        if self.functions.contains_key("main") {
            self.call_named("main", Vec::new())?;
        }
        Ok(())
    }

    /// Looks up and runs a top-level function by name with explicit
    /// arguments, returning its result directly. `run` uses this for both
    /// the `call` directive and the `main` fallback; it also doubles as the
    /// embedding entry point for a host that wants to invoke a specific
    /// function rather than the document's declared entry point, and as how
    /// tests observe a computed value without routing it through a global
    /// (HPL has no syntax for defining a fresh global scalar from code — see
    /// `Scope::assign`).
    pub fn call_named(&self, name: &str, args: Vec<Value>) -> Result<Value, HplError> {
        let func = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| HplError::name(name.to_string(), Position::unknown()))?;
        self.call_function(&func, args, format!("{name}()"))
    }

    /// Exposed for the debug binary: the current snapshot a failure point
    /// would report (§7). Useful only once `run` has returned an error to
    /// the caller, since the call stack unwinds back to empty on any path.
    pub fn call_stack_labels(&self) -> Vec<String> {
        self.call_stack.borrow().iter().map(|f| f.label.clone()).collect()
    }

    /// Takes the call stack and locals/globals snapshot recorded at the
    /// innermost frame of the most recent uncaught error, if any, consuming
    /// it. A debug wrapper calls this right after `run()` returns `Err`.
    pub fn take_failure_snapshot(
        &self,
    ) -> Option<(Vec<String>, HashMap<String, Value>, HashMap<String, Value>)> {
        self.failure_snapshot.borrow_mut().take()
    }

    fn record_failure_snapshot(&self, frame: &Scope) {
        let mut slot = self.failure_snapshot.borrow_mut();
        if slot.is_none() {
            *slot = Some((
                self.call_stack_labels(),
                frame.locals_snapshot(),
                self.global.globals_snapshot(),
            ));
        }
    }

    fn eval_call_arg(&self, arg: &CallArg) -> Result<Value, HplError> {
        match arg {
            CallArg::Int(n) => Ok(Value::Int(*n)),
            CallArg::Float(n) => Ok(Value::Float(*n)),
            CallArg::Str(s) => Ok(Value::Str(s.clone())),
            CallArg::Name(name) => self.global.require(name),
        }
    }

    fn import_module(&self, name: &str, alias: Option<&str>) -> Result<(), HplError> {
        let bound_name = alias.unwrap_or(name).to_string();
        match self.resolver.resolve(name)? {
            ResolvedModule::Descriptor(descriptor, _source) => {
                self.global.define_global(bound_name, Value::Module(Rc::new(descriptor)));
            }
            ResolvedModule::ScriptFile(path) => {
                let loaded = crate::document::load_document(&path, &self.search_path)?;
                let mut descriptor = ModuleDescriptor::new(name.to_string());
                descriptor.script_functions = loaded.functions;
                self.global.define_global(bound_name, Value::Module(Rc::new(descriptor)));
            }
        }
        Ok(())
    }

    /// Constructs `objects`' declared instances: an empty attribute map
    /// bound to `class_name`, with `init` invoked (zero arguments, per
    /// §4.4's "Object construction") when the class defines one.
    fn construct_object(&self, class_name: &str) -> Result<Rc<ObjectDescriptor>, HplError> {
        if !self.classes.contains(class_name) {
            return Err(HplError::name(class_name.to_string(), Position::unknown()));
        }
        let obj = Rc::new(ObjectDescriptor::new(class_name.to_string()));
        if let Some((owner, init_fn)) = self.classes.resolve_method(class_name, "init") {
            self.invoke_method(obj.clone(), &owner.name, &init_fn, Vec::new())?;
        }
        Ok(obj)
    }

    // ---- calls ----

    /// Runs a top-level or module-script function in a brand-new local
    /// frame over the shared globals — HPL's scope chain is exactly two
    /// levels, so a call never inherits its caller's locals (invariant 4).
    fn call_function(
        &self,
        func: &Rc<FunctionDescriptor>,
        args: Vec<Value>,
        label: String,
    ) -> Result<Value, HplError> {
        self.call_stack.borrow_mut().push(Frame { label });
        let _guard = CallGuard { stack: &self.call_stack };

        let frame = self.global.new_frame();
        for (i, param) in func.params.iter().enumerate() {
            frame.define_local(param.clone(), args.get(i).cloned().unwrap_or(Value::Null));
        }
        match self.exec_block(&func.body, &frame) {
            Ok(Completion::Return(v)) => Ok(v),
            Ok(_) => Ok(Value::Null),
            Err(e) => {
                self.record_failure_snapshot(&frame);
                Err(e)
            }
        }
    }

    /// Method dispatch per §4.4: `this` is bound to `receiver` and a call
    /// frame labelled `"<class>.<method>()"` is pushed for the duration of
    /// the call, both restored on every exit path via RAII guards.
    fn invoke_method(
        &self,
        receiver: Rc<ObjectDescriptor>,
        _owner_class: &str,
        func: &Rc<FunctionDescriptor>,
        args: Vec<Value>,
    ) -> Result<Value, HplError> {
        let label = format!("{}.{}()", receiver.class, func.name);
        let _span = tracing::info_span!("method_call", class = %receiver.class, method = %func.name).entered();
        self.call_stack.borrow_mut().push(Frame { label });
        let _call_guard = CallGuard { stack: &self.call_stack };

        self.this_stack.borrow_mut().push(Value::Object(receiver));
        let _this_guard = ThisGuard { stack: &self.this_stack };

        let frame = self.global.new_frame();
        for (i, param) in func.params.iter().enumerate() {
            frame.define_local(param.clone(), args.get(i).cloned().unwrap_or(Value::Null));
        }
        match self.exec_block(&func.body, &frame) {
            Ok(Completion::Return(v)) => Ok(v),
            Ok(_) => Ok(Value::Null),
            Err(e) => {
                self.record_failure_snapshot(&frame);
                Err(e)
            }
        }
    }

    fn call_method(
        &self,
        obj: Rc<ObjectDescriptor>,
        method: &str,
        args: &[Expr],
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        let (owner, func) = self
            .classes
            .resolve_method(&obj.class, method)
            .ok_or_else(|| HplError::name(format!("{}.{method}", obj.class), span.pos()))?;
        let values = args
            .iter()
            .map(|a| self.eval_expr(a, scope))
            .collect::<Result<Vec<_>, _>>()?;
        self.invoke_method(obj, &owner.name, &func, values)
    }

    // ---- statements ----

    fn exec_block(&self, block: &Block, scope: &Scope) -> Result<Completion, HplError> {
        for stmt in block {
            match self.exec_stmt(stmt, scope)? {
                Completion::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_stmt(&self, stmt: &Stmt, scope: &Scope) -> Result<Completion, HplError> {
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e, scope)?;
                Ok(Completion::Normal)
            }
            Stmt::Assign { target, value, .. } => {
                let v = self.eval_expr(value, scope)?;
                self.assign_to(target, v, scope)?;
                Ok(Completion::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.require_bool("if", condition, scope, condition.span())? {
                    self.exec_block(then_branch, scope)
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, scope)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.require_bool("while", condition, scope, condition.span())? {
                    match self.exec_block(body, scope)? {
                        Completion::Break => break,
                        Completion::Continue | Completion::Normal => {}
                        ret @ Completion::Return(_) => return Ok(ret),
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.exec_stmt(init, scope)?;
                }
                loop {
                    if !self.require_bool("for", condition, scope, condition.span())? {
                        break;
                    }
                    match self.exec_block(body, scope)? {
                        Completion::Break => break,
                        Completion::Continue | Completion::Normal => {}
                        ret @ Completion::Return(_) => return Ok(ret),
                    }
                    if let Some(step) = step {
                        self.exec_stmt(step, scope)?;
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::Return(expr, _) => {
                let v = match expr {
                    Some(e) => self.eval_expr(e, scope)?,
                    None => Value::Null,
                };
                Ok(Completion::Return(v))
            }
            Stmt::Break(_) => Ok(Completion::Break),
            Stmt::Continue(_) => Ok(Completion::Continue),
            Stmt::Echo(e, _) => {
                let v = self.eval_expr(e, scope)?;
                println!("{v}");
                Ok(Completion::Normal)
            }
            Stmt::Try {
                body,
                catch_name,
                catch_body,
                ..
            } => match self.exec_block(body, scope) {
                Ok(completion) => Ok(completion),
                Err(err) => {
                    scope.define_local(catch_name.clone(), Value::Str(err.message()));
                    self.exec_block(catch_body, scope)
                }
            },
            Stmt::Import { module, alias, .. } => {
                self.import_module(module, alias.as_deref())?;
                Ok(Completion::Normal)
            }
        }
    }

    fn assign_to(&self, target: &Expr, value: Value, scope: &Scope) -> Result<(), HplError> {
        match target {
            Expr::Identifier(name, _) => {
                scope.assign(name, value);
                Ok(())
            }
            Expr::Attribute { object, name, span } => {
                let receiver = self.eval_expr(object, scope)?;
                match receiver {
                    Value::Object(obj) => {
                        obj.set_attribute(name.clone(), value);
                        Ok(())
                    }
                    other => Err(HplError::type_error(
                        format!(".{name} ="),
                        "object",
                        other.type_name(),
                        span.pos(),
                    )),
                }
            }
            Expr::Index { object, index, span } => {
                let receiver = self.eval_expr(object, scope)?;
                let idx_value = self.eval_expr(index, scope)?;
                let arr = match receiver {
                    Value::Array(a) => a,
                    other => {
                        return Err(HplError::type_error("[]=", "array", other.type_name(), span.pos()))
                    }
                };
                let idx = match idx_value {
                    Value::Int(n) => n,
                    other => {
                        return Err(HplError::type_error("[]=", "int index", other.type_name(), span.pos()))
                    }
                };
                let mut items = arr.borrow_mut();
                if idx < 0 || idx as usize >= items.len() {
                    return Err(HplError::value(
                        "[]=",
                        format!("index {idx} out of bounds for array of length {}", items.len()),
                        span.pos(),
                    ));
                }
                items[idx as usize] = value;
                Ok(())
            }
            _ => unreachable!("the parser never produces a non-assignable assignment target"),
        }
    }

    // ---- expressions ----

    fn eval_expr(&self, expr: &Expr, scope: &Scope) -> Result<Value, HplError> {
        match expr {
            Expr::IntLiteral(n, _) => Ok(Value::Int(*n)),
            Expr::FloatLiteral(n, _) => Ok(Value::Float(*n)),
            Expr::StrLiteral(s, _) => Ok(Value::Str(s.clone())),
            Expr::BoolLiteral(b, _) => Ok(Value::Bool(*b)),
            Expr::NullLiteral(_) => Ok(Value::Null),
            Expr::ArrayLiteral(items, _) => {
                let values = items
                    .iter()
                    .map(|e| self.eval_expr(e, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::new_array(values))
            }
            Expr::Identifier(name, span) => scope
                .get(name)
                .ok_or_else(|| HplError::name(name.clone(), span.pos())),
            Expr::This(span) => self
                .this_stack
                .borrow()
                .last()
                .cloned()
                .ok_or_else(|| HplError::name("this", span.pos())),
            Expr::Not(inner, span) => {
                let v = self.eval_expr(inner, scope)?;
                match v {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(HplError::type_error("!", "bool", other.type_name(), span.pos())),
                }
            }
            Expr::Binary { op, left, right, span } => self.eval_binary(op, left, right, *span, scope),
            Expr::Index { object, index, span } => self.eval_index(object, index, *span, scope),
            Expr::Attribute { object, name, span } => self.eval_attribute(object, name, *span, scope),
            Expr::Call { name, args, span } => self.eval_call(name, args, *span, scope),
            Expr::MethodCall {
                object,
                method,
                args,
                span,
            } => self.eval_method_call(object, method, args, *span, scope),
            Expr::PostfixIncr(target, span) => self.eval_postfix_incr(target, *span, scope),
        }
    }

    fn eval_binary(
        &self,
        op: &BinaryOp,
        left: &Expr,
        right: &Expr,
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        match op {
            BinaryOp::And => {
                let l = self.require_bool("&&", left, scope, span)?;
                if !l {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.require_bool("&&", right, scope, span)?))
            }
            BinaryOp::Or => {
                let l = self.require_bool("||", left, scope, span)?;
                if l {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.require_bool("||", right, scope, span)?))
            }
            BinaryOp::Add => {
                let l = self.eval_expr(left, scope)?;
                let r = self.eval_expr(right, scope)?;
                match (&l, &r) {
                    (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                    (a, b) if is_numeric(a) && is_numeric(b) => {
                        Ok(Value::Float(as_f64(a) + as_f64(b)))
                    }
                    _ => Ok(Value::Str(format!("{l}{r}"))),
                }
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.eval_arithmetic(op, left, right, span, scope)
            }
            BinaryOp::Eq => self.eval_equality(left, right, span, scope).map(Value::Bool),
            BinaryOp::NotEq => self
                .eval_equality(left, right, span, scope)
                .map(|eq| Value::Bool(!eq)),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                self.eval_comparison(op, left, right, span, scope)
            }
        }
    }

    fn require_bool(
        &self,
        op_name: &str,
        expr: &Expr,
        scope: &Scope,
        span: crate::ast::Span,
    ) -> Result<bool, HplError> {
        match self.eval_expr(expr, scope)? {
            Value::Bool(b) => Ok(b),
            other => Err(HplError::type_error(op_name, "bool", other.type_name(), span.pos())),
        }
    }

    /// `- * / %`: numeric-only, both-int stays int, any float operand
    /// promotes both to float (invariant 5), zero divisor/modulus is a
    /// dedicated value error rather than an infinity or NaN.
    fn eval_arithmetic(
        &self,
        op: &BinaryOp,
        left: &Expr,
        right: &Expr,
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        let l = self.eval_expr(left, scope)?;
        let r = self.eval_expr(right, scope)?;
        let op_name = match op {
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            _ => unreachable!(),
        };

        if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
            let (a, b) = (*a, *b);
            return match op {
                BinaryOp::Sub => Ok(Value::Int(a - b)),
                BinaryOp::Mul => Ok(Value::Int(a * b)),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(HplError::value(op_name, "Division by zero", span.pos()));
                    }
                    Ok(Value::Int(a / b))
                }
                BinaryOp::Mod => {
                    if b == 0 {
                        return Err(HplError::value(op_name, "Division by zero", span.pos()));
                    }
                    Ok(Value::Int(a % b))
                }
                _ => unreachable!(),
            };
        }

        if is_numeric(&l) && is_numeric(&r) {
            let (a, b) = (as_f64(&l), as_f64(&r));
            return match op {
                BinaryOp::Sub => Ok(Value::Float(a - b)),
                BinaryOp::Mul => Ok(Value::Float(a * b)),
                BinaryOp::Div => {
                    if b == 0.0 {
                        return Err(HplError::value(op_name, "Division by zero", span.pos()));
                    }
                    Ok(Value::Float(a / b))
                }
                BinaryOp::Mod => {
                    if b == 0.0 {
                        return Err(HplError::value(op_name, "Division by zero", span.pos()));
                    }
                    Ok(Value::Float(a % b))
                }
                _ => unreachable!(),
            };
        }

        let bad = if is_numeric(&l) { &r } else { &l };
        Err(HplError::type_error(op_name, "number", bad.type_name(), span.pos()))
    }

    /// `==`/`!=`: numeric if both numeric (mixed int/float compares as
    /// float), string if both string; any other combination is a type error
    /// rather than a silent `false`, since §4.4 scopes equality under the
    /// same "Comparisons" rule as ordering.
    fn eval_equality(
        &self,
        left: &Expr,
        right: &Expr,
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<bool, HplError> {
        let l = self.eval_expr(left, scope)?;
        let r = self.eval_expr(right, scope)?;
        match (&l, &r) {
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (a, b) if is_numeric(a) && is_numeric(b) => Ok(as_f64(a) == as_f64(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            _ => Err(HplError::type_error(
                "==",
                "two numbers or two strings",
                format!("{} and {}", l.type_name(), r.type_name()),
                span.pos(),
            )),
        }
    }

    fn eval_comparison(
        &self,
        op: &BinaryOp,
        left: &Expr,
        right: &Expr,
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        let l = self.eval_expr(left, scope)?;
        let r = self.eval_expr(right, scope)?;
        let ordering = match (&l, &r) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (a, b) if is_numeric(a) && is_numeric(b) => {
                as_f64(a).partial_cmp(&as_f64(b)).unwrap_or(Ordering::Equal)
            }
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => {
                return Err(HplError::type_error(
                    "comparison",
                    "two numbers or two strings",
                    format!("{} and {}", l.type_name(), r.type_name()),
                    span.pos(),
                ))
            }
        };
        let result = match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::LtEq => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::GtEq => ordering.is_ge(),
            _ => unreachable!(),
        };
        Ok(Value::Bool(result))
    }

    fn eval_index(
        &self,
        object: &Expr,
        index: &Expr,
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        let obj = self.eval_expr(object, scope)?;
        let idx = self.eval_expr(index, scope)?;
        let arr = match obj {
            Value::Array(a) => a,
            other => return Err(HplError::type_error("[]", "array", other.type_name(), span.pos())),
        };
        let i = match idx {
            Value::Int(n) => n,
            other => return Err(HplError::type_error("[]", "int index", other.type_name(), span.pos())),
        };
        let items = arr.borrow();
        if i < 0 || i as usize >= items.len() {
            return Err(HplError::value(
                "[]",
                format!("index {i} out of bounds for array of length {}", items.len()),
                span.pos(),
            ));
        }
        Ok(items[i as usize].clone())
    }

    /// Property access, supporting chains of arbitrary depth since each
    /// level just recurses through `eval_expr` on `object`: an object reads
    /// its attribute map; a module reads its constant registry (its
    /// functions are reached only through a trailing `(args)`, which the
    /// parser turns into a `MethodCall` instead of an `Attribute`).
    fn eval_attribute(
        &self,
        object: &Expr,
        name: &str,
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        let receiver = self.eval_expr(object, scope)?;
        match receiver {
            Value::Object(obj) => obj
                .get_attribute(name)
                .ok_or_else(|| HplError::name(format!("{}.{name}", obj.class), span.pos())),
            Value::Module(module) => module
                .constants
                .get(name)
                .cloned()
                .ok_or_else(|| HplError::name(format!("{}.{name}", module.name), span.pos())),
            other => Err(HplError::type_error(
                format!(".{name}"),
                "object or module",
                other.type_name(),
                span.pos(),
            )),
        }
    }

    fn eval_call(
        &self,
        name: &str,
        args: &[Expr],
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        if let Some(func) = self.functions.get(name).cloned() {
            let values = args
                .iter()
                .map(|a| self.eval_expr(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            return self.call_function(&func, values, format!("{name}()"));
        }
        let values = args
            .iter()
            .map(|a| self.eval_expr(a, scope))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(result) = builtins::call(name, &values, span.pos()) {
            return result;
        }
        Err(HplError::name(name.to_string(), span.pos()))
    }

    fn eval_method_call(
        &self,
        object: &Expr,
        method: &str,
        args: &[Expr],
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        let receiver = self.eval_expr(object, scope)?;
        match receiver {
            Value::Object(obj) => self.call_method(obj, method, args, span, scope),
            Value::Module(module) => {
                let values = args
                    .iter()
                    .map(|a| self.eval_expr(a, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(script_fn) = module.script_functions.get(method).cloned() {
                    self.call_function(&script_fn, values, format!("{}.{method}()", module.name))
                } else {
                    module.call(method, &values)
                }
            }
            other => Err(HplError::type_error(
                format!(".{method}()"),
                "object or module",
                other.type_name(),
                span.pos(),
            )),
        }
    }

    fn eval_postfix_incr(
        &self,
        target: &Expr,
        span: crate::ast::Span,
        scope: &Scope,
    ) -> Result<Value, HplError> {
        let old = self.eval_expr(target, scope)?;
        let new_value = match &old {
            Value::Int(n) => Value::Int(n + 1),
            Value::Float(n) => Value::Float(n + 1.0),
            other => return Err(HplError::type_error("++", "number", other.type_name(), span.pos())),
        };
        self.assign_to(target, new_value, scope)?;
        Ok(old)
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => unreachable!("as_f64 called on a non-numeric value"),
    }
}
