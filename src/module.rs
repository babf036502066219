// ABOUTME: Module descriptors and the four-layer resolution order for `import`

use crate::ast::FunctionDescriptor;
use crate::error::HplError;
use crate::value::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// The arity a module function declares, generated by `#[hpl_macros::module_fn]`
/// from its attribute arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => *expected == n,
            Arity::Variadic => true,
        }
    }
}

/// One callable function inside a module, with the metadata lifted from its
/// doc comment by the `#[module_fn]` attribute macro.
#[derive(Clone)]
pub struct ModuleFnEntry {
    pub name: &'static str,
    pub arity: Arity,
    pub doc: &'static str,
    pub callable: fn(&[Value]) -> Result<Value, HplError>,
}

/// A resolved module: its native functions, any constants it exports, and
/// (for a script-file module, §4.5 layer 3) the parsed top-level functions
/// of the `.hpl` file that defined it — these need the evaluator to run,
/// so they're kept as AST rather than as `ModuleFnEntry` callables.
pub struct ModuleDescriptor {
    pub name: String,
    pub functions: HashMap<String, ModuleFnEntry>,
    pub constants: HashMap<String, Value>,
    pub script_functions: HashMap<String, Rc<FunctionDescriptor>>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleDescriptor {
            name: name.into(),
            functions: HashMap::new(),
            constants: HashMap::new(),
            script_functions: HashMap::new(),
        }
    }

    pub fn with_functions(mut self, entries: impl IntoIterator<Item = ModuleFnEntry>) -> Self {
        for entry in entries {
            self.functions.insert(entry.name.to_string(), entry);
        }
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    pub fn call(&self, function: &str, args: &[Value]) -> Result<Value, HplError> {
        let entry = self.functions.get(function).ok_or_else(|| {
            HplError::name(format!("{}.{}", self.name, function), crate::error::Position::unknown())
        })?;
        if !entry.arity.accepts(args.len()) {
            return Err(HplError::value(
                format!("{}.{}", self.name, function),
                format!("wrong number of arguments: got {}", args.len()),
                crate::error::Position::unknown(),
            ));
        }
        (entry.callable)(args)
    }
}

/// A built-in stdlib module, registered at program start via
/// `inventory::submit!` by the crate that implements it. This is the
/// distributed-registry analogue of a host-ecosystem installed package: any
/// crate that links against `hpl` and submits one of these extends the
/// standard library without the core needing to know about it ahead of time.
pub struct StdlibModule {
    pub name: &'static str,
    pub build: fn() -> ModuleDescriptor,
}

inventory::collect!(StdlibModule);

/// A host application's hook for resolving HPL's fourth import layer:
/// modules implemented directly in the host language rather than as script
/// files. The core has no safe dynamic-loading story, so this is an
/// explicit trait object the embedding application supplies rather than a
/// `dlopen`-style loader.
pub trait HostModuleLoader {
    fn load(&self, name: &str) -> Option<ModuleDescriptor>;
}

/// Where a resolved module's definition came from, recorded for the debug
/// report and for `tracing` diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSource {
    Stdlib,
    HostEcosystem,
    ScriptFile,
    HostFile,
}

/// Resolves `import` names through the four-layer order spec.md §4.5
/// describes: built-in stdlib, then host-ecosystem packages (both are
/// `inventory`-submitted `StdlibModule`s, distinguished only by which crate
/// submitted them), then script-file modules (`M.hpl` found on the module
/// search path), then host-language file modules (delegated to a supplied
/// `HostModuleLoader`).
pub struct ModuleResolver<'a> {
    pub search_path: Vec<PathBuf>,
    pub host_loader: Option<&'a dyn HostModuleLoader>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        ModuleResolver {
            search_path,
            host_loader: None,
        }
    }

    pub fn with_host_loader(mut self, loader: &'a dyn HostModuleLoader) -> Self {
        self.host_loader = Some(loader);
        self
    }

    /// Resolve `name`, trying each layer in order and logging which one
    /// satisfied the import. Script-file modules are returned as a resolved
    /// path for the caller to parse and evaluate, since doing so requires
    /// the full evaluator the module system itself doesn't depend on.
    pub fn resolve(&self, name: &str) -> Result<ResolvedModule, HplError> {
        for entry in inventory::iter::<StdlibModule> {
            if entry.name == name {
                tracing::debug!(module = name, layer = "stdlib", "import resolved");
                return Ok(ResolvedModule::Descriptor((entry.build)(), ModuleSource::Stdlib));
            }
        }

        if let Some(path) = self.find_script_file(name) {
            tracing::debug!(module = name, layer = "script_file", path = %path.display(), "import resolved");
            return Ok(ResolvedModule::ScriptFile(path));
        }

        if let Some(loader) = self.host_loader {
            if let Some(descriptor) = loader.load(name) {
                tracing::debug!(module = name, layer = "host_file", "import resolved");
                return Ok(ResolvedModule::Descriptor(descriptor, ModuleSource::HostFile));
            }
        }

        Err(HplError::name(name.to_string(), crate::error::Position::unknown()))
    }

    fn find_script_file(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{name}.hpl");
        self.search_path.iter().find_map(|dir| {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                Some(candidate)
            } else {
                None
            }
        })
    }
}

pub enum ResolvedModule {
    Descriptor(ModuleDescriptor, ModuleSource),
    ScriptFile(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_args: &[Value]) -> Result<Value, HplError> {
        Ok(Value::Null)
    }

    #[test]
    fn unknown_function_is_a_name_error() {
        let module = ModuleDescriptor::new("math");
        let err = module.call("sqrt", &[]).unwrap_err();
        assert!(matches!(err, HplError::Name { .. }));
    }

    #[test]
    fn arity_mismatch_is_a_value_error() {
        let module = ModuleDescriptor::new("math").with_functions([ModuleFnEntry {
            name: "abs",
            arity: Arity::Exact(1),
            doc: "absolute value",
            callable: noop,
        }]);
        let err = module.call("abs", &[]).unwrap_err();
        assert!(matches!(err, HplError::Value { .. }));
    }

    #[test]
    fn variadic_accepts_any_count() {
        assert!(Arity::Variadic.accepts(0));
        assert!(Arity::Variadic.accepts(5));
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(1));
    }

    #[test]
    fn resolver_falls_through_to_host_loader() {
        struct FakeLoader;
        impl HostModuleLoader for FakeLoader {
            fn load(&self, name: &str) -> Option<ModuleDescriptor> {
                if name == "custom" {
                    Some(ModuleDescriptor::new("custom"))
                } else {
                    None
                }
            }
        }
        let loader = FakeLoader;
        let resolver = ModuleResolver::new(vec![]).with_host_loader(&loader);
        match resolver.resolve("custom").unwrap() {
            ResolvedModule::Descriptor(desc, ModuleSource::HostFile) => {
                assert_eq!(desc.name, "custom");
            }
            _ => panic!("expected host file resolution"),
        }
    }

    #[test]
    fn resolver_reports_name_error_when_nothing_matches() {
        let resolver = ModuleResolver::new(vec![]);
        let err = resolver.resolve("nonexistent").unwrap_err();
        assert!(matches!(err, HplError::Name { .. }));
    }
}
