// ABOUTME: Class and object descriptors and single-inheritance method lookup

use crate::ast::FunctionDescriptor;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A declared class: its own methods plus, optionally, the name of a single
/// parent class to fall back to when a method isn't found locally.
#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub methods: HashMap<String, Rc<FunctionDescriptor>>,
}

impl ClassDescriptor {
    pub fn new(name: String, parent: Option<String>) -> Self {
        ClassDescriptor {
            name,
            parent,
            methods: HashMap::new(),
        }
    }
}

/// An instance of a class: its own attribute bag plus a pointer back to the
/// class it was constructed from, used to resolve method calls.
#[derive(Debug)]
pub struct ObjectDescriptor {
    pub class: String,
    pub attributes: RefCell<HashMap<String, Value>>,
}

impl ObjectDescriptor {
    pub fn new(class: String) -> Self {
        ObjectDescriptor {
            class,
            attributes: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<Value> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn set_attribute(&self, name: String, value: Value) {
        self.attributes.borrow_mut().insert(name, value);
    }
}

/// The full set of declared classes, keyed by name, used to walk the
/// single-inheritance chain during method dispatch.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Rc<ClassDescriptor>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        ClassRegistry::default()
    }

    pub fn define(&mut self, class: ClassDescriptor) {
        self.classes.insert(class.name.clone(), Rc::new(class));
    }

    /// Defines a class already wrapped in `Rc`, used when merging an
    /// included document's already-built registry (§4.2) without cloning
    /// every method body.
    pub fn define_rc(&mut self, class: Rc<ClassDescriptor>) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Rc<ClassDescriptor>)> {
        self.classes.iter()
    }

    pub fn get(&self, name: &str) -> Option<Rc<ClassDescriptor>> {
        self.classes.get(name).cloned()
    }

    /// Walk from `class_name` up through `parent` links, returning the first
    /// method named `method` found, along with the class that defines it.
    /// A class whose own `methods` map lacks the name defers to its parent;
    /// a class with no parent and no match returns `None`.
    pub fn resolve_method(
        &self,
        class_name: &str,
        method: &str,
    ) -> Option<(Rc<ClassDescriptor>, Rc<FunctionDescriptor>)> {
        let mut current = self.get(class_name)?;
        loop {
            if let Some(func) = current.methods.get(method) {
                return Some((current.clone(), func.clone()));
            }
            match &current.parent {
                Some(parent_name) => current = self.get(parent_name)?,
                None => return None,
            }
        }
    }

    /// Whether `class_name` is, or inherits from, `ancestor`.
    pub fn is_subclass(&self, class_name: &str, ancestor: &str) -> bool {
        let mut current = class_name.to_string();
        loop {
            if current == ancestor {
                return true;
            }
            match self.get(&current).and_then(|c| c.parent.clone()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Block;

    fn method(name: &str) -> Rc<FunctionDescriptor> {
        Rc::new(FunctionDescriptor {
            name: name.to_string(),
            params: vec![],
            body: Rc::new(Block::new()),
        })
    }

    #[test]
    fn resolves_own_method_before_parent() {
        let mut registry = ClassRegistry::new();
        let mut animal = ClassDescriptor::new("Animal".to_string(), None);
        animal.methods.insert("speak".to_string(), method("speak"));
        registry.define(animal);

        let mut dog = ClassDescriptor::new("Dog".to_string(), Some("Animal".to_string()));
        dog.methods.insert("speak".to_string(), method("speak"));
        registry.define(dog);

        let (owner, _) = registry.resolve_method("Dog", "speak").unwrap();
        assert_eq!(owner.name, "Dog");
    }

    #[test]
    fn falls_back_to_parent_method() {
        let mut registry = ClassRegistry::new();
        let mut animal = ClassDescriptor::new("Animal".to_string(), None);
        animal.methods.insert("speak".to_string(), method("speak"));
        registry.define(animal);
        registry.define(ClassDescriptor::new(
            "Dog".to_string(),
            Some("Animal".to_string()),
        ));

        let (owner, _) = registry.resolve_method("Dog", "speak").unwrap();
        assert_eq!(owner.name, "Animal");
    }

    #[test]
    fn missing_method_across_whole_chain_is_none() {
        let mut registry = ClassRegistry::new();
        registry.define(ClassDescriptor::new("Animal".to_string(), None));
        registry.define(ClassDescriptor::new(
            "Dog".to_string(),
            Some("Animal".to_string()),
        ));
        assert!(registry.resolve_method("Dog", "speak").is_none());
    }

    #[test]
    fn is_subclass_walks_full_chain() {
        let mut registry = ClassRegistry::new();
        registry.define(ClassDescriptor::new("Animal".to_string(), None));
        registry.define(ClassDescriptor::new(
            "Dog".to_string(),
            Some("Animal".to_string()),
        ));
        registry.define(ClassDescriptor::new(
            "Puppy".to_string(),
            Some("Dog".to_string()),
        ));

        assert!(registry.is_subclass("Puppy", "Animal"));
        assert!(!registry.is_subclass("Animal", "Puppy"));
    }
}
