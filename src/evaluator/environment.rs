//! Lexical environments: a parent-linked chain of local stores.
//!
//! Cloning an [`Environment`] is cheap (it's a reference-counted handle), so
//! closures can hold one without copying the bindings themselves. Lookup
//! walks the parent chain; declaration always writes to the innermost scope;
//! assignment walks the chain to find the scope that already owns the name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

struct Binding {
    value: Value,
    mutable: bool,
}

struct EnvInner {
    store: HashMap<String, Binding>,
    parent: Option<Environment>,
}

#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvInner>>);

impl Environment {
    pub fn root() -> Self {
        Environment(Rc::new(RefCell::new(EnvInner {
            store: HashMap::new(),
            parent: None,
        })))
    }

    pub fn child(parent: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(EnvInner {
            store: HashMap::new(),
            parent: Some(parent.clone()),
        })))
    }

    /// `x := e` / `mut x := e`: always writes into the local scope,
    /// overwriting any existing local binding of the same name.
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .store
            .insert(name.into(), Binding { value, mutable });
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let inner = self.0.borrow();
        if let Some(binding) = inner.store.get(name) {
            return Some(binding.value.clone());
        }
        inner.parent.as_ref().and_then(|p| p.get(name))
    }

    /// `x = e`: walk the chain to the defining scope and overwrite in place.
    /// Returns the stable error-message taxonomy strings from the spec.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), String> {
        let mut inner = self.0.borrow_mut();
        if let Some(binding) = inner.store.get_mut(name) {
            if !binding.mutable {
                return Err(format!("cannot assign to immutable variable: {name}"));
            }
            binding.value = value;
            return Ok(());
        }
        let parent = inner.parent.clone();
        drop(inner);
        match parent {
            Some(p) => p.assign(name, value),
            None => Err(format!("identifier not found: {name}")),
        }
    }

    pub fn is_declared_locally(&self, name: &str) -> bool {
        self.0.borrow().store.contains_key(name)
    }
}
