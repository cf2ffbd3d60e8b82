//! Class registration, spec conformance checking, and instantiation.
//!
//! A class is a record of a field schema and two method tables (instance,
//! static); there is no inheritance, only conformance to a named `spec`.
//! Conformance is checked once, at `impl C for S` time.

use std::collections::HashMap;
use std::rc::Rc;

use crate::parser::ast::{ClassDecl, FieldDecl, MethodDecl, SpecDecl};

use super::environment::Environment;
use super::value::{ClassValue, FieldSchema, FunctionValue, MethodEntry, SpecValue, Value};

pub fn build_class(decl: &ClassDecl, decl_env: &Environment) -> Rc<ClassValue> {
    let fields = decl
        .fields
        .iter()
        .map(|f: &FieldDecl| FieldSchema {
            name: f.name.clone(),
            public: f.public,
            mutable: f.mutable,
            default: f.default.clone(),
        })
        .collect();
    Rc::new(ClassValue {
        name: decl.name.clone(),
        fields,
        methods: HashMap::new().into(),
        static_methods: HashMap::new().into(),
        specs: Vec::new().into(),
        decl_env: decl_env.clone(),
    })
}

pub fn build_spec(decl: &SpecDecl) -> Rc<SpecValue> {
    Rc::new(SpecValue {
        name: decl.name.clone(),
        signatures: decl
            .signatures
            .iter()
            .map(|sig| (sig.name.clone(), sig.params.len()))
            .collect(),
    })
}

pub fn build_method_entry(decl: &MethodDecl, closure_env: &Environment) -> Rc<MethodEntry> {
    Rc::new(MethodEntry {
        func: Rc::new(FunctionValue {
            name: Some(decl.name.clone()),
            params: Rc::new(decl.params.clone()),
            body: Rc::new(decl.body.clone()),
            env: closure_env.clone(),
        }),
        public: decl.public,
        is_static: decl.is_static,
        mut_receiver: decl.mut_receiver,
    })
}

/// Checks that `class` implements every method `spec` requires (by name and
/// arity). Returns the name of the first missing method, if any.
pub fn missing_spec_method(class: &ClassValue, spec: &SpecValue) -> Option<String> {
    let methods = class.methods.borrow();
    for (name, arity) in &spec.signatures {
        match methods.get(name) {
            Some(entry) if entry.func.params.len() == *arity => continue,
            _ => return Some(name.clone()),
        }
    }
    None
}

/// Builds a fresh instance with every field initialized to its default,
/// evaluated in the class's declaration environment (not the call site),
/// mirroring function default-parameter scoping.
pub fn instantiate_fields(
    class: &ClassValue,
    mut eval_default: impl FnMut(&crate::parser::ast::Expression, &Environment) -> Value,
) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    for schema in &class.fields {
        let value = match &schema.default {
            Some(expr) => eval_default(expr, &class.decl_env),
            None => Value::Null,
        };
        fields.insert(schema.name.clone(), value);
    }
    fields
}
