//! The runtime value universe: one tagged enum, per the design notes — no
//! class hierarchy, every variant carries its own payload.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::parser::ast::{Block, Param};

use super::environment::Environment;

pub type BuiltinFn = Rc<dyn Fn(&[Value]) -> Value>;

#[derive(Clone)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Rc<Vec<Param>>,
    pub body: Rc<Block>,
    pub env: Environment,
}

pub struct MethodEntry {
    pub func: Rc<FunctionValue>,
    pub public: bool,
    pub is_static: bool,
    pub mut_receiver: bool,
}

pub struct FieldSchema {
    pub name: String,
    pub public: bool,
    pub mutable: bool,
    pub default: Option<crate::parser::ast::Expression>,
}

pub struct ClassValue {
    pub name: String,
    pub fields: Vec<FieldSchema>,
    pub methods: RefCell<HashMap<String, Rc<MethodEntry>>>,
    pub static_methods: RefCell<HashMap<String, Rc<MethodEntry>>>,
    pub specs: RefCell<Vec<Rc<SpecValue>>>,
    /// Environment the `class` statement was declared in; field defaults and
    /// method closures are evaluated/captured against this, mirroring how
    /// function parameter defaults capture their defining environment.
    pub decl_env: Environment,
}

pub struct SpecValue {
    pub name: String,
    pub signatures: Vec<(String, usize)>,
}

pub struct EnumTypeValue {
    pub name: String,
    pub variants: Vec<String>,
}

pub struct InstanceValue {
    pub class: Rc<ClassValue>,
    pub fields: RefCell<HashMap<String, Value>>,
}

pub struct BoundMethodValue {
    pub instance: Value,
    pub method: Rc<FunctionValue>,
}

pub struct ModuleValue {
    pub name: String,
    pub env: Environment,
}

pub enum FileMode {
    Read,
    Write,
    Append,
    ReadWrite,
}

pub struct FileHandle {
    pub path: String,
    pub mode: FileMode,
    pub handle: Option<std::fs::File>,
    pub reader: Option<std::io::BufReader<std::fs::File>>,
}

#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Str(Rc<str>),
    Boolean(bool),
    Null,
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<HashMap<MapKey, Value>>>),
    Function(Rc<FunctionValue>),
    BuiltinFunction(Rc<str>, BuiltinFn),
    Class(Rc<ClassValue>),
    Instance(Rc<InstanceValue>),
    BoundMethod(Rc<BoundMethodValue>),
    Spec(Rc<SpecValue>),
    EnumType(Rc<EnumTypeValue>),
    EnumValue(Rc<str>, Rc<str>),
    ResultOk(Box<Value>),
    ResultErr(Box<Value>),
    Reference(Rc<RefCell<Value>>),
    Range(i64, i64, bool),
    Module(Rc<ModuleValue>),
    File(Rc<RefCell<FileHandle>>),
    Error(String),
    // Control signals, propagated as ordinary values per the design notes.
    Return(Box<Value>),
    Break,
    Continue,
}

#[derive(Clone, PartialEq, Eq)]
pub enum MapKey {
    Integer(i64),
    Str(Rc<str>),
    Boolean(bool),
}

impl MapKey {
    pub fn from_value(v: &Value) -> Option<MapKey> {
        match v {
            Value::Integer(n) => Some(MapKey::Integer(*n)),
            Value::Str(s) => Some(MapKey::Str(s.clone())),
            Value::Boolean(b) => Some(MapKey::Boolean(*b)),
            _ => None,
        }
    }

    pub fn into_value(&self) -> Value {
        match self {
            MapKey::Integer(n) => Value::Integer(*n),
            MapKey::Str(s) => Value::Str(s.clone()),
            MapKey::Boolean(b) => Value::Boolean(*b),
        }
    }

    /// DJB2 over the key's canonical byte form, matching the hashing rule
    /// for strings and the numeric value for ints/bools.
    pub fn djb2(&self) -> u64 {
        match self {
            MapKey::Integer(n) => *n as u64,
            MapKey::Boolean(b) => *b as u64,
            MapKey::Str(s) => {
                let mut h: u64 = 5381;
                for byte in s.as_bytes() {
                    h = h.wrapping_mul(33).wrapping_add(*byte as u64);
                }
                h
            }
        }
    }
}

impl std::hash::Hash for MapKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.djb2());
    }
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_control_signal(&self) -> bool {
        matches!(self, Value::Return(_) | Value::Break | Value::Continue | Value::Error(_))
    }

    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    /// The category name used by `is` and type-mismatch error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Boolean(_) => "bool",
            Value::Null => "nil",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) | Value::BuiltinFunction(_, _) | Value::BoundMethod(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Spec(_) => "spec",
            Value::EnumType(_) => "enum",
            Value::EnumValue(_, _) => "enum_value",
            Value::ResultOk(_) => "Ok",
            Value::ResultErr(_) => "Err",
            Value::Reference(_) => "reference",
            Value::Range(_, _, _) => "range",
            Value::Module(_) => "module",
            Value::File(_) => "file",
            Value::Error(_) => "error",
            Value::Return(_) => "return",
            Value::Break => "break",
            Value::Continue => "continue",
        }
    }

    /// `is T`: tests the value's runtime category or the name of the class,
    /// spec, or enum type it belongs to.
    pub fn is_type(&self, name: &str) -> bool {
        if self.type_name() == name {
            return true;
        }
        match self {
            Value::Instance(inst) => {
                inst.class.name == name
                    || inst
                        .class
                        .specs
                        .borrow()
                        .iter()
                        .any(|s| s.name == name)
            }
            Value::EnumValue(enum_name, _) => enum_name.as_ref() == name,
            _ => false,
        }
    }

    /// Value-equality, used for `==`, match literal patterns, and map-key
    /// comparisons. Differing primitive types compare unequal except for
    /// numeric cross-comparison (int vs float by numeric value).
    pub fn value_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => (*a as f64) == *b,
            (Str(a), Str(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Null, Null) => true,
            (List(a), List(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.value_eq(y))
            }
            (EnumValue(en1, v1), EnumValue(en2, v2)) => en1 == en2 && v1 == v2,
            (ResultOk(a), ResultOk(b)) => a.value_eq(b),
            (ResultErr(a), ResultErr(b)) => a.value_eq(b),
            (Range(s1, e1, i1), Range(s2, e2, i2)) => s1 == s2 && e1 == e2 && i1 == i2,
            (Instance(a), Instance(b)) => Rc::ptr_eq(a, b),
            (Class(a), Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The human-readable representation used by `string()`, `print`, and
    /// interpolation, named `inspect` throughout the spec.
    pub fn inspect(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Str(s) => s.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "nil".to_string(),
            Value::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::inspect_quoted).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Map(map) => {
                let mut entries: Vec<(MapKey, Value)> =
                    map.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                entries.sort_by(|a, b| a.0.into_value().inspect().cmp(&b.0.into_value().inspect()));
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.into_value().inspect_quoted(), v.inspect_quoted()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Function(f) => format!("<function {}>", f.name.as_deref().unwrap_or("anonymous")),
            Value::BuiltinFunction(name, _) => format!("<builtin {name}>"),
            Value::Class(c) => format!("<class {}>", c.name),
            Value::Instance(i) => format!("<{} instance>", i.class.name),
            Value::BoundMethod(b) => format!(
                "<bound method {}>",
                b.method.name.as_deref().unwrap_or("anonymous")
            ),
            Value::Spec(s) => format!("<spec {}>", s.name),
            Value::EnumType(e) => format!("<enum {}>", e.name),
            Value::EnumValue(en, variant) => format!("{en}.{variant}"),
            Value::ResultOk(v) => format!("Ok({})", v.inspect_quoted()),
            Value::ResultErr(v) => format!("Err({})", v.inspect_quoted()),
            Value::Reference(handle) => handle.borrow().inspect(),
            Value::Range(start, end, inclusive) => {
                format!("{start}{}{end}", if *inclusive { "..=" } else { ".." })
            }
            Value::Module(m) => format!("<module {}>", m.name),
            Value::File(f) => format!("<file {}>", f.borrow().path),
            Value::Error(msg) => format!("Error({msg})"),
            Value::Return(v) => v.inspect(),
            Value::Break => "<break>".to_string(),
            Value::Continue => "<continue>".to_string(),
        }
    }

    fn inspect_quoted(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{s}\""),
            other => other.inspect(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}
