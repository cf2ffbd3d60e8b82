//! Standard library surface: always-bound builtins plus the `sys`/`str`/
//! `char`/`_io` namespace modules, installed once into the root environment
//! created for every program and module load.

pub mod char_mod;
pub mod io_mod;
pub mod list_methods;
pub mod map_methods;
pub mod str_mod;
pub mod sys_mod;

use std::rc::Rc;

use super::environment::Environment;
use super::value::{ModuleValue, Value};

pub fn install_globals(env: &Environment, program_args: Vec<String>) {
    env.declare(
        "print",
        Value::BuiltinFunction("print".into(), Rc::new(builtin_print)),
        false,
    );
    env.declare(
        "len",
        Value::BuiltinFunction("len".into(), Rc::new(builtin_len)),
        false,
    );
    env.declare(
        "string",
        Value::BuiltinFunction("string".into(), Rc::new(|args| {
            Value::str(args.first().map(Value::inspect).unwrap_or_default())
        })),
        false,
    );
    env.declare(
        "int",
        Value::BuiltinFunction("int".into(), Rc::new(builtin_int)),
        false,
    );
    env.declare(
        "float",
        Value::BuiltinFunction("float".into(), Rc::new(builtin_float)),
        false,
    );
    env.declare(
        "Ok",
        Value::BuiltinFunction(
            "Ok".into(),
            Rc::new(|args| Value::ResultOk(Box::new(args.first().cloned().unwrap_or(Value::Null)))),
        ),
        false,
    );
    env.declare(
        "Err",
        Value::BuiltinFunction(
            "Err".into(),
            Rc::new(|args| Value::ResultErr(Box::new(args.first().cloned().unwrap_or(Value::Null)))),
        ),
        false,
    );

    install_namespace(env, "sys", |module_env| {
        sys_mod::install(module_env, program_args.clone())
    });
    install_namespace(env, "str", |module_env| {
        for name in [
            "split",
            "join",
            "trim",
            "find",
            "replace",
            "substring",
            "starts_with",
            "ends_with",
            "upper",
            "lower",
            "contains",
        ] {
            bind_str_fn(module_env, name);
        }
    });
    install_namespace(env, "char", |module_env| {
        for name in ["ord", "chr", "is_digit", "is_alpha", "is_space", "is_alnum"] {
            bind_char_fn(module_env, name);
        }
    });
    install_namespace(env, "_io", io_mod::install);
}

fn install_namespace(env: &Environment, name: &str, build: impl FnOnce(&Environment)) {
    let module_env = Environment::child(env);
    build(&module_env);
    env.declare(
        name,
        Value::Module(Rc::new(ModuleValue {
            name: name.to_string(),
            env: module_env,
        })),
        false,
    );
}

fn bind_str_fn(module_env: &Environment, name: &'static str) {
    module_env.declare(
        name,
        Value::BuiltinFunction(
            format!("str.{name}").into(),
            Rc::new(move |args| {
                let Some(Value::Str(recv)) = args.first() else {
                    return Value::Error(format!("str.{name}() first argument must be a string"));
                };
                str_mod::dispatch(name, recv, &args[1..])
                    .unwrap_or_else(|| Value::Error(format!("unknown string method: {name}")))
            }),
        ),
        false,
    );
}

fn bind_char_fn(module_env: &Environment, name: &'static str) {
    module_env.declare(
        name,
        Value::BuiltinFunction(
            format!("char.{name}").into(),
            Rc::new(move |args| {
                char_mod::dispatch(name, args)
                    .unwrap_or_else(|| Value::Error(format!("unknown char function: {name}")))
            }),
        ),
        false,
    );
}

fn builtin_print(args: &[Value]) -> Value {
    let parts: Vec<String> = args.iter().map(Value::inspect).collect();
    println!("{}", parts.join(" "));
    Value::Null
}

fn builtin_len(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Str(s)) => Value::Integer(s.chars().count() as i64),
        Some(Value::List(items)) => Value::Integer(items.borrow().len() as i64),
        Some(Value::Map(map)) => Value::Integer(map.borrow().len() as i64),
        Some(other) => Value::Error(format!(
            "len() argument must be string, list, or map, not {}",
            other.type_name()
        )),
        None => Value::Error("len() argument must be string, list, or map, not nil".into()),
    }
}

fn builtin_int(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Integer(n)) => Value::Integer(*n),
        Some(Value::Float(f)) => Value::Integer(f.trunc() as i64),
        Some(Value::Boolean(b)) => Value::Integer(*b as i64),
        Some(Value::Str(s)) => match s.trim().parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::Error(format!("int() argument is not a valid integer: {s}")),
        },
        other => Value::Error(format!(
            "int() argument is not a valid integer: {}",
            other.map(Value::inspect).unwrap_or_default()
        )),
    }
}

fn builtin_float(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Float(f)) => Value::Float(*f),
        Some(Value::Integer(n)) => Value::Float(*n as f64),
        Some(Value::Str(s)) => match s.trim().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::Error(format!("float() argument is not a valid float: {s}")),
        },
        other => Value::Error(format!(
            "float() argument is not a valid float: {}",
            other.map(Value::inspect).unwrap_or_default()
        )),
    }
}
