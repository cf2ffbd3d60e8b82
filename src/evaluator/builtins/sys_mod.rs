//! `sys.*` module: host OS identification, process arguments, environment
//! variables, and process exit.

use std::rc::Rc;

use crate::evaluator::environment::Environment;
use crate::evaluator::value::Value;

pub fn install(module_env: &Environment, program_args: Vec<String>) {
    module_env.declare(
        "os",
        Value::BuiltinFunction(
            "sys.os".into(),
            Rc::new(|_args| Value::str(std::env::consts::OS)),
        ),
        false,
    );
    module_env.declare(
        "arch",
        Value::BuiltinFunction(
            "sys.arch".into(),
            Rc::new(|_args| Value::str(std::env::consts::ARCH)),
        ),
        false,
    );
    let args_list: Vec<Value> = program_args.into_iter().map(Value::str).collect();
    module_env.declare(
        "args",
        Value::BuiltinFunction(
            "sys.args".into(),
            Rc::new(move |_args| Value::list(args_list.clone())),
        ),
        false,
    );
    module_env.declare(
        "exit",
        Value::BuiltinFunction(
            "sys.exit".into(),
            Rc::new(|args| {
                let code = match args.first() {
                    Some(Value::Integer(n)) => *n as i32,
                    _ => 0,
                };
                log::debug!("sys.exit({code}) requested mid-evaluation");
                std::process::exit(code);
            }),
        ),
        false,
    );
    module_env.declare(
        "env",
        Value::BuiltinFunction(
            "sys.env".into(),
            Rc::new(|args| match args.first() {
                Some(Value::Str(name)) => match std::env::var(name.as_ref()) {
                    Ok(v) => Value::str(v),
                    Err(_) => Value::Null,
                },
                _ => Value::Error("env() argument must be a string".into()),
            }),
        ),
        false,
    );
}
