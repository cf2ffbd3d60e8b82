//! `_io.*` module and `File` bound methods. Shares one `FileHandle` shape
//! with the `unsafe`/`asm` file ops so both views of the filesystem stay
//! consistent (see `classes.rs`'s sibling note in the evaluator).

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{BufReader, Read, Write};
use std::rc::Rc;

use crate::evaluator::environment::Environment;
use crate::evaluator::value::{FileHandle, FileMode, Value};

pub fn install(module_env: &Environment) {
    module_env.declare(
        "open",
        Value::BuiltinFunction("_io.open".into(), Rc::new(open)),
        false,
    );
    module_env.declare(
        "exists",
        Value::BuiltinFunction(
            "_io.exists".into(),
            Rc::new(|args| match args.first() {
                Some(Value::Str(path)) => Value::Boolean(std::path::Path::new(path.as_ref()).exists()),
                _ => Value::Error("exists() argument must be a string".into()),
            }),
        ),
        false,
    );
}

fn open(args: &[Value]) -> Value {
    let (Some(Value::Str(path)), Some(Value::Str(mode))) = (args.first(), args.get(1)) else {
        return Value::Error("open() expects (path, mode)".into());
    };
    let file_mode = match mode.as_ref() {
        "r" => FileMode::Read,
        "w" => FileMode::Write,
        "a" => FileMode::Append,
        "rw" => FileMode::ReadWrite,
        other => return Value::Error(format!("could not open file: unknown mode '{other}'")),
    };
    let mut options = OpenOptions::new();
    match file_mode {
        FileMode::Read => {
            options.read(true);
        }
        FileMode::Write => {
            options.write(true).create(true).truncate(true);
        }
        FileMode::Append => {
            options.append(true).create(true);
        }
        FileMode::ReadWrite => {
            options.read(true).write(true).create(true);
        }
    }
    match options.open(path.as_ref()) {
        Ok(file) => {
            let reader = file.try_clone().ok().map(BufReader::new);
            Value::File(Rc::new(RefCell::new(FileHandle {
                path: path.to_string(),
                mode: file_mode,
                handle: Some(file),
                reader,
            })))
        }
        Err(e) => Value::Error(format!("could not open file: {e}")),
    }
}

pub fn dispatch(file: &Rc<RefCell<FileHandle>>, method: &str, args: &[Value]) -> Option<Value> {
    Some(match method {
        "read" => {
            let mut handle = file.borrow_mut();
            let Some(f) = handle.handle.as_mut() else {
                return Some(Value::Error("file is closed".into()));
            };
            let mut buf = String::new();
            match f.read_to_string(&mut buf) {
                Ok(_) => Value::str(buf),
                Err(e) => Value::Error(format!("read failed: {e}")),
            }
        }
        "read_line" => {
            use std::io::BufRead;
            let mut handle = file.borrow_mut();
            let Some(reader) = handle.reader.as_mut() else {
                return Some(Value::Error("file is closed".into()));
            };
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => Value::Null,
                Ok(_) => Value::str(line.trim_end_matches('\n').to_string()),
                Err(e) => Value::Error(format!("read_line failed: {e}")),
            }
        }
        "write" => {
            let mut handle = file.borrow_mut();
            let Some(f) = handle.handle.as_mut() else {
                return Some(Value::Error("file is closed".into()));
            };
            let text = args.first().map(|v| v.inspect()).unwrap_or_default();
            match f.write_all(text.as_bytes()) {
                Ok(_) => Value::Null,
                Err(e) => Value::Error(format!("write failed: {e}")),
            }
        }
        "close" => {
            let mut handle = file.borrow_mut();
            handle.handle = None;
            handle.reader = None;
            Value::Null
        }
        _ => return None,
    })
}
