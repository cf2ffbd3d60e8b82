//! `str.*` module functions, and the built-in instance methods reachable on
//! a `String` value directly (`"  hi  ".trim().upper()`). Both forms share
//! one dispatch table; the module form just treats its first argument as
//! the receiver.

use crate::evaluator::value::Value;

pub fn dispatch(method: &str, recv: &str, args: &[Value]) -> Option<Value> {
    Some(match method {
        "split" => {
            let sep = arg_str(args, 0).unwrap_or_default();
            let parts: Vec<Value> = if sep.is_empty() {
                recv.chars().map(|c| Value::str(c.to_string())).collect()
            } else {
                recv.split(sep.as_str()).map(Value::str).collect()
            };
            Value::list(parts)
        }
        "join" => {
            // receiver is the separator; args[0] is a List of strings.
            let Some(Value::List(items)) = args.first() else {
                return Some(Value::Error("join() argument must be a list".into()));
            };
            let parts: Vec<String> = items.borrow().iter().map(|v| v.inspect()).collect();
            Value::str(parts.join(recv))
        }
        "trim" => Value::str(recv.trim().to_string()),
        "find" => {
            let needle = arg_str(args, 0).unwrap_or_default();
            match recv.find(needle.as_str()) {
                Some(byte_idx) => Value::Integer(recv[..byte_idx].chars().count() as i64),
                None => Value::Integer(-1),
            }
        }
        "replace" => {
            let from = arg_str(args, 0).unwrap_or_default();
            let to = arg_str(args, 1).unwrap_or_default();
            Value::str(recv.replace(from.as_str(), to.as_str()))
        }
        "substring" => {
            let chars: Vec<char> = recv.chars().collect();
            let start = arg_int(args, 0).unwrap_or(0).clamp(0, chars.len() as i64) as usize;
            let end = arg_int(args, 1)
                .unwrap_or(chars.len() as i64)
                .clamp(start as i64, chars.len() as i64) as usize;
            Value::str(chars[start..end].iter().collect::<String>())
        }
        "starts_with" => Value::Boolean(recv.starts_with(arg_str(args, 0).unwrap_or_default().as_str())),
        "ends_with" => Value::Boolean(recv.ends_with(arg_str(args, 0).unwrap_or_default().as_str())),
        "upper" => Value::str(recv.to_uppercase()),
        "lower" => Value::str(recv.to_lowercase()),
        "contains" => Value::Boolean(recv.contains(arg_str(args, 0).unwrap_or_default().as_str())),
        _ => return None,
    })
}

fn arg_str(args: &[Value], i: usize) -> Option<String> {
    match args.get(i)? {
        Value::Str(s) => Some(s.to_string()),
        other => Some(other.inspect()),
    }
}

fn arg_int(args: &[Value], i: usize) -> Option<i64> {
    match args.get(i)? {
        Value::Integer(n) => Some(*n),
        _ => None,
    }
}
