//! Built-in methods on `List` values. `filter`/`map` need to call back into
//! user closures, so they take a `call` callback supplied by the evaluator
//! rather than trying to invoke functions themselves.

use std::cell::RefCell;
use std::rc::Rc;

use crate::evaluator::value::Value;

pub fn dispatch(
    list: &Rc<RefCell<Vec<Value>>>,
    method: &str,
    args: &[Value],
    call: &dyn Fn(&Value, &[Value]) -> Value,
) -> Option<Value> {
    Some(match method {
        "append" => {
            let mut items = list.borrow().clone();
            items.extend_from_slice(args);
            Value::list(items)
        }
        "pop" => {
            let mut items = list.borrow_mut();
            match items.pop() {
                Some(v) => v,
                None => Value::Error("pop() from empty list".into()),
            }
        }
        "filter" => {
            let Some(f) = args.first() else {
                return Some(Value::Error("filter() requires a function argument".into()));
            };
            let items = list.borrow();
            let mut result = Vec::new();
            for item in items.iter() {
                let kept = call(f, std::slice::from_ref(item));
                if kept.is_error() {
                    return Some(kept);
                }
                if kept.truthy() {
                    result.push(item.clone());
                }
            }
            Value::list(result)
        }
        "map" => {
            let Some(f) = args.first() else {
                return Some(Value::Error("map() requires a function argument".into()));
            };
            let items = list.borrow();
            let mut result = Vec::with_capacity(items.len());
            for item in items.iter() {
                let mapped = call(f, std::slice::from_ref(item));
                if mapped.is_error() {
                    return Some(mapped);
                }
                result.push(mapped);
            }
            Value::list(result)
        }
        "join" => {
            let sep = match args.first() {
                Some(Value::Str(s)) => s.to_string(),
                _ => String::new(),
            };
            let parts: Vec<String> = list.borrow().iter().map(Value::inspect).collect();
            Value::str(parts.join(&sep))
        }
        "slice" => {
            let items = list.borrow();
            let len = items.len() as i64;
            let start = int_arg(args, 0).unwrap_or(0).clamp(0, len) as usize;
            let end = int_arg(args, 1).unwrap_or(len).clamp(start as i64, len) as usize;
            Value::list(items[start..end].to_vec())
        }
        "index" => {
            let Some(target) = args.first() else {
                return Some(Value::Integer(-1));
            };
            let items = list.borrow();
            match items.iter().position(|v| v.value_eq(target)) {
                Some(i) => Value::Integer(i as i64),
                None => Value::Integer(-1),
            }
        }
        "reverse" => {
            list.borrow_mut().reverse();
            Value::Null
        }
        "sort" => {
            let mut items = list.borrow_mut();
            let all_ints = items.iter().all(|v| matches!(v, Value::Integer(_)));
            if all_ints {
                items.sort_by_key(|v| match v {
                    Value::Integer(n) => *n,
                    _ => unreachable!(),
                });
            } else {
                items.sort_by(|a, b| a.inspect().cmp(&b.inspect()));
            }
            Value::Null
        }
        _ => return None,
    })
}

fn int_arg(args: &[Value], i: usize) -> Option<i64> {
    match args.get(i)? {
        Value::Integer(n) => Some(*n),
        _ => None,
    }
}
