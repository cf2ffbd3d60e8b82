//! Built-in methods on `Map` values. Iteration methods return entries
//! sorted by the string form of the key, per the spec's explicit
//! "do not fix to insertion order" design note.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::evaluator::value::{MapKey, Value};

pub fn dispatch(map: &Rc<RefCell<HashMap<MapKey, Value>>>, method: &str, args: &[Value]) -> Option<Value> {
    Some(match method {
        "keys" => {
            let mut keys: Vec<MapKey> = map.borrow().keys().cloned().collect();
            keys.sort_by(|a, b| a.into_value().inspect().cmp(&b.into_value().inspect()));
            Value::list(keys.into_iter().map(|k| k.into_value()).collect())
        }
        "values" => {
            let borrowed = map.borrow();
            let mut entries: Vec<(MapKey, Value)> =
                borrowed.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            entries.sort_by(|a, b| a.0.into_value().inspect().cmp(&b.0.into_value().inspect()));
            Value::list(entries.into_iter().map(|(_, v)| v).collect())
        }
        "contains" => {
            let Some(key_val) = args.first() else {
                return Some(Value::Boolean(false));
            };
            match MapKey::from_value(key_val) {
                Some(key) => Value::Boolean(map.borrow().contains_key(&key)),
                None => Value::Boolean(false),
            }
        }
        _ => return None,
    })
}
