//! `char.*` module: single-character classification and codepoint conversion.
//! Receivers are one-character strings (the language has no distinct `char`
//! value type).

use crate::evaluator::value::Value;

pub fn dispatch(method: &str, args: &[Value]) -> Option<Value> {
    Some(match method {
        "ord" => {
            let c = first_char(args)?;
            Value::Integer(c as i64)
        }
        "chr" => match args.first() {
            Some(Value::Integer(n)) => match char::from_u32(*n as u32) {
                Some(c) => Value::str(c.to_string()),
                None => Value::Error(format!("chr() argument out of range: {n}")),
            },
            _ => Value::Error("chr() argument must be an int".into()),
        },
        "is_digit" => Value::Boolean(first_char(args).map(|c| c.is_ascii_digit()).unwrap_or(false)),
        "is_alpha" => Value::Boolean(first_char(args).map(|c| c.is_alphabetic()).unwrap_or(false)),
        "is_space" => Value::Boolean(first_char(args).map(|c| c.is_whitespace()).unwrap_or(false)),
        "is_alnum" => Value::Boolean(first_char(args).map(|c| c.is_alphanumeric()).unwrap_or(false)),
        _ => return None,
    })
}

fn first_char(args: &[Value]) -> Option<char> {
    match args.first()? {
        Value::Str(s) => s.chars().next(),
        _ => None,
    }
}
