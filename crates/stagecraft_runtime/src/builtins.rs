//! 内置函数与方法
//!
//! 全局对象 (Math, Object, String, Number, Date, Error, Array) 以及
//! 数组、字符串、日期和数字上的方法。

use crate::env::Env;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::value::{format_date, Value};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use stagecraft_syntax::ast::format_number;
use std::cell::RefCell;
use std::rc::Rc;

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn not_a_function(kind: &str, key: &str) -> RuntimeError {
    RuntimeError::Type(format!("{}.{} is not a function", kind, key))
}

pub fn install_globals(env: &Env) {
    let math = Value::object([
        ("PI", Value::Number(std::f64::consts::PI)),
        ("floor", math_fn("floor", f64::floor)),
        ("ceil", math_fn("ceil", f64::ceil)),
        ("round", math_fn("round", |x| (x + 0.5).floor())),
        ("abs", math_fn("abs", f64::abs)),
        ("sqrt", math_fn("sqrt", f64::sqrt)),
        (
            "pow",
            Value::native("pow", |args| {
                Ok(Value::Number(arg(args, 0).to_number().powf(arg(args, 1).to_number())))
            }),
        ),
        (
            "max",
            Value::native("max", |args| Ok(Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)))),
        ),
        (
            "min",
            Value::native("min", |args| Ok(Value::Number(fold_numbers(args, f64::INFINITY, f64::min)))),
        ),
    ]);
    env.declare("Math", math, false);

    let object = Value::object([
        ("keys", Value::native("keys", |args| Ok(Value::array(entries(&arg(args, 0)).into_iter().map(|(k, _)| Value::string(k)).collect())))),
        ("values", Value::native("values", |args| Ok(Value::array(entries(&arg(args, 0)).into_iter().map(|(_, v)| v).collect())))),
        (
            "entries",
            Value::native("entries", |args| {
                let pairs = entries(&arg(args, 0))
                    .into_iter()
                    .map(|(k, v)| Value::array(vec![Value::string(k), v]))
                    .collect();
                Ok(Value::array(pairs))
            }),
        ),
    ]);
    env.declare("Object", object, false);

    let array = Value::object([(
        "isArray",
        Value::native("isArray", |args| Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))),
    )]);
    env.declare("Array", array, false);

    env.declare(
        "String",
        Value::native("String", |args| Ok(Value::string(arg(args, 0).to_string()))),
        false,
    );
    env.declare(
        "Number",
        Value::native("Number", |args| Ok(Value::Number(arg(args, 0).to_number()))),
        false,
    );
    env.declare("Date", Value::native("Date", construct_date), false);
    env.declare(
        "Error",
        Value::native("Error", |args| {
            Ok(Value::object([
                ("name", Value::string("Error")),
                ("message", Value::string(arg(args, 0).to_string())),
            ]))
        }),
        false,
    );
}

fn math_fn(name: &'static str, f: fn(f64) -> f64) -> Value {
    Value::native(name, move |args| Ok(Value::Number(f(arg(args, 0).to_number()))))
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// `new Date(..)`：无参数取当前时间，字符串按 ISO 8601 解析，数字是毫秒时间戳
pub fn construct_date(args: &[Value]) -> RuntimeResult<Value> {
    match args.first() {
        None | Some(Value::Undefined) => Ok(Value::Date(Utc::now())),
        Some(Value::Str(text)) => parse_date(text).map(Value::Date),
        Some(Value::Date(date)) => Ok(Value::Date(*date)),
        Some(other) => {
            let millis = other.to_number();
            if !millis.is_finite() {
                return Err(RuntimeError::Native("invalid time value".to_string()));
            }
            DateTime::from_timestamp_millis(millis as i64)
                .map(Value::Date)
                .ok_or_else(|| RuntimeError::Native("invalid time value".to_string()))
        }
    }
}

pub fn parse_date(text: &str) -> RuntimeResult<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| RuntimeError::Native(format!("invalid date `{}`", text)))
}

/// 内置类型上的方法调用
pub fn call_method(
    interp: &mut Interpreter,
    target: &Value,
    key: &str,
    args: &[Value],
) -> RuntimeResult<Value> {
    match target {
        Value::Array(items) => array_method(interp, items, key, args),
        Value::Str(s) => string_method(s, key, args),
        Value::Date(date) => match key {
            "toISOString" | "toJSON" | "toString" => Ok(Value::string(format_date(date))),
            "getTime" | "valueOf" => Ok(Value::Number(date.timestamp_millis() as f64)),
            _ => Err(not_a_function("date", key)),
        },
        Value::Number(n) => match key {
            "toString" => Ok(Value::string(format_number(*n))),
            "toFixed" => {
                let digits = arg(args, 0).to_number();
                let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
                Ok(Value::string(format!("{:.*}", digits, n)))
            }
            _ => Err(not_a_function("number", key)),
        },
        other => Err(not_a_function(other.type_name(), key)),
    }
}

// slice 的起止下标：负数从末尾计算
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    match value {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = value.to_number().trunc();
            if n.is_nan() {
                0
            } else if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                n.min(len as f64) as usize
            }
        }
    }
}

fn array_method(
    interp: &mut Interpreter,
    items: &Rc<RefCell<Vec<Value>>>,
    key: &str,
    args: &[Value],
) -> RuntimeResult<Value> {
    match key {
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }
        "pop" => Ok(items.borrow_mut().pop().unwrap_or(Value::Undefined)),
        "includes" => {
            let needle = arg(args, 0);
            let found = items.borrow().iter().any(|item| {
                item.strict_equals(&needle)
                    || matches!((item, &needle), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
            });
            Ok(Value::Bool(found))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let position = items.borrow().iter().position(|item| item.strict_equals(&needle));
            Ok(Value::Number(position.map_or(-1.0, |i| i as f64)))
        }
        "join" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_string(),
            };
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_string() })
                .collect();
            Ok(Value::string(parts.join(&separator)))
        }
        "slice" => {
            let items = items.borrow();
            let start = relative_index(args.first(), items.len(), 0);
            let end = relative_index(args.get(1), items.len(), items.len());
            let slice = if start < end { items[start..end].to_vec() } else { Vec::new() };
            Ok(Value::array(slice))
        }
        "concat" => {
            let mut result = items.borrow().clone();
            for value in args {
                match value {
                    Value::Array(other) => result.extend(other.borrow().iter().cloned()),
                    other => result.push(other.clone()),
                }
            }
            Ok(Value::array(result))
        }
        "map" | "filter" | "forEach" => {
            let callback = arg(args, 0);
            // 回调可能修改数组，先取快照
            let snapshot = items.borrow().clone();
            let mut result = Vec::new();
            for (i, item) in snapshot.into_iter().enumerate() {
                let output = interp.call_value(&callback, &[item.clone(), Value::Number(i as f64)])?;
                match key {
                    "map" => result.push(output),
                    "filter" if output.truthy() => result.push(item),
                    _ => {}
                }
            }
            if key == "forEach" {
                Ok(Value::Undefined)
            } else {
                Ok(Value::array(result))
            }
        }
        "reduce" => {
            let callback = arg(args, 0);
            let snapshot = items.borrow().clone();
            let mut iter = snapshot.into_iter().enumerate();
            let mut acc = match args.get(1) {
                Some(init) => init.clone(),
                None => match iter.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(RuntimeError::Type(
                            "reduce of empty array with no initial value".to_string(),
                        ))
                    }
                },
            };
            for (i, item) in iter {
                acc = interp.call_value(&callback, &[acc, item, Value::Number(i as f64)])?;
            }
            Ok(acc)
        }
        _ => Err(not_a_function("array", key)),
    }
}

fn char_index(haystack: &str, byte_index: usize) -> usize {
    haystack[..byte_index].chars().count()
}

fn string_method(s: &str, key: &str, args: &[Value]) -> RuntimeResult<Value> {
    let text_arg = |index: usize| arg(args, index).to_string();
    match key {
        "toUpperCase" => Ok(Value::string(s.to_uppercase())),
        "toLowerCase" => Ok(Value::string(s.to_lowercase())),
        "trim" => Ok(Value::string(s.trim())),
        "toString" => Ok(Value::string(s)),
        "includes" => Ok(Value::Bool(s.contains(text_arg(0).as_str()))),
        "startsWith" => Ok(Value::Bool(s.starts_with(text_arg(0).as_str()))),
        "endsWith" => Ok(Value::Bool(s.ends_with(text_arg(0).as_str()))),
        "indexOf" => {
            let position = s.find(text_arg(0).as_str()).map(|i| char_index(s, i));
            Ok(Value::Number(position.map_or(-1.0, |i| i as f64)))
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let start = relative_index(args.first(), chars.len(), 0);
            let end = relative_index(args.get(1), chars.len(), chars.len());
            let slice: String = if start < end { chars[start..end].iter().collect() } else { String::new() };
            Ok(Value::string(slice))
        }
        "split" => {
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![Value::string(s)],
                separator => {
                    let separator = separator.to_string();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::string).collect()
                    }
                }
            };
            Ok(Value::array(parts))
        }
        _ => Err(not_a_function("string", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_syntax::parse_program;

    fn run(source: &str) -> Value {
        let program = parse_program(source).unwrap();
        Interpreter::new().run_program(&program).unwrap()
    }

    #[test]
    fn test_array_methods() {
        assert_eq!(
            run("[1, 2, 3].map((x) => x * 2).filter((x) => x > 2).join(\"-\");"),
            Value::string("4-6")
        );
        assert_eq!(
            run("[1, 2, 3, 4].reduce((acc, x) => acc + x);"),
            Value::Number(10.0)
        );
        assert_eq!(run("[1, 2, 3].slice(-2).length;"), Value::Number(2.0));
        assert_eq!(run("[1].concat([2, 3], 4).indexOf(4);"), Value::Number(3.0));
        assert_eq!(run("[1, 2].includes(2);"), Value::Bool(true));
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(run("\" Ab \".trim().toUpperCase();"), Value::string("AB"));
        assert_eq!(run("\"a,b\".split(\",\").length;"), Value::Number(2.0));
        assert_eq!(run("\"hello\".slice(1, -1);"), Value::string("ell"));
        assert_eq!(run("\"hello\".indexOf(\"l\");"), Value::Number(2.0));
    }

    #[test]
    fn test_globals() {
        assert_eq!(run("Math.max(1, 5, 3);"), Value::Number(5.0));
        assert_eq!(run("Math.round(2.5);"), Value::Number(3.0));
        assert_eq!(run("Object.keys({ a: 1, b: 2 }).join();"), Value::string("a,b"));
        assert_eq!(run("String(12) + Number(\"3\");"), Value::string("123"));
    }

    #[test]
    fn test_dates() {
        assert_eq!(
            run("new Date(\"2020-01-01T00:00:00.000Z\").getTime();"),
            Value::Number(1_577_836_800_000.0)
        );
        assert_eq!(
            run("new Date(0).toISOString();"),
            Value::string("1970-01-01T00:00:00.000Z")
        );
        assert_eq!(
            run("new Date(\"2020-01-02\").toISOString();"),
            Value::string("2020-01-02T00:00:00.000Z")
        );
    }

    #[test]
    fn test_invalid_date() {
        assert!(parse_date("not a date").is_err());
    }
}
