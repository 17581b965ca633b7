//! Value Serialization
//!
//! 把生成期的值写成生成代码里的字面量：
//! 原样插入的文本不加引号，时间值写成 `new Date("...")`，其余按紧凑 JSON。

use stagecraft_runtime::{format_date, RuntimeError, RuntimeResult, Value};
use stagecraft_syntax::ast::format_number;
use stagecraft_syntax::printer::quote;

/// 原样插入值的构造函数
pub fn insert_code(code: impl AsRef<str>) -> Value {
    Value::raw(code)
}

pub fn serialize(value: &Value) -> RuntimeResult<String> {
    let mut out = String::new();
    let mut path = Vec::new();
    match write_value(&mut out, value, &mut path)? {
        true => Ok(out),
        false => Ok("undefined".to_string()),
    }
}

// 返回 false 表示这个值在 JSON 中没有表示 (undefined、函数)
fn write_value(out: &mut String, value: &Value, path: &mut Vec<usize>) -> RuntimeResult<bool> {
    match value {
        Value::Undefined | Value::Function(_) => return Ok(false),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            if n.is_finite() {
                out.push_str(&format_number(*n));
            } else {
                out.push_str("null");
            }
        }
        Value::Str(s) => out.push_str(&quote(s)),
        Value::Raw(code) => out.push_str(code),
        Value::Date(date) => {
            out.push_str("new Date(");
            out.push_str(&quote(&format_date(date)));
            out.push(')');
        }
        Value::Array(items) => {
            enter(path, items.as_ptr() as usize)?;
            out.push('[');
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if !write_value(out, item, path)? {
                    out.push_str("null");
                }
            }
            out.push(']');
            path.pop();
        }
        Value::Object(map) => {
            enter(path, map.as_ptr() as usize)?;
            out.push('{');
            let mut first = true;
            for (key, item) in map.borrow().iter() {
                let mark = out.len();
                if !first {
                    out.push(',');
                }
                out.push_str(&quote(key));
                out.push(':');
                if write_value(out, item, path)? {
                    first = false;
                } else {
                    // 没有表示的属性整个省略
                    out.truncate(mark);
                }
            }
            out.push('}');
            path.pop();
        }
    }
    Ok(true)
}

fn enter(path: &mut Vec<usize>, id: usize) -> RuntimeResult<()> {
    if path.contains(&id) {
        return Err(RuntimeError::Type(
            "cannot serialize a circular structure".to_string(),
        ));
    }
    path.push(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ser(value: &Value) -> String {
        serialize(value).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(ser(&Value::Number(12.0)), "12");
        assert_eq!(ser(&Value::Number(-0.5)), "-0.5");
        assert_eq!(ser(&Value::Number(f64::NAN)), "null");
        assert_eq!(ser(&Value::Number(f64::INFINITY)), "null");
        assert_eq!(ser(&Value::string("a\"b\n")), r#""a\"b\n""#);
        assert_eq!(ser(&Value::Bool(true)), "true");
        assert_eq!(ser(&Value::Null), "null");
        assert_eq!(ser(&Value::Undefined), "undefined");
        assert_eq!(ser(&Value::native("f", |_| Ok(Value::Undefined))), "undefined");
    }

    #[test]
    fn test_special_forms() {
        assert_eq!(ser(&insert_code("X.Y")), "X.Y");
        let date = DateTime::from_timestamp_millis(0).unwrap();
        assert_eq!(ser(&Value::Date(date)), r#"new Date("1970-01-01T00:00:00.000Z")"#);
    }

    #[test]
    fn test_containers() {
        let value = Value::object([
            ("a", Value::array(vec![1.0.into(), Value::Undefined, "x".into()])),
            ("skip", Value::Undefined),
            ("hello", "world".into()),
            ("code", insert_code("target.length")),
        ]);
        assert_eq!(
            ser(&value),
            r#"{"a":[1,null,"x"],"hello":"world","code":target.length}"#
        );

        let value = Value::object([("skip", Value::Undefined), ("b", Value::Null)]);
        assert_eq!(ser(&value), r#"{"b":null}"#);
        let value = Value::object([("only", Value::Undefined)]);
        assert_eq!(ser(&value), "{}");
    }

    #[test]
    fn test_shared_is_not_circular() {
        let shared = Value::array(vec![1.0.into()]);
        let value = Value::array(vec![shared.clone(), shared]);
        assert_eq!(ser(&value), "[[1],[1]]");
    }

    #[test]
    fn test_circular_structure() {
        let items = Value::array(vec![]);
        if let Value::Array(inner) = &items {
            inner.borrow_mut().push(items.clone());
        }
        assert!(serialize(&items).is_err());
    }
}
