//! 从 JSON 读取构建上下文
//!
//! 普通 JSON 值按原样转换；两种单键对象有特殊含义：
//! `{"$code": "..."}` 是原样插入的代码，`{"$date": "..."}` 是时间值。

use anyhow::{anyhow, bail, Context as _, Result};
use serde_json::Value as Json;
use stagecraft_diagnostics::Diagnostic;
use stagecraft_gen::{insert_code, Context, Registry};
use stagecraft_runtime::builtins::parse_date;
use stagecraft_runtime::Value;
use std::fs;
use std::path::Path;

/// 合并上下文文件和 `--set NAME=JSON` 参数，后者覆盖前者
pub fn load_context(file: Option<&Path>, assignments: &[String]) -> Result<Context> {
    let mut context = Context::new();

    if let Some(file) = file {
        let text = fs::read_to_string(file)
            .with_context(|| format!("failed to read context file {}", file.display()))?;
        let json: Json = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", file.display()))?;
        let Json::Object(entries) = json else {
            bail!("context file {} must contain a JSON object", file.display());
        };
        for (name, value) in &entries {
            context.insert(name.clone(), json_to_value(value)?);
        }
    }

    for assignment in assignments {
        let (name, value) = parse_assignment(assignment)?;
        context.insert(name, value);
    }

    tracing::debug!(entries = context.len(), "loaded context");
    Ok(context)
}

/// 不是分段参数的条目，生成时会被忽略
pub fn unused_entries<'a>(context: &'a Context, registry: &Registry) -> Vec<&'a str> {
    context
        .iter()
        .map(|(name, _)| name)
        .filter(|name| !registry.is_staged(name))
        .collect()
}

pub fn unused_warning(name: &str) -> Diagnostic {
    Diagnostic::warning(format!("context entry `{}` is not a staged parameter", name))
        .with_note("it is ignored during generation")
}

fn parse_assignment(text: &str) -> Result<(String, Value)> {
    let (name, json) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=JSON, got `{}`", text))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("missing name in `{}`", text);
    }
    let json: Json =
        serde_json::from_str(json).with_context(|| format!("invalid JSON value for {}", name))?;
    Ok((name.to_string(), json_to_value(&json)?))
}

pub fn json_to_value(json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::string(s),
        Json::Array(items) => Value::array(
            items
                .iter()
                .map(json_to_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        Json::Object(map) => {
            if map.len() == 1 {
                match map.iter().next() {
                    Some((key, Json::String(code))) if key == "$code" => {
                        return Ok(insert_code(code));
                    }
                    Some((key, Json::String(date))) if key == "$date" => {
                        let date = parse_date(date).map_err(|err| anyhow!("{}", err))?;
                        return Ok(Value::Date(date));
                    }
                    _ => {}
                }
            }
            let entries = map
                .iter()
                .map(|(key, value)| Ok((key.clone(), json_to_value(value)?)))
                .collect::<Result<Vec<_>>>()?;
            Value::object(entries)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = json_to_value(&json!({ "a": [1, "x", null], "b": true })).unwrap();
        assert_eq!(
            value,
            Value::object([
                (
                    "a",
                    Value::array(vec![1.0.into(), "x".into(), Value::Null])
                ),
                ("b", Value::Bool(true)),
            ])
        );
    }

    #[test]
    fn test_code_and_date_markers() {
        assert_eq!(
            json_to_value(&json!({ "$code": "X.Y" })).unwrap(),
            Value::raw("X.Y")
        );
        let date = json_to_value(&json!({ "$date": "1970-01-01T00:00:00.000Z" })).unwrap();
        assert_eq!(date.to_number(), 0.0);

        // 多个键时只是普通对象
        let value = json_to_value(&json!({ "$code": "X", "other": 1 })).unwrap();
        assert!(matches!(value, Value::Object(_)));
    }

    #[test]
    fn test_invalid_date() {
        assert!(json_to_value(&json!({ "$date": "yesterday" })).is_err());
    }

    #[test]
    fn test_assignments_override() {
        let context = load_context(
            None,
            &["$n=1".to_string(), "$s=\"a=b\"".to_string(), "$n=2".to_string()],
        )
        .unwrap();
        assert_eq!(context.len(), 2);
        assert_eq!(context.get("$n"), Some(&Value::Number(2.0)));
        assert_eq!(context.get("$s"), Some(&Value::string("a=b")));
    }

    #[test]
    fn test_malformed_assignment() {
        assert!(parse_assignment("$n").is_err());
        assert!(parse_assignment("=1").is_err());
        assert!(parse_assignment("$n={").is_err());
    }

    #[test]
    fn test_unused_entries_warn() {
        use stagecraft_gen::{Generator, GeneratorOptions};

        let generator = Generator::new("($a, b) => { f($a, b); }", GeneratorOptions::new()).unwrap();
        let context = load_context(None, &["$a=1".to_string(), "b=2".to_string(), "$z=3".to_string()])
            .unwrap();
        let unused = unused_entries(&context, generator.registry());
        assert_eq!(unused, vec!["b", "$z"]);

        let diag = unused_warning(unused[1]);
        assert!(!diag.is_error());
        assert_eq!(diag.message, "context entry `$z` is not a staged parameter");
    }
}
