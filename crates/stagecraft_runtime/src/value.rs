//! 运行时值
//!
//! 数组和对象按引用共享 (`Rc<RefCell<..>>`)，其余值按值复制。

use crate::env::Env;
use crate::error::RuntimeResult;
use crate::interpreter::Interpreter;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use stagecraft_syntax::ast::{self, format_number};
use stagecraft_syntax::printer::function_to_string;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type Array = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<IndexMap<String, Value>>>;

/// 原生函数：可以通过解释器回调脚本函数
pub type NativeFn = dyn Fn(&mut Interpreter, &[Value]) -> RuntimeResult<Value>;

pub enum Function {
    Closure {
        func: Rc<ast::Function>,
        env: Env,
    },
    Native {
        name: String,
        call: Box<NativeFn>,
    },
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Closure { func, .. } => func.name.as_deref().unwrap_or(""),
            Function::Native { name, .. } => name,
        }
    }
}

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Array),
    Object(Object),
    Date(DateTime<Utc>),
    /// 原样插入生成代码的文本
    Raw(Rc<str>),
    Function(Rc<Function>),
}

impl Value {
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(text.as_ref()))
    }

    pub fn raw(text: impl AsRef<str>) -> Self {
        Value::Raw(Rc::from(text.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Rc::new(RefCell::new(map)))
    }

    /// 不需要解释器的原生函数
    pub fn native(
        name: impl Into<String>,
        call: impl Fn(&[Value]) -> RuntimeResult<Value> + 'static,
    ) -> Self {
        Value::Function(Rc::new(Function::Native {
            name: name.into(),
            call: Box::new(move |_, args| call(args)),
        }))
    }

    /// 可以回调脚本函数的原生函数
    pub fn native_with_interpreter(
        name: impl Into<String>,
        call: impl Fn(&mut Interpreter, &[Value]) -> RuntimeResult<Value> + 'static,
    ) -> Self {
        Value::Function(Rc::new(Function::Native {
            name: name.into(),
            call: Box::new(call),
        }))
    }

    /// `typeof` 的结果
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Raw(_) => {
                "object"
            }
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Date(date) => date.timestamp_millis() as f64,
            Value::Array(items) => {
                let items = items.borrow();
                match items.as_slice() {
                    [] => 0.0,
                    [single] => Value::string(single.to_string()).to_number(),
                    _ => f64::NAN,
                }
            }
            Value::Object(_) | Value::Raw(_) | Value::Function(_) => f64::NAN,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// `===`：数组、对象和函数比较引用
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`：null 与 undefined 相等，数字与字符串/布尔按数字比较
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::Str(_))
            | (Value::Str(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_equals(other),
        }
    }
}

/// 时间值的 ISO 8601 文本 (毫秒精度，UTC)
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// `String(value)` 的语义
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) | Value::Raw(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Date(date) => write!(f, "{}", format_date(date)),
            Value::Function(func) => match func.as_ref() {
                Function::Closure { func, .. } => write!(f, "{}", function_to_string(func)),
                Function::Native { name, .. } => {
                    write!(f, "function {}() {{ [native code] }}", name)
                }
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(map) => f.debug_map().entries(map.borrow().iter()).finish(),
            Value::Date(date) => write!(f, "Date({})", format_date(date)),
            Value::Raw(text) => write!(f, "Raw({:?})", text),
            Value::Function(func) => write!(f, "Function({})", func.name()),
        }
    }
}

// 结构相等 (测试与断言用)；函数比较引用
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Object(a), Value::Object(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            _ => self.strict_equals(other),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}
