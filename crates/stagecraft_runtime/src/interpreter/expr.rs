use super::{ops, Interpreter};
use crate::builtins;
use crate::env::Env;
use crate::error::{RuntimeError, RuntimeResult};
use crate::value::Value;
use indexmap::IndexMap;
use stagecraft_syntax::ast::*;

/// 数组长度上限
const MAX_ARRAY_LENGTH: usize = 1 << 24;

// 可赋值的位置
enum Place {
    Var(String),
    Property(Value, String),
}

impl Interpreter {
    pub fn eval_expr(&mut self, expr: &Expr, env: &Env) -> RuntimeResult<Value> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_value(lit)),
            ExprKind::Ident(name) => env.get(name),
            ExprKind::Array(items) => {
                let values = self.eval_args(items, env)?;
                Ok(Value::array(values))
            }
            ExprKind::Object(props) => {
                let mut map = IndexMap::new();
                for prop in props {
                    let key = match &prop.key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Computed(key) => property_key(&self.eval_expr(key, env)?),
                    };
                    let value = self.eval_expr(&prop.value, env)?;
                    map.insert(key, value);
                }
                Ok(Value::object(map))
            }
            ExprKind::Function(func) => Ok(self.closure(func, env)),
            ExprKind::Unary { op, operand } => {
                // typeof 未声明的变量不报错
                if let (UnaryOp::Typeof, ExprKind::Ident(name)) = (op, &operand.kind) {
                    if !env.contains(name) {
                        return Ok(Value::string("undefined"));
                    }
                }
                let value = self.eval_expr(operand, env)?;
                Ok(ops::unary(*op, &value))
            }
            ExprKind::Update { op, prefix, target } => {
                let place = self.resolve_place(target, env)?;
                let old = self.read_place(&place, env)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.write_place(&place, Value::Number(new), env)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            ExprKind::Binary { op, left, right } => {
                let lhs = self.eval_expr(left, env)?;
                match op {
                    BinaryOp::And if !lhs.truthy() => Ok(lhs),
                    BinaryOp::Or if lhs.truthy() => Ok(lhs),
                    BinaryOp::Nullish if !lhs.is_nullish() => Ok(lhs),
                    BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => {
                        self.eval_expr(right, env)
                    }
                    _ => {
                        let rhs = self.eval_expr(right, env)?;
                        Ok(ops::binary(*op, &lhs, &rhs))
                    }
                }
            }
            ExprKind::Assign { op, target, value } => {
                let place = self.resolve_place(target, env)?;
                let value = match op.binary() {
                    None => self.eval_expr(value, env)?,
                    Some(binary) => {
                        let current = self.read_place(&place, env)?;
                        let rhs = self.eval_expr(value, env)?;
                        ops::binary(binary, &current, &rhs)
                    }
                };
                self.write_place(&place, value.clone(), env)?;
                Ok(value)
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expr(test, env)?.truthy() {
                    self.eval_expr(consequent, env)
                } else {
                    self.eval_expr(alternate, env)
                }
            }
            ExprKind::Member { .. } | ExprKind::Call { .. } => {
                Ok(self.eval_chain(expr, env)?.unwrap_or(Value::Undefined))
            }
            ExprKind::New { callee, args } => {
                let constructor = self.eval_expr(callee, env)?;
                let args = self.eval_args(args, env)?;
                if constructor.as_function().is_none() {
                    return Err(RuntimeError::Type(format!(
                        "{} is not a constructor",
                        constructor.type_name()
                    )));
                }
                self.call_value(&constructor, &args)
            }
        }
    }

    pub fn eval_args(&mut self, args: &[Expr], env: &Env) -> RuntimeResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg, env)).collect()
    }

    // 成员链求值；None 表示可选链短路
    fn eval_chain(&mut self, expr: &Expr, env: &Env) -> RuntimeResult<Option<Value>> {
        match &expr.kind {
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.eval_chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, env)?;
                self.get_property(&target, &key).map(Some)
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => {
                if let ExprKind::Member {
                    object,
                    property,
                    optional: member_optional,
                } = &callee.kind
                {
                    let Some(target) = self.eval_chain(object, env)? else {
                        return Ok(None);
                    };
                    if *member_optional && target.is_nullish() {
                        return Ok(None);
                    }
                    let key = self.member_key(property, env)?;
                    if *optional && self.get_property(&target, &key)?.is_nullish() {
                        return Ok(None);
                    }
                    let args = self.eval_args(args, env)?;
                    return self.call_method(&target, &key, &args).map(Some);
                }

                let Some(func) = self.eval_chain(callee, env)? else {
                    return Ok(None);
                };
                if *optional && func.is_nullish() {
                    return Ok(None);
                }
                let args = self.eval_args(args, env)?;
                self.call_value(&func, &args).map(Some)
            }
            _ => self.eval_expr(expr, env).map(Some),
        }
    }

    fn member_key(&mut self, property: &MemberProperty, env: &Env) -> RuntimeResult<String> {
        match property {
            MemberProperty::Named(name) => Ok(name.clone()),
            MemberProperty::Computed(key) => Ok(property_key(&self.eval_expr(key, env)?)),
        }
    }

    /// 读取属性: 数组/字符串的 length 与下标，对象字段
    pub fn get_property(&mut self, target: &Value, key: &str) -> RuntimeResult<Value> {
        match target {
            Value::Undefined | Value::Null => Err(RuntimeError::Type(format!(
                "cannot read properties of {} (reading '{}')",
                target, key
            ))),
            Value::Array(items) => {
                let items = items.borrow();
                if key == "length" {
                    return Ok(Value::Number(items.len() as f64));
                }
                Ok(index_of_key(key)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or(Value::Undefined))
            }
            Value::Str(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                Ok(index_of_key(key)
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::string(c.to_string()))
                    .unwrap_or(Value::Undefined))
            }
            Value::Object(map) => Ok(map.borrow().get(key).cloned().unwrap_or(Value::Undefined)),
            Value::Function(func) if key == "name" => Ok(Value::string(func.name())),
            _ => Ok(Value::Undefined),
        }
    }

    pub fn set_property(&mut self, target: &Value, key: &str, value: Value) -> RuntimeResult<()> {
        match target {
            Value::Object(map) => {
                map.borrow_mut().insert(key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    let len = value.to_number();
                    if len < 0.0 || len.fract() != 0.0 || len > MAX_ARRAY_LENGTH as f64 {
                        return Err(RuntimeError::Type("invalid array length".to_string()));
                    }
                    items.resize(len as usize, Value::Undefined);
                    return Ok(());
                }
                let Some(index) = index_of_key(key) else {
                    return Err(RuntimeError::Type(format!(
                        "cannot set property '{}' of an array",
                        key
                    )));
                };
                if index >= MAX_ARRAY_LENGTH {
                    return Err(RuntimeError::Type(format!("array index {} out of range", index)));
                }
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            other => Err(RuntimeError::Type(format!(
                "cannot set property '{}' of {}",
                key,
                other.type_name()
            ))),
        }
    }

    /// 方法调用: obj.key(args)
    pub fn call_method(&mut self, target: &Value, key: &str, args: &[Value]) -> RuntimeResult<Value> {
        match target {
            Value::Array(_) | Value::Str(_) | Value::Date(_) | Value::Number(_) => {
                builtins::call_method(self, target, key, args)
            }
            _ => {
                let method = self.get_property(target, key)?;
                if method.as_function().is_none() {
                    return Err(RuntimeError::Type(format!("{}.{} is not a function", target.type_name(), key)));
                }
                self.call_value(&method, args)
            }
        }
    }

    fn resolve_place(&mut self, target: &Expr, env: &Env) -> RuntimeResult<Place> {
        match &target.kind {
            ExprKind::Ident(name) => Ok(Place::Var(name.clone())),
            ExprKind::Member {
                object, property, ..
            } => {
                let object = self.eval_expr(object, env)?;
                let key = self.member_key(property, env)?;
                Ok(Place::Property(object, key))
            }
            _ => Err(RuntimeError::Type("invalid assignment target".to_string())),
        }
    }

    fn read_place(&mut self, place: &Place, env: &Env) -> RuntimeResult<Value> {
        match place {
            Place::Var(name) => env.get(name),
            Place::Property(object, key) => self.get_property(object, key),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value, env: &Env) -> RuntimeResult<()> {
        match place {
            Place::Var(name) => env.assign(name, value),
            Place::Property(object, key) => self.set_property(object, key, value),
        }
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::string(s),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
        Literal::Undefined => Value::Undefined,
    }
}

/// 计算属性名的键文本
pub fn property_key(value: &Value) -> String {
    value.to_string()
}

fn index_of_key(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_syntax::parse_program;

    fn run(source: &str) -> RuntimeResult<Value> {
        let program = parse_program(source).unwrap();
        Interpreter::new().run_program(&program)
    }

    #[test]
    fn test_optional_chain_short_circuits() {
        assert_eq!(run("let a = null; a?.b.c;").unwrap(), Value::Undefined);
        assert_eq!(run("let f; f?.(1);").unwrap(), Value::Undefined);
        assert!(run("let a = null; a.b;").is_err());
    }

    #[test]
    fn test_member_assignment_and_update() {
        let source = r#"
            const o = { n: 1, list: [] };
            o.n += 4;
            o["k"] = o.n++;
            o.list[2] = "x";
            [o.n, o.k, o.list.length];
        "#;
        assert_eq!(
            run(source).unwrap(),
            Value::array(vec![6.0.into(), 5.0.into(), 3.0.into()])
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(run("0 || \"x\";").unwrap(), Value::string("x"));
        assert_eq!(run("null ?? 0;").unwrap(), Value::Number(0.0));
        assert_eq!(run("\"\" && f();").unwrap(), Value::string(""));
    }

    #[test]
    fn test_typeof_undeclared() {
        assert_eq!(run("typeof nothing;").unwrap(), Value::string("undefined"));
        assert!(matches!(
            run("nothing;").unwrap_err(),
            RuntimeError::Reference { .. }
        ));
    }

    #[test]
    fn test_calling_non_function() {
        let err = run("const o = {}; o.missing();").unwrap_err();
        assert!(matches!(err, RuntimeError::Type(_)));
    }

    #[test]
    fn test_computed_object_keys() {
        assert_eq!(
            run("const k = \"a\"; const o = { [k + 1]: 2 }; o.a1;").unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn test_huge_array_length_is_rejected() {
        for source in [
            "const a = []; a.length = 1e12;",
            "const a = []; a[1e9] = 1;",
            "const a = [1]; a.length = -1;",
        ] {
            assert!(matches!(run(source).unwrap_err(), RuntimeError::Type(_)));
        }
        assert_eq!(
            run("const a = [1]; a.length = 3; a[4] = 0; a.length;").unwrap(),
            Value::Number(5.0)
        );
    }
}
