//! 运算符语义

use crate::value::Value;
use stagecraft_syntax::ast::{BinaryOp, UnaryOp};
use std::cmp::Ordering;

pub fn unary(op: UnaryOp, value: &Value) -> Value {
    match op {
        UnaryOp::Neg => Value::Number(-value.to_number()),
        UnaryOp::Plus => Value::Number(value.to_number()),
        UnaryOp::Not => Value::Bool(!value.truthy()),
        UnaryOp::Typeof => Value::string(value.type_name()),
    }
}

// 对象参与 + 时先转成字符串
fn is_stringy(value: &Value) -> bool {
    matches!(
        value,
        Value::Str(_) | Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Raw(_) | Value::Function(_)
    )
}

pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if is_stringy(lhs) || is_stringy(rhs) {
                Value::string(format!("{}{}", lhs, rhs))
            } else {
                Value::Number(lhs.to_number() + rhs.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Mod => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::Pow => Value::Number(lhs.to_number().powf(rhs.to_number())),
        BinaryOp::Eq => Value::Bool(lhs.loose_equals(rhs)),
        BinaryOp::NotEq => Value::Bool(!lhs.loose_equals(rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs.strict_equals(rhs)),
        BinaryOp::StrictNotEq => Value::Bool(!lhs.strict_equals(rhs)),
        BinaryOp::Lt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Greater)),
        BinaryOp::Leq => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Geq => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::And => {
            if lhs.truthy() {
                rhs.clone()
            } else {
                lhs.clone()
            }
        }
        BinaryOp::Or => {
            if lhs.truthy() {
                lhs.clone()
            } else {
                rhs.clone()
            }
        }
        BinaryOp::Nullish => {
            if lhs.is_nullish() {
                rhs.clone()
            } else {
                lhs.clone()
            }
        }
    }
}

// 两边都是字符串时按字典序，否则按数字 (NaN 不可比较)
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition_coerces_to_string() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::string("a"), &Value::Number(1.0)),
            Value::string("a1")
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::Number(1.0), &Value::Bool(true)),
            Value::Number(2.0)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            binary(BinaryOp::Lt, &Value::string("a"), &Value::string("b")),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOp::Geq, &Value::Number(f64::NAN), &Value::Number(1.0)),
            Value::Bool(false)
        );
        assert_eq!(
            binary(BinaryOp::Leq, &Value::string("2"), &Value::Number(2.0)),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Not, &Value::Null), Value::Bool(true));
        assert_eq!(unary(UnaryOp::Typeof, &Value::array(vec![])), Value::string("object"));
        assert_eq!(unary(UnaryOp::Neg, &Value::string("3")), Value::Number(-3.0));
    }
}
