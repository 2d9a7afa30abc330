//! Operator semantics for constant expressions.
//!
//! Errors are returned as plain messages; the compiler attaches the location.

use super::value::{ArrayValue, Number, Value};
use crate::parser::ast::{BinaryOp, UnaryOp};
use std::cmp::Ordering;

pub type OpResult = std::result::Result<Value, String>;

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Concat => ".",
        BinaryOp::EqEq => "==",
        BinaryOp::EqEqEq => "===",
        BinaryOp::NotEq => "!=",
        BinaryOp::NotEqEq => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Coalesce => "??",
        BinaryOp::Spaceship => "<=>",
        BinaryOp::Pow => "**",
        BinaryOp::ShiftLeft => "<<",
        BinaryOp::ShiftRight => ">>",
        BinaryOp::LogicalXor => "xor",
    }
}

fn unsupported(left: &Value, op: BinaryOp, right: &Value) -> String {
    format!(
        "Unsupported operand types: {} {} {}",
        left.type_name(),
        op_symbol(op),
        right.type_name()
    )
}

fn numbers(left: &Value, op: BinaryOp, right: &Value) -> Result<(Number, Number), String> {
    match (left.to_number(), right.to_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(left, op, right)),
    }
}

fn to_int(value: &Value, op: BinaryOp, other: &Value) -> Result<i64, String> {
    match value.to_number() {
        Some(Number::Int(i)) => Ok(i),
        Some(Number::Float(f)) if f.is_finite() => Ok(f as i64),
        Some(Number::Float(_)) => Err(format!(
            "Non-finite float cannot be used with operator {}",
            op_symbol(op)
        )),
        None => Err(unsupported(value, op, other)),
    }
}

fn arithmetic(
    a: Number,
    b: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => match int_op(x, y) {
            Some(result) => Value::Int(result),
            None => Value::Float(float_op(x as f64, y as f64)),
        },
        _ => Value::Float(float_op(a.to_f64(), b.to_f64())),
    }
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - add_function_array
fn array_union(left: &ArrayValue, right: &ArrayValue) -> Value {
    let mut result = left.clone();
    for (key, value) in right.iter() {
        if result.get(key).is_none() {
            result.insert(key.clone(), value.clone());
        }
    }
    Value::Array(result)
}

fn bytewise(left: &str, right: &str, op: BinaryOp) -> Value {
    let (a, b) = (left.as_bytes(), right.as_bytes());
    let bytes: Vec<u8> = match op {
        BinaryOp::BitOr => {
            let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
            long.iter()
                .enumerate()
                .map(|(i, byte)| byte | short.get(i).copied().unwrap_or(0))
                .collect()
        }
        BinaryOp::BitAnd => a.iter().zip(b).map(|(x, y)| x & y).collect(),
        _ => a.iter().zip(b).map(|(x, y)| x ^ y).collect(),
    };
    Value::String(String::from_utf8_lossy(&bytes).into_owned())
}

fn pow(base: Number, exponent: Number) -> Value {
    if let (Number::Int(b), Number::Int(e)) = (base, exponent)
        && e >= 0
    {
        if let Some(result) = u32::try_from(e).ok().and_then(|e| b.checked_pow(e)) {
            return Value::Int(result);
        }
    }
    Value::Float(base.to_f64().powf(exponent.to_f64()))
}

fn shift(value: i64, by: i64, left: bool) -> Result<Value, String> {
    if by < 0 {
        return Err("Bit shift by negative number".to_string());
    }
    Ok(Value::Int(if by >= 64 {
        if left || value >= 0 { 0 } else { -1 }
    } else if left {
        value.wrapping_shl(by as u32)
    } else {
        value >> by
    }))
}

/// Applies a non-short-circuiting binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> OpResult {
    match op {
        BinaryOp::Plus => match (left, right) {
            (Value::Array(a), Value::Array(b)) => Ok(array_union(a, b)),
            _ => {
                let (a, b) = numbers(left, op, right)?;
                Ok(arithmetic(a, b, i64::checked_add, |x, y| x + y))
            }
        },
        BinaryOp::Minus => {
            let (a, b) = numbers(left, op, right)?;
            Ok(arithmetic(a, b, i64::checked_sub, |x, y| x - y))
        }
        BinaryOp::Mul => {
            let (a, b) = numbers(left, op, right)?;
            Ok(arithmetic(a, b, i64::checked_mul, |x, y| x * y))
        }
        BinaryOp::Div => {
            let (a, b) = numbers(left, op, right)?;
            if b.to_f64() == 0.0 {
                return Err("Division by zero".to_string());
            }
            Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) if x.checked_rem(y) == Some(0) => {
                    x.checked_div(y).map_or(Value::Float(x as f64 / y as f64), Value::Int)
                }
                _ => Value::Float(a.to_f64() / b.to_f64()),
            })
        }
        BinaryOp::Mod => {
            let (a, b) = (to_int(left, op, right)?, to_int(right, op, left)?);
            if b == 0 {
                return Err("Modulo by zero".to_string());
            }
            Ok(Value::Int(a.wrapping_rem(b)))
        }
        BinaryOp::Pow => {
            let (a, b) = numbers(left, op, right)?;
            Ok(pow(a, b))
        }
        BinaryOp::Concat => match (left.to_php_string(), right.to_php_string()) {
            (Some(a), Some(b)) => Ok(Value::String(a + &b)),
            _ => Err("Object of enum class could not be converted to string".to_string()),
        },
        BinaryOp::EqEq => Ok(Value::Bool(left.loose_equals(right))),
        BinaryOp::NotEq => Ok(Value::Bool(!left.loose_equals(right))),
        BinaryOp::EqEqEq => Ok(Value::Bool(left.identical(right))),
        BinaryOp::NotEqEq => Ok(Value::Bool(!left.identical(right))),
        BinaryOp::Lt => Ok(Value::Bool(left.compare(right) == Some(Ordering::Less))),
        BinaryOp::LtEq => Ok(Value::Bool(matches!(
            left.compare(right),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Gt => Ok(Value::Bool(left.compare(right) == Some(Ordering::Greater))),
        BinaryOp::GtEq => Ok(Value::Bool(matches!(
            left.compare(right),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinaryOp::Spaceship => Ok(Value::Int(match left.compare(right) {
            Some(Ordering::Less) => -1,
            Some(Ordering::Equal) => 0,
            Some(Ordering::Greater) | None => 1,
        })),
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            if let (Value::String(a), Value::String(b)) = (left, right) {
                return Ok(bytewise(a, b, op));
            }
            let (a, b) = (to_int(left, op, right)?, to_int(right, op, left)?);
            Ok(Value::Int(match op {
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                _ => a ^ b,
            }))
        }
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            let (a, b) = (to_int(left, op, right)?, to_int(right, op, left)?);
            shift(a, b, op == BinaryOp::ShiftLeft)
        }
        BinaryOp::LogicalXor => Ok(Value::Bool(left.to_bool() ^ right.to_bool())),
        BinaryOp::And => Ok(Value::Bool(left.to_bool() && right.to_bool())),
        BinaryOp::Or => Ok(Value::Bool(left.to_bool() || right.to_bool())),
        BinaryOp::Coalesce => Ok(if matches!(left, Value::Null) {
            right.clone()
        } else {
            left.clone()
        }),
    }
}

pub fn unary(op: UnaryOp, value: &Value) -> OpResult {
    let type_error = || format!("Unsupported operand types: {}", value.type_name());
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.to_bool())),
        UnaryOp::Plus => value
            .to_number()
            .map(Number::into_value)
            .ok_or_else(type_error),
        UnaryOp::Minus => match value.to_number().ok_or_else(type_error)? {
            Number::Int(i) => Ok(i
                .checked_neg()
                .map_or(Value::Float(-(i as f64)), Value::Int)),
            Number::Float(f) => Ok(Value::Float(-f)),
        },
        UnaryOp::BitNot => match value {
            Value::Int(i) => Ok(Value::Int(!i)),
            Value::Float(f) if f.is_finite() => Ok(Value::Int(!(*f as i64))),
            Value::String(s) => {
                let bytes: Vec<u8> = s.bytes().map(|b| !b).collect();
                Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            }
            _ => Err(format!("Cannot perform bitwise not on {}", value.type_name())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::value::ArrayKey;

    #[test]
    fn test_integer_overflow_becomes_float() {
        assert_eq!(
            binary(BinaryOp::Plus, &Value::Int(i64::MAX), &Value::Int(1)),
            Ok(Value::Float(i64::MAX as f64 + 1.0))
        );
        assert_eq!(
            binary(BinaryOp::Mul, &Value::Int(6), &Value::Int(7)),
            Ok(Value::Int(42))
        );
    }

    #[test]
    fn test_division() {
        assert_eq!(binary(BinaryOp::Div, &Value::Int(6), &Value::Int(3)), Ok(Value::Int(2)));
        assert_eq!(binary(BinaryOp::Div, &Value::Int(7), &Value::Int(2)), Ok(Value::Float(3.5)));
        assert!(binary(BinaryOp::Div, &Value::Int(1), &Value::Int(0)).is_err());
        assert!(binary(BinaryOp::Mod, &Value::Int(1), &Value::Int(0)).is_err());
        assert_eq!(binary(BinaryOp::Mod, &Value::Int(-7), &Value::Int(3)), Ok(Value::Int(-1)));
    }

    #[test]
    fn test_strings_and_arrays() {
        assert_eq!(
            binary(BinaryOp::Concat, &Value::String("a".into()), &Value::Float(1.5)),
            Ok(Value::String("a1.5".into()))
        );
        assert_eq!(
            binary(BinaryOp::Plus, &Value::String("5".into()), &Value::Int(1)),
            Ok(Value::Int(6))
        );
        assert!(binary(BinaryOp::Plus, &Value::String("abc".into()), &Value::Int(1)).is_err());

        let left: ArrayValue = [Value::Int(1)].into_iter().collect();
        let right: ArrayValue = [Value::Int(9), Value::Int(2)].into_iter().collect();
        let Ok(Value::Array(union)) = binary(BinaryOp::Plus, &Value::Array(left), &Value::Array(right))
        else {
            panic!("expected array union");
        };
        assert_eq!(union.get(&ArrayKey::Int(0)), Some(&Value::Int(1)));
        assert_eq!(union.get(&ArrayKey::Int(1)), Some(&Value::Int(2)));
    }

    #[test]
    fn test_pow_and_shift() {
        assert_eq!(binary(BinaryOp::Pow, &Value::Int(2), &Value::Int(10)), Ok(Value::Int(1024)));
        assert_eq!(binary(BinaryOp::Pow, &Value::Int(2), &Value::Int(-1)), Ok(Value::Float(0.5)));
        assert_eq!(
            binary(BinaryOp::ShiftLeft, &Value::Int(1), &Value::Int(3)),
            Ok(Value::Int(8))
        );
        assert!(binary(BinaryOp::ShiftRight, &Value::Int(1), &Value::Int(-1)).is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Minus, &Value::Int(3)), Ok(Value::Int(-3)));
        assert_eq!(unary(UnaryOp::Not, &Value::String("0".into())), Ok(Value::Bool(true)));
        assert_eq!(unary(UnaryOp::BitNot, &Value::Int(0)), Ok(Value::Int(-1)));
    }
}
