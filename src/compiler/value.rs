use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Array key after PHP's key normalization: integer-like strings become ints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    /// Reference: $PHP_SRC_PATH/Zend/zend_hash.h - ZEND_HANDLE_NUMERIC_STR
    pub fn from_string(s: &str) -> Self {
        if is_canonical_int(s)
            && let Ok(i) = s.parse::<i64>()
        {
            return ArrayKey::Int(i);
        }
        ArrayKey::Str(s.to_string())
    }
}

fn is_canonical_int(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && s != "-0"
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{i}"),
            ArrayKey::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for ArrayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArrayKey::Int(i) => serializer.serialize_i64(*i),
            ArrayKey::Str(s) => serializer.serialize_str(s),
        }
    }
}

/// Ordered PHP array.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ArrayValue {
    pub map: IndexMap<ArrayKey, Value>,
    /// Next auto-increment index; `None` until an integer key has been used.
    #[serde(skip)]
    next_free: Option<i64>,
}

impl ArrayValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_hash.c - _zend_hash_index_add_or_update_i
    pub fn insert(&mut self, key: ArrayKey, value: Value) {
        if let ArrayKey::Int(i) = key {
            self.next_free = Some(match self.next_free {
                Some(next) if next > i => next,
                _ => i.saturating_add(1),
            });
        }
        self.map.insert(key, value);
    }

    pub fn push(&mut self, value: Value) {
        let key = self.next_free.unwrap_or(0);
        self.insert(ArrayKey::Int(key), value);
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.map.iter()
    }
}

impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl FromIterator<Value> for ArrayValue {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let mut array = ArrayValue::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}

/// A value produced by compiling a constant expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(ArrayValue),
    /// A case of an enum, standing in for the case object.
    EnumCase { class: String, case: String },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::EnumCase { .. } => "object",
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_is_true
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s == "0"),
            Value::Array(array) => !array.is_empty(),
            Value::EnumCase { .. } => true,
        }
    }

    /// String conversion as done by `.` and string interpolation.
    /// `None` for values that cannot be converted (enum cases).
    pub fn to_php_string(&self) -> Option<String> {
        Some(match self {
            Value::Null => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.clone(),
            Value::Array(_) => "Array".to_string(),
            Value::EnumCase { .. } => return None,
        })
    }

    /// Numeric view used by arithmetic. `None` for arrays, enum cases and
    /// strings that are not numeric at all.
    pub fn to_number(&self) -> Option<Number> {
        match self {
            Value::Null => Some(Number::Int(0)),
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::String(s) => parse_numeric_prefix(s).map(|(number, _)| number),
            Value::Array(_) | Value::EnumCase { .. } => None,
        }
    }

    /// Key conversion for `[$key => ...]` and `$array[$key]`.
    pub fn to_array_key(&self) -> Option<ArrayKey> {
        match self {
            Value::Null => Some(ArrayKey::Str(String::new())),
            Value::Bool(b) => Some(ArrayKey::Int(i64::from(*b))),
            Value::Int(i) => Some(ArrayKey::Int(*i)),
            Value::Float(f) if f.is_finite() => Some(ArrayKey::Int(*f as i64)),
            Value::Float(_) => None,
            Value::String(s) => Some(ArrayKey::from_string(s)),
            Value::Array(_) | Value::EnumCase { .. } => None,
        }
    }

    /// `===`
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            _ => self == other,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::EnumCase { .. }, _) | (_, Value::EnumCase { .. }) => self == other,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.get(key).is_some_and(|other| value.loose_equals(other))
                    })
            }
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// PHP 8 comparison (`<=>`). `None` when the operands are uncomparable.
    ///
    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_compare
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::EnumCase { .. }, _) | (_, Value::EnumCase { .. }) => {
                (self == other).then_some(Ordering::Equal)
            }
            (Value::String(a), Value::String(b)) => {
                match (parse_numeric(a), parse_numeric(b)) {
                    (Some(x), Some(y)) => x.compare(y),
                    _ => Some(a.as_bytes().cmp(b.as_bytes())),
                }
            }
            (Value::Null, Value::String(s)) => Some("".cmp(s.as_str())),
            (Value::String(s), Value::Null) => Some(s.as_str().cmp("")),
            (Value::Bool(_), _) | (_, Value::Bool(_)) | (Value::Null, _) | (_, Value::Null) => {
                Some(self.to_bool().cmp(&other.to_bool()))
            }
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return Some(a.len().cmp(&b.len()));
                }
                for (key, value) in a.iter() {
                    let ordering = value.compare(b.get(key)?)?;
                    if ordering != Ordering::Equal {
                        return Some(ordering);
                    }
                }
                Some(Ordering::Equal)
            }
            (Value::Array(_), _) => Some(Ordering::Greater),
            (_, Value::Array(_)) => Some(Ordering::Less),
            (Value::String(s), number) | (number, Value::String(s)) => {
                let swapped = matches!(other, Value::String(_));
                let ordering = match (parse_numeric(s), number.to_number()) {
                    (Some(x), Some(y)) => x.compare(y)?,
                    _ => {
                        let text = number.to_php_string()?;
                        s.as_bytes().cmp(text.as_bytes())
                    }
                };
                Some(if swapped { ordering.reverse() } else { ordering })
            }
            (a, b) => a.to_number()?.compare(b.to_number()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, (key, value)) in array.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match key {
                        ArrayKey::Int(k) => write!(f, "{k} => {value}")?,
                        ArrayKey::Str(k) => write!(f, "'{k}' => {value}")?,
                    }
                }
                f.write_str("]")
            }
            Value::EnumCase { class, case } => write!(f, "\\{class}::{case}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }

    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

/// A fully numeric string, allowing surrounding whitespace.
pub fn parse_numeric(s: &str) -> Option<Number> {
    match parse_numeric_prefix(s)? {
        (number, true) => Some(number),
        _ => None,
    }
}

/// Parses the leading numeric part of `s`. The flag tells whether the whole
/// string (ignoring trailing whitespace) was consumed.
///
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - _is_numeric_string_ex
pub fn parse_numeric_prefix(s: &str) -> Option<(Number, bool)> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while start < bytes.len() && matches!(bytes[start], b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c') {
        start += 1;
    }
    let mut end = start;
    if end < bytes.len() && matches!(bytes[end], b'+' | b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut int_digits = end - digits_start;
    let mut is_float = false;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if int_digits > 0 || frac_end > end + 1 {
            int_digits += frac_end - end - 1;
            is_float = true;
            end = frac_end;
        }
    }
    if int_digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            is_float = true;
            end = exp_end;
        }
    }
    let text = &s[start..end];
    let whole = s[end..].trim_end_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']).is_empty();
    let number = if is_float {
        Number::Float(text.parse().ok()?)
    } else {
        match text.parse::<i64>() {
            Ok(i) => Number::Int(i),
            Err(_) => Number::Float(text.parse().ok()?),
        }
    };
    Some((number, whole))
}

/// Formats a float the way PHP's string conversion does (`precision=14`).
///
/// Reference: $PHP_SRC_PATH/main/snprintf.c - php_gcvt
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    const PRECISION: i32 = 14;
    let formatted = format!("{:.*e}", (PRECISION - 1) as usize, value.abs());
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }
    let sign = if value < 0.0 { "-" } else { "" };

    if exponent < -4 || exponent >= PRECISION {
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{first}.{rest}E{exp_sign}{}", exponent.abs());
    }

    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }

    let int_len = exponent as usize + 1;
    if digits.len() <= int_len {
        let zeros = "0".repeat(int_len - digits.len());
        format!("{sign}{digits}{zeros}")
    } else {
        let (int_part, frac_part) = digits.split_at(int_len);
        format!("{sign}{int_part}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(0.1 + 0.2), "0.3");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1e14), "1.0E+14");
        assert_eq!(format_float(1e13), "10000000000000");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1.0E-5");
        assert_eq!(format_float(f64::INFINITY), "INF");
        assert_eq!(format_float(1.5e-7), "1.5E-7");
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(parse_numeric(" 12 "), Some(Number::Int(12)));
        assert_eq!(parse_numeric("1.5e3"), Some(Number::Float(1500.0)));
        assert_eq!(parse_numeric("12abc"), None);
        assert_eq!(parse_numeric_prefix("12abc"), Some((Number::Int(12), false)));
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("."), None);
    }

    #[test]
    fn test_array_keys_and_next_index() {
        assert_eq!(ArrayKey::from_string("10"), ArrayKey::Int(10));
        assert_eq!(ArrayKey::from_string("010"), ArrayKey::Str("010".into()));
        assert_eq!(ArrayKey::from_string("-0"), ArrayKey::Str("-0".into()));

        let mut array = ArrayValue::new();
        array.insert(ArrayKey::Int(5), Value::Int(1));
        array.push(Value::Int(2));
        array.insert(ArrayKey::Str("x".into()), Value::Int(3));
        array.push(Value::Int(4));
        let keys: Vec<_> = array.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                ArrayKey::Int(5),
                ArrayKey::Int(6),
                ArrayKey::Str("x".into()),
                ArrayKey::Int(7)
            ]
        );

        let mut negative = ArrayValue::new();
        negative.insert(ArrayKey::Int(-5), Value::Null);
        negative.push(Value::Null);
        assert!(negative.get(&ArrayKey::Int(-4)).is_some());
    }

    #[test]
    fn test_comparisons() {
        assert!(Value::Int(1).loose_equals(&Value::String("1".into())));
        assert!(Value::String("abc".into()).loose_equals(&Value::String("abc".into())));
        assert!(!Value::Int(0).loose_equals(&Value::String("a".into())));
        assert!(Value::Null.loose_equals(&Value::Bool(false)));
        assert_eq!(
            Value::Float(1.5).compare(&Value::Int(2)),
            Some(Ordering::Less)
        );
        assert!(!Value::Int(1).identical(&Value::Float(1.0)));
    }
}
