use std::fmt;

use serde::Serialize;

/// The declared type of a control variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    Float,
    Bool,
}

impl ValueKind {
    /// Convert `value` to this kind, if the kinds are compatible.
    ///
    /// Integers widen to floats; nothing else converts.
    pub fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (ValueKind::Int, Value::Int(v)) => Some(Value::Int(v)),
            (ValueKind::Float, Value::Float(v)) => Some(Value::Float(v)),
            (ValueKind::Float, Value::Int(v)) => Some(Value::Float(f64::from(v))),
            (ValueKind::Bool, Value::Bool(v)) => Some(Value::Bool(v)),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed control value.
///
/// Integers are 32-bit because that is their wire width. Floats are carried
/// at `f64` and narrowed to `f32` only when encoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i32),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    /// Parse operator input: integer first, then float, then boolean.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(v) = input.parse::<i32>() {
            return Some(Value::Int(v));
        }
        if let Ok(v) = input.parse::<f64>() {
            return Some(Value::Float(v));
        }
        input.parse::<bool>().ok().map(Value::Bool)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_widens_to_float() {
        assert_eq!(ValueKind::Float.coerce(Value::Int(3)), Some(Value::Float(3.0)));
    }

    #[test]
    fn float_never_narrows_to_int() {
        assert_eq!(ValueKind::Int.coerce(Value::Float(3.0)), None);
    }

    #[test]
    fn bools_never_convert() {
        assert_eq!(ValueKind::Bool.coerce(Value::Int(1)), None);
        assert_eq!(ValueKind::Int.coerce(Value::Bool(true)), None);
        assert_eq!(ValueKind::Float.coerce(Value::Bool(false)), None);
    }

    #[test]
    fn parse_prefers_int_then_float_then_bool() {
        assert_eq!(Value::parse("42"), Some(Value::Int(42)));
        assert_eq!(Value::parse("-1.5"), Some(Value::Float(-1.5)));
        assert_eq!(Value::parse("true"), Some(Value::Bool(true)));
        assert_eq!(Value::parse("maybe"), None);
    }

    #[test]
    fn display_keeps_float_marker() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Int(3).to_string(), "3");
    }
}
