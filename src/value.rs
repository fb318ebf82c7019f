//! Runtime values.
//!
//! A `Value` is an integer, a string, a boolean or empty. Operators never
//! coerce between kinds: a mismatched pair of operands is a `ValueError`.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Str,
    Bool,
    Empty,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "integer"),
            ValueType::Str => write!(f, "string"),
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Type mismatch on operands of {op}: {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: ValueType,
        right: ValueType,
    },
    #[error("Divide by zero")]
    DivideByZero,
    #[error("Integer overflow on operands of {0}")]
    Overflow(&'static str),
    #[error("Cannot multiply a string by a negative integer")]
    NegativeRepeat,
    #[error("String repetition too large: {0} times")]
    RepeatTooLarge(i64),
}

/// Longest string a repetition may build, in bytes.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
    #[default]
    Empty,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Str(_) => ValueType::Str,
            Value::Bool(_) => ValueType::Bool,
            Value::Empty => ValueType::Empty,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn mismatch(&self, op: &'static str, other: &Value) -> ValueError {
        ValueError::TypeMismatch {
            op,
            left: self.value_type(),
            right: other.value_type(),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or(ValueError::Overflow("+")),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            _ => Err(self.mismatch("+", other)),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_sub(*b)
                .map(Value::Int)
                .ok_or(ValueError::Overflow("-")),
            _ => Err(self.mismatch("-", other)),
        }
    }

    /// Integer product, or a string repeated an integer number of times.
    pub fn mul(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_mul(*b)
                .map(Value::Int)
                .ok_or(ValueError::Overflow("*")),
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                let times = usize::try_from(*n).map_err(|_| ValueError::NegativeRepeat)?;
                match s.len().checked_mul(times) {
                    Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::Str(s.repeat(times))),
                    _ => Err(ValueError::RepeatTooLarge(*n)),
                }
            }
            _ => Err(self.mismatch("*", other)),
        }
    }

    /// Integer division, truncating toward zero.
    pub fn div(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Int(_), Value::Int(0)) => Err(ValueError::DivideByZero),
            (Value::Int(a), Value::Int(b)) => a
                .checked_div(*b)
                .map(Value::Int)
                .ok_or(ValueError::Overflow("/")),
            _ => Err(self.mismatch("/", other)),
        }
    }

    fn same_kind_equal(&self, op: &'static str, other: &Value) -> Result<bool, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            _ => Err(self.mismatch(op, other)),
        }
    }

    pub fn equals(&self, other: &Value) -> Result<Value, ValueError> {
        self.same_kind_equal("==", other).map(Value::Bool)
    }

    pub fn not_equals(&self, other: &Value) -> Result<Value, ValueError> {
        self.same_kind_equal("!=", other).map(|eq| Value::Bool(!eq))
    }

    fn ordering(&self, op: &'static str, other: &Value) -> Result<std::cmp::Ordering, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            _ => Err(self.mismatch(op, other)),
        }
    }

    pub fn less(&self, other: &Value) -> Result<Value, ValueError> {
        self.ordering("<", other).map(|o| Value::Bool(o.is_lt()))
    }

    pub fn less_equal(&self, other: &Value) -> Result<Value, ValueError> {
        self.ordering("<=", other).map(|o| Value::Bool(o.is_le()))
    }

    pub fn greater(&self, other: &Value) -> Result<Value, ValueError> {
        self.ordering(">", other).map(|o| Value::Bool(o.is_gt()))
    }

    pub fn greater_equal(&self, other: &Value) -> Result<Value, ValueError> {
        self.ordering(">=", other).map(|o| Value::Bool(o.is_ge()))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Empty => Ok(()),
        }
    }
}
