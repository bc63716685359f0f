use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use scribe_core::ast::{ColumnTypeName, Literal};

use crate::errors::ExecutionError;

/// A column's declared type. Schema is closed over these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl From<ColumnTypeName> for ColumnType {
    fn from(name: ColumnTypeName) -> Self {
        match name {
            ColumnTypeName::Integer => ColumnType::Integer,
            ColumnTypeName::Float => ColumnType::Float,
            ColumnTypeName::Text => ColumnType::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// A stored datum. Equality and ordering are only meaningful between
/// values of the same tag; comparing across tags is simply unequal /
/// unordered, never a panic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Null => "null",
        }
    }

    fn matches_column_type(&self, ty: ColumnType) -> bool {
        match (self, ty) {
            (Value::Null, _) => true,
            (Value::Integer(_), ColumnType::Integer) => true,
            (Value::Float(_), ColumnType::Float) => true,
            (Value::Text(_), ColumnType::Text) => true,
            _ => false,
        }
    }
}

// Float NaN breaks strict reflexivity, but this dialect never produces
// NaN from its own literals/coercions, so treating Value as Eq/Hash by
// bit pattern is safe in practice and lets index keys live in a HashMap.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Null => {}
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// Coerce a literal parsed from source text into the type declared for
/// `column` in the schema. Null is always preserved. Float -> integer
/// truncates; text -> integer/float parses and fails on malformed input.
pub fn coerce(literal: &Literal, column: &str, target: ColumnType) -> Result<Value, ExecutionError> {
    let value = match literal {
        Literal::Null => return Ok(Value::Null),
        Literal::Integer(i) => match target {
            ColumnType::Integer => Value::Integer(*i),
            ColumnType::Float => Value::Float(*i as f64),
            ColumnType::Text => Value::Text(i.to_string()),
        },
        Literal::Float(x) => match target {
            ColumnType::Integer => Value::Integer(*x as i64),
            ColumnType::Float => Value::Float(*x),
            ColumnType::Text => Value::Text(x.to_string()),
        },
        Literal::Text(s) => match target {
            ColumnType::Integer => {
                Value::Integer(s.trim().parse().map_err(|_| ExecutionError::TypeMismatch {
                    column: column.to_string(),
                    expected: ColumnType::Integer,
                    found: "text".to_string(),
                })?)
            }
            ColumnType::Float => {
                Value::Float(s.trim().parse().map_err(|_| ExecutionError::TypeMismatch {
                    column: column.to_string(),
                    expected: ColumnType::Float,
                    found: "text".to_string(),
                })?)
            }
            ColumnType::Text => Value::Text(s.clone()),
        },
    };
    Ok(value)
}

/// Check (without coercing) that a stored value matches a column's type.
pub fn check_type(column: &str, value: &Value, target: ColumnType) -> Result<(), ExecutionError> {
    if value.matches_column_type(target) {
        Ok(())
    } else {
        Err(ExecutionError::TypeMismatch {
            column: column.to_string(),
            expected: target,
            found: value.type_name().to_string(),
        })
    }
}
