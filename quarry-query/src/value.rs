//! Scalar values bound to placeholders or rendered as SQL literals.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sql::Dialect;

/// A scalar value. Values never nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Timestamp value (UTC).
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of the value, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Hashable identity used to match keys across rows. Null has none.
    pub(crate) fn key(&self) -> Option<ValueKey> {
        match self {
            Self::Null => None,
            Self::Bool(v) => Some(ValueKey::Bool(*v)),
            Self::Int(v) => Some(ValueKey::Int(*v)),
            Self::Float(v) => Some(ValueKey::Float(v.to_bits())),
            Self::String(v) => Some(ValueKey::String(v.clone())),
            Self::Timestamp(v) => Some(ValueKey::Timestamp(*v)),
        }
    }

    /// Render the value as an inline SQL literal.
    ///
    /// ```rust
    /// use quarry_query::{Dialect, Value};
    ///
    /// assert_eq!(Value::from("O'Brien").to_sql_literal(Dialect::SQLite), "'O''Brien'");
    /// assert_eq!(Value::Null.to_sql_literal(Dialect::PostgreSQL), "NULL");
    /// assert_eq!(Value::Bool(true).to_sql_literal(Dialect::MySQL), "TRUE");
    /// ```
    pub fn to_sql_literal(&self, _dialect: Dialect) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 {
                    format!("{:.1}", v)
                } else {
                    v.to_string()
                }
            }
            Self::String(v) => quote_literal(v),
            Self::Timestamp(v) => quote_literal(&v.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Right-hand side of a hash-style condition: a single value or a list.
///
/// A list becomes `IN`, a null becomes `IS NULL`, anything else `=`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value.
    Value(Value),
    /// A list of values.
    List(Vec<Value>),
}

macro_rules! operand_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Self::Value(v.into())
                }
            }
        )*
    };
}

operand_from_scalar!(bool, i32, i64, u32, f64, String, &str, DateTime<Utc>, Value);

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Self::Value(v.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(v: [T; N]) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_literals() {
        assert_eq!(Value::Int(7).to_sql_literal(Dialect::SQLite), "7");
        assert_eq!(Value::Float(2.0).to_sql_literal(Dialect::SQLite), "2.0");
        assert_eq!(Value::Float(2.5).to_sql_literal(Dialect::SQLite), "2.5");
        assert_eq!(Value::Bool(false).to_sql_literal(Dialect::PostgreSQL), "FALSE");

        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            Value::Timestamp(ts).to_sql_literal(Dialect::PostgreSQL),
            "'2024-01-02T03:04:05Z'"
        );
    }

    #[test]
    fn test_keys_ignore_null() {
        assert!(Value::Null.key().is_none());
        assert_eq!(Value::Int(1).key(), Value::Int(1).key());
        assert_ne!(Value::Int(1).key(), Value::from("1").key());
    }

    #[test]
    fn test_operand_shapes() {
        assert_eq!(Operand::from(1), Operand::Value(Value::Int(1)));
        assert_eq!(
            Operand::from(vec![1, 2]),
            Operand::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(Operand::from(None::<&str>), Operand::Value(Value::Null));
    }
}
