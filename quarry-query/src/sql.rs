//! SQL generation utilities: dialects and the statement buffer.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use crate::value::Value;

/// How a target SQL engine renders parameter placeholders.
///
/// Everything else in the compiler is dialect-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL uses $1, $2, etc.
    #[serde(alias = "postgres")]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    #[default]
    #[serde(alias = "sqlite3")]
    SQLite,
}

impl Dialect {
    /// Whether placeholders carry a running 1-based index.
    pub fn is_numbered(&self) -> bool {
        matches!(self, Self::PostgreSQL)
    }

    /// Get the parameter placeholder for the `index`-th value (1-based).
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }

    /// Write the placeholder straight into `buf`.
    #[inline]
    pub fn write_placeholder(&self, buf: &mut String, index: usize) {
        match self {
            Self::PostgreSQL => {
                let _ = write!(buf, "${}", index);
            }
            Self::MySQL | Self::SQLite => buf.push('?'),
        }
    }

    /// Lowercase dialect name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulates SQL text and the values bound to its placeholders.
///
/// Placeholder numbering is derived from the number of values collected so
/// far, so the running index always matches the order of `params`.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlBuilder {
    /// Create a new SQL builder.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(64),
            params: Vec::new(),
        }
    }

    /// The dialect placeholders are rendered for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self
    }

    /// Push a placeholder and record its value.
    pub fn push_param(&mut self, value: impl Into<Value>) -> &mut Self {
        self.params.push(value.into());
        let index = self.params.len();
        self.dialect.write_placeholder(&mut self.sql, index);
        self
    }

    /// Push a comma separated placeholder list, one per value.
    pub fn push_params<'v>(&mut self, values: impl IntoIterator<Item = &'v Value>) -> &mut Self {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_param(value.clone());
        }
        self
    }

    /// Build the final SQL string and parameters.
    pub fn build(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Get the current SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the current parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Get the next parameter index.
    pub fn next_param_index(&self) -> usize {
        self.params.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_placeholder() {
        assert_eq!(Dialect::PostgreSQL.placeholder(1), "$1");
        assert_eq!(Dialect::PostgreSQL.placeholder(5), "$5");
        assert_eq!(Dialect::MySQL.placeholder(1), "?");
        assert_eq!(Dialect::SQLite.placeholder(3), "?");
    }

    #[test]
    fn test_sql_builder_numbering() {
        let mut builder = SqlBuilder::new(Dialect::PostgreSQL);
        builder
            .push("SELECT * FROM users WHERE id = ")
            .push_param(42)
            .push(" AND role IN (")
            .push_params(&[Value::from("a"), Value::from("b")])
            .push(")");

        let (sql, params) = builder.build();
        assert_eq!(sql, "SELECT * FROM users WHERE id = $1 AND role IN ($2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_dialect_deserialize_aliases() {
        let d: Dialect = serde_json::from_str("\"postgres\"").unwrap();
        assert_eq!(d, Dialect::PostgreSQL);
        let d: Dialect = serde_json::from_str("\"sqlite3\"").unwrap();
        assert_eq!(d, Dialect::SQLite);
    }
}
