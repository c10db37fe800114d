//! Create operation for inserting a record.

use indexmap::IndexMap;
use tracing::debug;

use super::ModelClient;
use crate::error::QueryResult;
use crate::sql::{Dialect, SqlBuilder};
use crate::traits::Executor;
use crate::value::Value;

/// Inserts one record.
///
/// ```rust,ignore
/// let id = client
///     .model("User")?
///     .create([("email", Value::from("a@example.com")), ("active", Value::from(true))])
///     .await?;
/// ```
pub struct CreateOperation<'a, E: Executor> {
    model: &'a ModelClient<'a, E>,
    data: IndexMap<String, Value>,
}

impl<'a, E: Executor> CreateOperation<'a, E> {
    /// Create a new Create operation.
    pub fn new(model: &'a ModelClient<'a, E>) -> Self {
        Self {
            model,
            data: IndexMap::new(),
        }
    }

    /// Set column values. Later values for the same column win.
    pub fn data<K: Into<String>, V: Into<Value>>(
        mut self,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        for (column, value) in attributes {
            self.data.insert(column.into(), value.into());
        }
        self
    }

    /// Set a single column value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(column.into(), value.into());
        self
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> (String, Vec<Value>) {
        let mut builder = SqlBuilder::new(self.model.client().dialect());
        builder.push("INSERT INTO ").push(self.model.table());

        if self.data.is_empty() {
            match builder.dialect() {
                Dialect::MySQL => builder.push(" () VALUES ()"),
                Dialect::PostgreSQL | Dialect::SQLite => builder.push(" DEFAULT VALUES"),
            };
            return builder.build();
        }

        let columns: Vec<&str> = self.data.keys().map(String::as_str).collect();
        builder
            .push(" (")
            .push(columns.join(", "))
            .push(") VALUES (")
            .push_params(self.data.values())
            .push(")");
        builder.build()
    }

    /// Execute the insert, returning the generated key when reported.
    pub async fn exec(self) -> QueryResult<Option<Value>> {
        let (sql, values) = self.build_sql();
        let output = self
            .model
            .client()
            .executor()
            .execute(&sql, values)
            .await
            .map_err(|e| e.with_model(self.model.name()).with_sql(&sql))?;

        debug!(
            model = %self.model.name(),
            rows_affected = output.rows_affected,
            "create"
        );
        Ok(output.last_insert_id)
    }
}
