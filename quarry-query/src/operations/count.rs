//! Count operation for counting records.

use tracing::debug;

use super::ModelClient;
use crate::compiler;
use crate::error::{QueryError, QueryResult};
use crate::query::Relation;
use crate::traits::Executor;
use crate::value::Value;

/// Counts the records matching a relation.
///
/// Ordering and pagination of the relation are ignored.
pub struct CountOperation<'a, E: Executor> {
    model: &'a ModelClient<'a, E>,
    relation: Relation,
}

impl<'a, E: Executor> CountOperation<'a, E> {
    /// Create a new Count operation.
    pub fn new(model: &'a ModelClient<'a, E>, relation: Relation) -> Self {
        Self { model, relation }
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        compiler::compile_count(
            &self.relation,
            self.model.client().dialect(),
            self.model.table(),
        )
    }

    /// Execute the count query.
    pub async fn exec(self) -> QueryResult<u64> {
        let (sql, values) = self.build_sql()?;
        let output = self
            .model
            .client()
            .executor()
            .execute(&sql, values)
            .await
            .map_err(|e| e.with_model(self.model.name()).with_sql(&sql))?;

        let count = match output.rows.first().and_then(|row| row.get("count")) {
            Some(value) => parse_count(value)?,
            None => 0,
        };
        debug!(model = %self.model.name(), count, "count");
        Ok(count)
    }
}

fn parse_count(value: &Value) -> QueryResult<u64> {
    let parsed = match value {
        Value::Int(n) => u64::try_from(*n).ok(),
        Value::Float(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| QueryError::invalid_data_type("count", format!("{:?}", value)))
}
