//! FindUnique operation: one record by primary key.

use super::{FindManyOperation, ModelClient};
use crate::error::{QueryError, QueryResult};
use crate::query::Relation;
use crate::row::Record;
use crate::traits::Executor;
use crate::value::Value;

/// Finds exactly one record by primary key, failing when there is none.
pub struct FindUniqueOperation<'a, E: Executor> {
    model: &'a ModelClient<'a, E>,
    id: Value,
}

impl<'a, E: Executor> FindUniqueOperation<'a, E> {
    /// Create a new FindUnique operation.
    pub fn new(model: &'a ModelClient<'a, E>, id: impl Into<Value>) -> Self {
        Self {
            model,
            id: id.into(),
        }
    }

    fn relation(&self) -> Relation {
        Relation::new()
            .r#where((self.model.meta().primary_key.as_str(), self.id.clone()))
            .limit(1)
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        FindManyOperation::new(self.model, self.relation()).build_sql()
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Record> {
        let records = FindManyOperation::new(self.model, self.relation())
            .exec()
            .await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::record_not_found(self.model.name(), &self.id))
    }
}
