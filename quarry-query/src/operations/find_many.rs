//! FindMany operation for querying multiple records.

use tracing::debug;

use super::ModelClient;
use crate::compiler;
use crate::error::QueryResult;
use crate::query::Relation;
use crate::relations::RelationLoader;
use crate::row::Record;
use crate::traits::Executor;
use crate::value::Value;

/// A query operation that finds multiple records.
///
/// # Example
///
/// ```rust,ignore
/// let users = client
///     .model("User")?
///     .find_many(&Relation::new().r#where([("active", true)]).includes(["posts"]))
///     .await?;
/// ```
pub struct FindManyOperation<'a, E: Executor> {
    model: &'a ModelClient<'a, E>,
    relation: Relation,
}

impl<'a, E: Executor> FindManyOperation<'a, E> {
    /// Create a new FindMany operation.
    pub fn new(model: &'a ModelClient<'a, E>, relation: Relation) -> Self {
        Self { model, relation }
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        compiler::compile(
            &self.relation,
            self.model.client().dialect(),
            self.model.table(),
        )
    }

    /// Execute the query, then eager load the relation's includes.
    pub async fn exec(self) -> QueryResult<Vec<Record>> {
        let (sql, values) = self.build_sql()?;
        let client = self.model.client();
        crate::quarry_trace!(model = %self.model.name(), sql = %sql, "executing find_many");

        let output = client
            .executor()
            .execute(&sql, values)
            .await
            .map_err(|e| e.with_model(self.model.name()).with_sql(&sql))?;

        let mut records: Vec<Record> = output
            .rows
            .into_iter()
            .map(|row| Record::new(self.model.name(), row))
            .collect();
        debug!(model = %self.model.name(), rows = records.len(), "find_many");

        let includes = self.relation.include_specs();
        if !includes.is_empty() && !records.is_empty() {
            RelationLoader::new(client.executor(), client.registry(), client.dialect())
                .load(self.model.name(), &mut records, includes)
                .await?;
        }

        Ok(records)
    }
}
