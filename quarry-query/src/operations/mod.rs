//! Model-bound query operations.
//!
//! A [`Client`] ties an [`Executor`] to a [`ModelRegistry`] and a dialect;
//! [`Client::model`] yields a [`ModelClient`] whose methods build and run the
//! operation types in this module:
//! - `FindManyOperation` - Find matching records, eager loading includes
//! - `FindUniqueOperation` - Find one record by primary key or fail
//! - `FindFirstOperation` - Find the first (or last) matching record
//! - `CountOperation` - Count matching records
//! - `CreateOperation` - Insert a record

mod count;
mod create;
mod find_first;
mod find_many;
mod find_unique;

use std::sync::Arc;

pub use count::CountOperation;
pub use create::CreateOperation;
pub use find_first::{FindFirstOperation, Position};
pub use find_many::FindManyOperation;
pub use find_unique::FindUniqueOperation;

use crate::error::QueryResult;
use crate::filter::IntoConditions;
use crate::query::Relation;
use crate::relations::{ModelMeta, ModelRegistry};
use crate::row::Record;
use crate::sql::Dialect;
use crate::traits::Executor;
use crate::value::Value;

/// Entry point tying an executor to registered models.
pub struct Client<E: Executor> {
    executor: E,
    registry: Arc<ModelRegistry>,
    dialect: Dialect,
}

impl<E: Executor> Client<E> {
    /// Create a new client.
    pub fn new(executor: E, registry: Arc<ModelRegistry>, dialect: Dialect) -> Self {
        Self {
            executor,
            registry,
            dialect,
        }
    }

    /// The executor queries run through.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The SQL dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Bind to a registered model.
    pub fn model(&self, name: &str) -> QueryResult<ModelClient<'_, E>> {
        let meta = self.registry.resolve(name)?;
        Ok(ModelClient {
            client: self,
            name: name.to_string(),
            meta,
        })
    }
}

/// Operations on one registered model.
pub struct ModelClient<'a, E: Executor> {
    client: &'a Client<E>,
    name: String,
    meta: &'a ModelMeta,
}

impl<'a, E: Executor> ModelClient<'a, E> {
    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model metadata.
    pub fn meta(&self) -> &ModelMeta {
        self.meta
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.meta.table
    }

    pub(crate) fn client(&self) -> &'a Client<E> {
        self.client
    }

    /// All records matching `relation`, with its includes loaded.
    pub async fn find_many(&self, relation: &Relation) -> QueryResult<Vec<Record>> {
        FindManyOperation::new(self, relation.clone()).exec().await
    }

    /// The record with primary key `id`, or a not-found error.
    pub async fn find(&self, id: impl Into<Value>) -> QueryResult<Record> {
        FindUniqueOperation::new(self, id).exec().await
    }

    /// The first record matching `conditions`, if any.
    pub async fn find_by(&self, conditions: impl IntoConditions) -> QueryResult<Option<Record>> {
        FindFirstOperation::new(self, Relation::new().r#where(conditions), Position::Any)
            .exec()
            .await
    }

    /// The first record of `relation` (primary key order unless ordered).
    pub async fn first(&self, relation: &Relation) -> QueryResult<Option<Record>> {
        FindFirstOperation::new(self, relation.clone(), Position::First)
            .exec()
            .await
    }

    /// The last record of `relation` (reversed order, or primary key descending).
    pub async fn last(&self, relation: &Relation) -> QueryResult<Option<Record>> {
        FindFirstOperation::new(self, relation.clone(), Position::Last)
            .exec()
            .await
    }

    /// Number of records matching `relation`.
    pub async fn count(&self, relation: &Relation) -> QueryResult<u64> {
        CountOperation::new(self, relation.clone()).exec().await
    }

    /// Insert a record and return the generated key, if the executor
    /// reports one.
    pub async fn create<K: Into<String>, V: Into<Value>>(
        &self,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> QueryResult<Option<Value>> {
        CreateOperation::new(self)
            .data(attributes)
            .exec()
            .await
    }
}
