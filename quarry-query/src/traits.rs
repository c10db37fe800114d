//! The executor capability the engine runs SQL through.
//!
//! Connection management, transactions and transport are out of scope: an
//! [`Executor`] takes compiled SQL plus its values and hands back rows.
//! Cancellation and timeouts are the executor's business; it reports them
//! as [`QueryError::cancelled`](crate::QueryError::cancelled) or
//! [`QueryError::timeout`](crate::QueryError::timeout).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::QueryResult;
use crate::row::Row;
use crate::value::Value;

/// Result of executing one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Returned rows (empty for statements that return none).
    pub rows: Vec<Row>,
    /// Rows affected by a write.
    pub rows_affected: u64,
    /// Key generated by an insert, when the engine reports one.
    pub last_insert_id: Option<Value>,
}

impl QueryOutput {
    /// Output carrying rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows_affected: rows.len() as u64,
            rows,
            last_insert_id: None,
        }
    }

    /// Output of a write.
    pub fn affected(rows_affected: u64, last_insert_id: Option<Value>) -> Self {
        Self {
            rows: Vec::new(),
            rows_affected,
            last_insert_id,
        }
    }

    /// The generated key of an insert.
    pub fn last_insert_id(&self) -> Option<&Value> {
        self.last_insert_id.as_ref()
    }
}

/// Runs SQL against a database.
///
/// Implementations must be shareable across tasks: the association resolver
/// dispatches sibling queries concurrently through one executor.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute one statement with positional values.
    async fn execute(&self, sql: &str, values: Vec<Value>) -> QueryResult<QueryOutput>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    async fn execute(&self, sql: &str, values: Vec<Value>) -> QueryResult<QueryOutput> {
        (**self).execute(sql, values).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for &E {
    async fn execute(&self, sql: &str, values: Vec<Value>) -> QueryResult<QueryOutput> {
        (**self).execute(sql, values).await
    }
}
