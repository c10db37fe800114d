//! FindFirst operation: at most one record, never a not-found error.

use super::{FindManyOperation, ModelClient};
use crate::error::QueryResult;
use crate::query::Relation;
use crate::row::Record;
use crate::traits::Executor;
use crate::types::OrderByField;
use crate::value::Value;

/// Which end of the result to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Whatever the database returns first; the order is left untouched.
    Any,
    /// First in order, by primary key ascending when unordered.
    First,
    /// Last in order: the order reversed, or primary key descending.
    Last,
}

/// Finds the first (or last) matching record.
pub struct FindFirstOperation<'a, E: Executor> {
    model: &'a ModelClient<'a, E>,
    relation: Relation,
    position: Position,
}

impl<'a, E: Executor> FindFirstOperation<'a, E> {
    /// Create a new FindFirst operation.
    pub fn new(model: &'a ModelClient<'a, E>, relation: Relation, position: Position) -> Self {
        Self {
            model,
            relation,
            position,
        }
    }

    fn relation(&self) -> Relation {
        let primary_key = self.model.meta().primary_key.as_str();
        let ordered = match self.position {
            Position::Any => self.relation.clone(),
            Position::First if self.relation.order_by().is_empty() => {
                self.relation.order(OrderByField::asc(primary_key))
            }
            Position::First => self.relation.clone(),
            Position::Last if self.relation.order_by().is_empty() => {
                self.relation.order(OrderByField::desc(primary_key))
            }
            Position::Last => self.relation.reverse_order(),
        };
        ordered.limit(1)
    }

    /// Build the SQL query.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        FindManyOperation::new(self.model, self.relation()).build_sql()
    }

    /// Execute the query.
    pub async fn exec(self) -> QueryResult<Option<Record>> {
        let records = FindManyOperation::new(self.model, self.relation())
            .exec()
            .await?;
        Ok(records.into_iter().next())
    }
}
