//! The immutable, chainable query specification.
//!
//! Every builder method returns a new [`Relation`]; the receiver is never
//! modified. Lists a method does not touch are shared with the parent through
//! `Arc`, so deriving relations from a common base is cheap.
//!
//! ```rust
//! use quarry_query::{Dialect, Relation};
//!
//! let admins = Relation::new()
//!     .r#where([("active", true)])
//!     .r#where([("role", "admin")]);
//!
//! let (sql, values) = admins.to_sql(Dialect::SQLite, "users").unwrap();
//! assert_eq!(sql, "SELECT * FROM users WHERE active = ? AND role = ?");
//! assert_eq!(values.len(), 2);
//! ```

use std::sync::Arc;

use crate::compiler;
use crate::error::QueryResult;
use crate::filter::{Condition, ConditionTree, IntoConditions};
use crate::pagination::Pagination;
use crate::relations::IncludeSpec;
use crate::sql::Dialect;
use crate::types::OrderBy;
use crate::value::{Operand, Value};

/// An immutable description of a query, not yet executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    tree: ConditionTree,
    order: Arc<OrderBy>,
    pagination: Pagination,
    projection: Option<Arc<Vec<String>>>,
    distinct: bool,
    includes: Arc<Vec<IncludeSpec>>,
}

impl Relation {
    /// An unconditioned relation (`SELECT * FROM <table>`).
    pub fn new() -> Self {
        Self::default()
    }

    /// AND the given conditions onto the chain.
    ///
    /// Hash-style pairs map a list to `IN`, a null to `IS NULL` and anything
    /// else to `=`.
    pub fn r#where(&self, conditions: impl IntoConditions) -> Self {
        Self {
            tree: self.tree.with_conditions(conditions.into_conditions()),
            ..self.clone()
        }
    }

    /// AND a raw SQL fragment using `?` placeholders.
    ///
    /// The placeholder/value count is checked when the relation is compiled.
    pub fn where_raw<V: Into<Value>>(
        &self,
        fragment: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let condition = Condition::Raw(fragment.into(), values.into_iter().map(Into::into).collect());
        self.r#where(condition)
    }

    /// AND a `NOT (...)` group. Each call adds its own group; nothing is
    /// simplified.
    pub fn not(&self, conditions: impl IntoConditions) -> Self {
        Self {
            tree: self.tree.with_negated(conditions.into_conditions()),
            ..self.clone()
        }
    }

    /// OR an alternative group against the whole AND-chain.
    ///
    /// Given another relation, only its plain `where` conditions are used;
    /// its NOT groups, alternatives, ordering, pagination, projection and
    /// includes are ignored.
    pub fn or(&self, alternative: impl Into<Alternative>) -> Self {
        Self {
            tree: self.tree.with_alternative(alternative.into().conditions),
            ..self.clone()
        }
    }

    /// Append ordering. A bare column is ascending.
    pub fn order(&self, spec: impl Into<OrderBy>) -> Self {
        let mut order = (*self.order).clone();
        order.extend(spec.into());
        Self {
            order: Arc::new(order),
            ..self.clone()
        }
    }

    /// Flip the direction of every order column.
    pub fn reverse_order(&self) -> Self {
        Self {
            order: Arc::new(self.order.reverse()),
            ..self.clone()
        }
    }

    /// Replace the row limit.
    pub fn limit(&self, n: u64) -> Self {
        Self {
            pagination: self.pagination.limit(n),
            ..self.clone()
        }
    }

    /// Replace the row offset.
    pub fn offset(&self, n: u64) -> Self {
        Self {
            pagination: self.pagination.offset(n),
            ..self.clone()
        }
    }

    /// Append projected columns.
    pub fn select<S: Into<String>>(&self, columns: impl IntoIterator<Item = S>) -> Self {
        let mut projection = self
            .projection
            .as_deref()
            .cloned()
            .unwrap_or_default();
        projection.extend(columns.into_iter().map(Into::into));
        Self {
            projection: Some(Arc::new(projection)),
            ..self.clone()
        }
    }

    /// Emit `SELECT DISTINCT`.
    pub fn distinct(&self) -> Self {
        Self {
            distinct: true,
            ..self.clone()
        }
    }

    /// Append associations to eager load.
    ///
    /// A name already included is merged with the earlier spec, so each
    /// association is loaded once per level.
    pub fn includes<I: Into<IncludeSpec>>(&self, specs: impl IntoIterator<Item = I>) -> Self {
        let mut includes = (*self.includes).clone();
        for spec in specs {
            IncludeSpec::merge_into(&mut includes, spec.into());
        }
        Self {
            includes: Arc::new(includes),
            ..self.clone()
        }
    }

    /// The predicate.
    pub fn tree(&self) -> &ConditionTree {
        &self.tree
    }

    /// The ordering (possibly empty).
    pub fn order_by(&self) -> &OrderBy {
        &self.order
    }

    /// Limit and offset.
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Projected columns, when `select` was used.
    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref().map(Vec::as_slice)
    }

    /// Whether `DISTINCT` is set.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Associations to eager load.
    pub fn include_specs(&self) -> &[IncludeSpec] {
        &self.includes
    }

    /// Compile to `SELECT` SQL and its values.
    pub fn to_sql(&self, dialect: Dialect, table: &str) -> QueryResult<(String, Vec<Value>)> {
        compiler::compile(self, dialect, table)
    }

    /// Compile to `SELECT COUNT(...)` SQL and its values.
    pub fn to_count_sql(&self, dialect: Dialect, table: &str) -> QueryResult<(String, Vec<Value>)> {
        compiler::compile_count(self, dialect, table)
    }
}

/// An OR-ed alternative group: conditions, or the plain conditions of another
/// relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    conditions: Vec<Condition>,
}

impl From<Condition> for Alternative {
    fn from(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }
}

impl From<Vec<Condition>> for Alternative {
    fn from(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

impl<const N: usize> From<[Condition; N]> for Alternative {
    fn from(conditions: [Condition; N]) -> Self {
        Self {
            conditions: conditions.into_conditions(),
        }
    }
}

impl<K: Into<String>, O: Into<Operand>> From<(K, O)> for Alternative {
    fn from(pair: (K, O)) -> Self {
        Self {
            conditions: pair.into_conditions(),
        }
    }
}

impl<K: Into<String>, O: Into<Operand>> From<Vec<(K, O)>> for Alternative {
    fn from(pairs: Vec<(K, O)>) -> Self {
        Self {
            conditions: pairs.into_conditions(),
        }
    }
}

impl<K: Into<String>, O: Into<Operand>, const N: usize> From<[(K, O); N]> for Alternative {
    fn from(pairs: [(K, O); N]) -> Self {
        Self {
            conditions: pairs.into_conditions(),
        }
    }
}

impl From<&Relation> for Alternative {
    fn from(relation: &Relation) -> Self {
        Self {
            conditions: relation.tree.base().cloned().collect(),
        }
    }
}

impl From<Relation> for Alternative {
    fn from(relation: Relation) -> Self {
        Self::from(&relation)
    }
}
