//! # quarry-query
//!
//! Query compilation and association loading for quarry.
//!
//! This crate provides:
//! - An immutable, chainable [`Relation`] builder (`where`, `not`, `or`,
//!   `order`, `limit`, `offset`, `select`, `distinct`, `includes`)
//! - A pure SQL compiler producing SQL text plus positional values for
//!   PostgreSQL (`$1`), MySQL and SQLite (`?`)
//! - A [`ModelRegistry`] of tables and associations, validated once at startup
//! - A batched association loader that issues one query per association per
//!   nesting level
//! - Model-bound operations (`find_many`, `find`, `find_by`, `first`, `last`,
//!   `count`, `create`) over an abstract [`Executor`]
//!
//! ## Relations
//!
//! ```rust
//! use quarry_query::{Dialect, Relation, SortOrder, Value};
//!
//! let rel = Relation::new()
//!     .r#where([("active", true)])
//!     .r#where([("id", vec![1, 2, 3])])
//!     .order(("created_at", SortOrder::Desc))
//!     .limit(10);
//!
//! let (sql, values) = rel.to_sql(Dialect::PostgreSQL, "users").unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM users WHERE active = $1 AND id IN ($2, $3, $4) ORDER BY created_at DESC LIMIT 10"
//! );
//! assert_eq!(values[0], Value::Bool(true));
//! ```
//!
//! ## Negation and alternatives
//!
//! ```rust
//! use quarry_query::{Dialect, Relation};
//!
//! let rel = Relation::new()
//!     .not([("role", "bot")])
//!     .or([("id", 1)]);
//!
//! let (sql, _) = rel.to_sql(Dialect::SQLite, "users").unwrap();
//! assert_eq!(sql, "SELECT * FROM users WHERE (NOT (role = ?)) OR (id = ?)");
//! ```
//!
//! ## Counting
//!
//! ```rust
//! use quarry_query::{Dialect, Relation};
//!
//! let rel = Relation::new().distinct().select(["role"]).limit(5);
//! let (sql, _) = rel.to_count_sql(Dialect::MySQL, "users").unwrap();
//! assert_eq!(sql, "SELECT COUNT(DISTINCT role) as count FROM users");
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use quarry_query::{Dialect, ErrorCode, Relation};
//!
//! let rel = Relation::new().where_raw("age BETWEEN ? AND ?", [18]);
//! let err = rel.to_sql(Dialect::SQLite, "users").unwrap_err();
//! assert_eq!(err.code, ErrorCode::InvalidCondition);
//! ```

pub mod compiler;
pub mod error;
pub mod filter;
pub mod logging;
pub mod operations;
pub mod pagination;
pub mod query;
pub mod relations;
pub mod row;
pub mod sql;
pub mod traits;
pub mod types;
pub mod value;

pub use compiler::{compile, compile_count, compile_with, CompileOptions};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use filter::{Condition, ConditionTree, Conjunct, IntoConditions, MemoryFilter};
pub use logging::{LogFormat, LogLevel};
pub use operations::{Client, ModelClient};
pub use pagination::Pagination;
pub use query::{Alternative, Relation};
pub use relations::{
    AssociationKind, AssociationMeta, IncludeSpec, ModelMeta, ModelRegistry, ModelRegistryBuilder,
    RelationLoader,
};
pub use row::{Association, Record, Row};
pub use sql::{Dialect, SqlBuilder};
pub use traits::{Executor, QueryOutput};
pub use types::{OrderBy, OrderByField, SortOrder};
pub use value::{Operand, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{eq, is_in, is_null, raw, Condition};
    pub use crate::operations::{Client, ModelClient};
    pub use crate::query::Relation;
    pub use crate::relations::{IncludeSpec, ModelMeta, ModelRegistry};
    pub use crate::row::{Association, Record};
    pub use crate::sql::Dialect;
    pub use crate::traits::{Executor, QueryOutput};
    pub use crate::types::SortOrder;
    pub use crate::value::Value;
}
