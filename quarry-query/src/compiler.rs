//! Relation to SQL compilation.
//!
//! Compilation is a pure function of the relation, the dialect and the table
//! name: the same inputs always produce byte-identical SQL and values.
//!
//! ```rust
//! use quarry_query::compiler::compile;
//! use quarry_query::{Dialect, Relation, SortOrder};
//!
//! let rel = Relation::new()
//!     .distinct()
//!     .select(["role"])
//!     .order(("role", SortOrder::Desc))
//!     .limit(10)
//!     .offset(20);
//!
//! let (sql, values) = compile(&rel, Dialect::PostgreSQL, "users").unwrap();
//! assert_eq!(sql, "SELECT DISTINCT role FROM users ORDER BY role DESC LIMIT 10 OFFSET 20");
//! assert!(values.is_empty());
//! ```

use std::fmt::Write;

use tracing::{debug, trace};

use crate::error::QueryResult;
use crate::query::Relation;
use crate::sql::{Dialect, SqlBuilder};
use crate::value::Value;

/// Options for [`compile_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Emit `SELECT COUNT(...) as count` and skip ordering and pagination.
    pub count: bool,
}

impl CompileOptions {
    /// Options for a count query.
    pub fn count() -> Self {
        Self { count: true }
    }
}

/// Compile a `SELECT` statement.
pub fn compile(relation: &Relation, dialect: Dialect, table: &str) -> QueryResult<(String, Vec<Value>)> {
    compile_with(relation, dialect, table, CompileOptions::default())
}

/// Compile a `SELECT COUNT(...)` statement.
pub fn compile_count(
    relation: &Relation,
    dialect: Dialect,
    table: &str,
) -> QueryResult<(String, Vec<Value>)> {
    compile_with(relation, dialect, table, CompileOptions::count())
}

/// Compile a relation with explicit options.
pub fn compile_with(
    relation: &Relation,
    dialect: Dialect,
    table: &str,
    options: CompileOptions,
) -> QueryResult<(String, Vec<Value>)> {
    let mut builder = SqlBuilder::new(dialect);

    builder.push("SELECT ");
    if options.count {
        write_count_projection(relation, &mut builder);
    } else {
        if relation.is_distinct() {
            builder.push("DISTINCT ");
        }
        match relation.projection() {
            Some(columns) if !columns.is_empty() => {
                builder.push(columns.join(", "));
            }
            _ => {
                builder.push("*");
            }
        }
    }

    builder.push(" FROM ").push(table);

    let tree = relation.tree();
    if !tree.is_empty() {
        builder.push(" WHERE ");
        tree.write_sql(&mut builder)
            .map_err(|e| e.with_context(format!("compiling query on {}", table)))?;
    }

    if !options.count {
        let mut tail = String::new();
        let order = relation.order_by();
        if !order.is_empty() {
            tail.push_str(" ORDER BY ");
            order.write_sql(&mut tail);
        }
        let pagination = relation.pagination();
        if let Some(limit) = pagination.limit {
            let _ = write!(tail, " LIMIT {}", limit);
        }
        if let Some(offset) = pagination.offset {
            let _ = write!(tail, " OFFSET {}", offset);
        }
        builder.push(tail);
    }

    let (sql, values) = builder.build();
    debug!(
        table = %table,
        dialect = %dialect,
        values = values.len(),
        count = options.count,
        "compiled relation"
    );
    trace!(sql = %sql, "compiled sql");
    Ok((sql, values))
}

fn write_count_projection(relation: &Relation, builder: &mut SqlBuilder) {
    match relation.projection() {
        Some(columns) if relation.is_distinct() && !columns.is_empty() => {
            builder
                .push("COUNT(DISTINCT ")
                .push(columns.join(", "))
                .push(") as count");
        }
        _ => {
            builder.push("COUNT(*) as count");
        }
    }
}
