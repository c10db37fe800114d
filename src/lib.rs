//! # Quarry
//!
//! A relational query engine: an immutable relation builder, a SQL compiler
//! for PostgreSQL, MySQL and SQLite, N+1-free association loading, and
//! idempotent schema and seed scripts.
//!
//! Quarry provides:
//! - [`query`]: conditions, [`Relation`]s, the compiler, the model registry
//!   and the batched association loader, all over an abstract [`Executor`]
//! - [`migrate`]: migration and seed descriptions compiled to SQL that is
//!   safe to run more than once
//! - [`config`]: `quarry.toml` loading
//!
//! ## Quick Start
//!
//! ```rust
//! use quarry::prelude::*;
//!
//! let registry = ModelRegistry::builder()
//!     .register("User", ModelMeta::new("users").has_many("posts", "Post", "user_id"))
//!     .register("Post", ModelMeta::new("posts").belongs_to("author", "User", "user_id"))
//!     .build()
//!     .unwrap();
//! assert_eq!(registry.len(), 2);
//!
//! let rel = Relation::new()
//!     .r#where([("active", true)])
//!     .includes(["posts"])
//!     .limit(20);
//! let (sql, _) = rel.to_sql(Dialect::PostgreSQL, "users").unwrap();
//! assert_eq!(sql, "SELECT * FROM users WHERE active = $1 LIMIT 20");
//! ```
//!
//! Execution needs an [`Executor`] implementation for the target database;
//! see [`Client`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;

/// Relation building, SQL compilation and association loading.
pub mod query {
    pub use quarry_query::*;
}

/// Schema and seed script generation.
pub mod migrate {
    pub use quarry_migrate::*;
}

pub use config::{ConfigError, QuarryConfig};
pub use quarry_migrate::{GeneratorOptions, MigrationError, MigrationSource, Script};
pub use quarry_query::{
    Client, Condition, Dialect, Executor, IncludeSpec, ModelMeta, ModelRegistry, QueryError,
    QueryResult, Record, Relation, Value,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::QuarryConfig;
    pub use quarry_migrate::{generate_schema, generate_seeds, GeneratorOptions, MigrationSource};
    pub use quarry_query::prelude::*;
}
