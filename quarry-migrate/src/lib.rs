//! # quarry-migrate
//!
//! Schema and seed compilation for quarry.
//!
//! This crate provides functionality for:
//! - Reading migration and seed bodies from a structured, JSON-serializable
//!   [`ast::Node`] description
//! - Extracting schema statements (`create_table`, `add_index`,
//!   `add_column`, `remove_column`, `drop_table`) best-effort per statement
//! - Generating idempotent SQL for PostgreSQL, MySQL and SQLite, recording
//!   applied versions in a `schema_migrations` ledger
//! - Extracting literal seed inserts and rendering them so a second run
//!   inserts nothing
//! - Applying generated scripts through any quarry [`Executor`](quarry_query::Executor)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐
//! │ Description  │────▶│ Extractor      │────▶│ SQL Gen      │
//! │ (ast::Node)  │     │ (best effort)  │     │ (per dialect)│
//! └──────────────┘     └────────────────┘     └──────────────┘
//!                                                    │
//!                                                    ▼
//!                                             ┌──────────────┐
//!                                             │ Script       │──▶ file text
//!                                             │              │──▶ apply_script
//!                                             └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use quarry_migrate::ast::{build::*, MigrationSource};
//! use quarry_migrate::{generate_schema, GeneratorOptions};
//! use quarry_query::Dialect;
//!
//! let source = MigrationSource::new(
//!     "20240101000000",
//!     vec![call_with_block(
//!         "create_table",
//!         vec![sym("users")],
//!         "t",
//!         vec![send(ident("t"), "string", vec![sym("email")])],
//!     )],
//! );
//!
//! let compiled = generate_schema(&[source], &GeneratorOptions::new(Dialect::SQLite));
//! assert!(compiled.errors.is_empty());
//! assert!(compiled.script.render().contains(
//!     "CREATE TABLE IF NOT EXISTS users (\n  id INTEGER PRIMARY KEY AUTOINCREMENT,\n  email VARCHAR(255)\n);"
//! ));
//! ```

pub mod apply;
pub mod ast;
pub mod error;
pub mod extract;
pub mod history;
pub mod inflect;
pub mod schema;
pub mod script;
pub mod seed;
pub mod sql;

pub use apply::{apply_pending, apply_script};
pub use ast::{MigrationSource, Node};
pub use error::{ExtractError, MigrateResult, MigrationError};
pub use extract::{Extraction, SchemaExtractor};
pub use schema::{ColumnDef, ColumnType, ForeignKey, Migration, MigrationStatement, TableDef};
pub use script::{Script, Section, Statement};
pub use seed::{SeedExtractor, SeedInsert, SeedPlan, SeedSqlGenerator};
pub use sql::{GeneratorOptions, SchemaSqlGenerator};

/// A generated script together with the statements that could not be
/// extracted.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub script: Script,
    pub errors: Vec<ExtractError>,
}

impl Compiled {
    /// Fail on the first extraction error instead of skipping it.
    pub fn into_strict(self) -> MigrateResult<Script> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err.into()),
            None => Ok(self.script),
        }
    }
}

/// Extract and generate the schema script for migrations in version order.
pub fn generate_schema(sources: &[MigrationSource], options: &GeneratorOptions) -> Compiled {
    let mut ordered: Vec<&MigrationSource> = sources.iter().collect();
    ordered.sort_by(|a, b| a.version.cmp(&b.version));

    let mut errors = Vec::new();
    let migrations: Vec<Migration> = ordered
        .into_iter()
        .map(|source| {
            let extraction = SchemaExtractor::extract(source);
            errors.extend(extraction.errors);
            extraction.migration
        })
        .collect();

    Compiled {
        script: SchemaSqlGenerator::new(options.clone()).generate(&migrations),
        errors,
    }
}

/// Extract and generate the seed script for a seed body.
pub fn generate_seeds(body: &[Node], options: &GeneratorOptions) -> Compiled {
    let plan = SeedExtractor::extract(body);
    Compiled {
        script: SeedSqlGenerator::new(options.clone()).generate(&plan),
        errors: plan.errors,
    }
}
