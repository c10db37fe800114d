//! Error types for schema and seed compilation.

use quarry_query::QueryError;
use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// A statement of a migration or seed description that could not be
/// extracted. Extraction keeps going after one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("statement {statement} ({method}): {message}")]
pub struct ExtractError {
    /// Zero-based index of the offending statement in visiting order.
    pub statement: usize,
    /// Method or node shape being extracted.
    pub method: String,
    /// What was wrong with it.
    pub message: String,
}

impl ExtractError {
    /// Create an extract error.
    pub fn new(statement: usize, method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            statement,
            method: method.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A description statement could not be extracted.
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// The description document itself is malformed.
    #[error("Invalid migration description: {0}")]
    InvalidDescription(#[from] serde_json::Error),

    /// Invalid migration input.
    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    /// A generated statement failed in the executor.
    #[error("Statement {index} failed: {source}")]
    Execution {
        /// Zero-based index of the statement in the script.
        index: usize,
        /// The executor's error.
        #[source]
        source: QueryError,
    },

    /// A query issued by the migration engine failed.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

impl MigrationError {
    /// Create an invalid migration error.
    pub fn invalid_migration(msg: impl Into<String>) -> Self {
        Self::InvalidMigration(msg.into())
    }

    /// Wrap an executor failure for statement `index`.
    pub fn execution(index: usize, source: QueryError) -> Self {
        Self::Execution { index, source }
    }

    /// Check if the executor reported cancellation or a timeout.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Execution { source, .. } | Self::Query(source) => source.is_cancelled(),
            _ => false,
        }
    }
}
