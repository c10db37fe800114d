//! Error types for query compilation, association loading and execution.
//!
//! Every error carries an [`ErrorCode`] so callers can branch on the kind of
//! failure without matching on message text.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: Q{category}{number}
//! - 1xxx: Lookup errors (record or model not found)
//! - 2xxx: Validation errors (malformed conditions, unknown includes)
//! - 3xxx: Configuration errors (registry build)
//! - 5xxx: Execution errors (executor failures, cancellation, timeouts)
//! - 6xxx: Data errors (unexpected value types)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use quarry_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::record_not_found("User", 42);
//! assert_eq!(err.code, ErrorCode::RecordNotFound);
//! assert!(err.is_not_found());
//!
//! let err = QueryError::validation("raw condition expects 2 values, got 1");
//! assert!(err.is_validation());
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lookup errors (1xxx)
    /// No record matched a `find` by primary key (Q1001).
    RecordNotFound = 1001,
    /// The model name is not present in the registry (Q1002).
    ModelNotRegistered = 1002,

    // Validation errors (2xxx)
    /// Malformed condition, e.g. raw placeholder/value count mismatch (Q2001).
    InvalidCondition = 2001,
    /// Include names an association the model does not declare (Q2002).
    InvalidInclude = 2002,

    // Configuration errors (3xxx)
    /// Registry declarations are inconsistent (Q3001).
    InvalidConfiguration = 3001,

    // Execution errors (5xxx)
    /// The executor reported a failure (Q5001).
    DatabaseError = 5001,
    /// An in-flight execution was cancelled (Q5002).
    Cancelled = 5002,
    /// An in-flight execution timed out (Q5003).
    QueryTimeout = 5003,

    // Data errors (6xxx)
    /// A value had an unexpected type (Q6001).
    InvalidDataType = 6001,

    // Internal errors (9xxx)
    /// Internal error (Q9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "Q1001").
    pub fn code(&self) -> String {
        format!("Q{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Record not found",
            Self::ModelNotRegistered => "Model not registered",
            Self::InvalidCondition => "Invalid condition",
            Self::InvalidInclude => "Invalid include",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::DatabaseError => "Database error",
            Self::Cancelled => "Execution cancelled",
            Self::QueryTimeout => "Query timeout",
            Self::InvalidDataType => "Invalid data type",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The field or association involved.
    pub field: Option<String>,
    /// The SQL text (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL text.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// `find` by primary key matched nothing.
    pub fn record_not_found(model: impl Into<String>, id: impl fmt::Display) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::RecordNotFound,
            format!("Couldn't find {} with id={}", model, id),
        )
        .with_model(&model)
        .with_suggestion("Use find_by() or first() to get None instead of an error")
    }

    /// The registry has no entry for `model`.
    pub fn model_not_registered(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::ModelNotRegistered,
            format!("model not registered: {}", model),
        )
        .with_model(&model)
        .with_suggestion(format!("Register {} before building the registry", model))
    }

    /// A condition could not be compiled.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCondition, message)
    }

    /// An include names an association the model does not declare.
    pub fn invalid_include(model: impl Into<String>, association: impl Into<String>) -> Self {
        let model = model.into();
        let association = association.into();
        Self::new(
            ErrorCode::InvalidInclude,
            format!("{} has no association named {}", model, association),
        )
        .with_model(&model)
        .with_field(&association)
    }

    /// Registry declarations are inconsistent.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// The executor reported a failure.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// An in-flight execution was cancelled.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, message)
            .with_help("Cancellation aborts the whole operation; no partial results are kept")
    }

    /// An in-flight execution timed out.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Query timed out after {}ms", duration_ms),
        )
    }

    /// A value had an unexpected type.
    pub fn invalid_data_type(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidDataType,
            format!("Unexpected value for {}: {}", field, message.into()),
        )
        .with_field(&field)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Record or model lookup failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RecordNotFound | ErrorCode::ModelNotRegistered
        )
    }

    /// Malformed input detected before reaching the executor.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidCondition | ErrorCode::InvalidInclude
        )
    }

    /// Execution was cancelled or timed out.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.code, ErrorCode::Cancelled | ErrorCode::QueryTimeout)
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  -> While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  -> Model: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  -> Field: {}\n", field));
        }

        // SQL (truncated if too long)
        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.chars().count() > 200 {
                format!("{}...", sql.chars().take(200).collect::<String>())
            } else {
                sql.clone()
            };
            output.push_str(&format!("  -> SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::RecordNotFound.code(), "Q1001");
        assert_eq!(ErrorCode::InvalidCondition.code(), "Q2001");
        assert_eq!(ErrorCode::Cancelled.code(), "Q5002");
    }

    #[test]
    fn test_record_not_found_names_model_and_id() {
        let err = QueryError::record_not_found("User", 42);
        assert!(err.is_not_found());
        assert!(err.message.contains("User"));
        assert!(err.message.contains("42"));
        assert_eq!(err.context.model.as_deref(), Some("User"));
    }

    #[test]
    fn test_model_not_registered() {
        let err = QueryError::model_not_registered("Ghost");
        assert!(err.is_not_found());
        assert_eq!(err.code, ErrorCode::ModelNotRegistered);
        assert!(err.to_string().contains("model not registered"));
    }

    #[test]
    fn test_kind_predicates() {
        assert!(QueryError::validation("bad").is_validation());
        assert!(QueryError::invalid_include("User", "ghosts").is_validation());
        assert!(QueryError::cancelled("stop").is_cancelled());
        assert!(QueryError::timeout(100).is_cancelled());
        assert!(!QueryError::database("boom").is_cancelled());
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::validation("placeholder mismatch")
            .with_context("compiling users")
            .with_sql("SELECT * FROM users WHERE a = ?");

        let output = err.display_full();
        assert!(output.contains("Q2001"));
        assert!(output.contains("compiling users"));
        assert!(output.contains("SELECT * FROM users"));
    }
}
