//! Version ledger.
//!
//! Applied migration versions live in a one-column table
//! (`schema_migrations` by default). The generated scripts create it and
//! insert each version idempotently; [`applied_versions`] reads it back.

use quarry_query::{Dialect, Executor, Relation, Value};
use tracing::debug;

use crate::error::MigrateResult;

/// Default ledger table.
pub const DEFAULT_VERSION_TABLE: &str = "schema_migrations";

/// `CREATE TABLE IF NOT EXISTS <table>(version ... PRIMARY KEY)`.
///
/// MySQL cannot key a `TEXT` column without a prefix length, so it gets
/// `VARCHAR(255)`.
pub fn create_ledger_sql(dialect: Dialect, table: &str) -> String {
    let column_type = match dialect {
        Dialect::MySQL => "VARCHAR(255)",
        _ => "TEXT",
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {}(version {} PRIMARY KEY)",
        table, column_type
    )
}

/// Idempotent insert of one version.
///
/// ```rust
/// use quarry_migrate::history::record_version_sql;
/// use quarry_query::Dialect;
///
/// assert_eq!(
///     record_version_sql(Dialect::SQLite, "schema_migrations", "20240101"),
///     "INSERT INTO schema_migrations(version) VALUES('20240101') ON CONFLICT DO NOTHING"
/// );
/// assert_eq!(
///     record_version_sql(Dialect::MySQL, "schema_migrations", "20240101"),
///     "INSERT IGNORE INTO schema_migrations(version) VALUES('20240101')"
/// );
/// ```
pub fn record_version_sql(dialect: Dialect, table: &str, version: &str) -> String {
    let literal = Value::from(version).to_sql_literal(dialect);
    match dialect {
        Dialect::MySQL => format!("INSERT IGNORE INTO {}(version) VALUES({})", table, literal),
        _ => format!(
            "INSERT INTO {}(version) VALUES({}) ON CONFLICT DO NOTHING",
            table, literal
        ),
    }
}

/// Read the applied versions, oldest first.
///
/// The ledger must exist; run the script preamble first.
pub async fn applied_versions<E: Executor>(
    executor: &E,
    dialect: Dialect,
    table: &str,
) -> MigrateResult<Vec<String>> {
    let (sql, values) = Relation::new()
        .select(["version"])
        .order("version")
        .to_sql(dialect, table)?;
    let output = executor.execute(&sql, values).await?;

    let versions: Vec<String> = output
        .rows
        .iter()
        .filter_map(|row| match row.get("version") {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Int(v)) => Some(v.to_string()),
            _ => None,
        })
        .collect();
    debug!(table = %table, applied = versions.len(), "read migration ledger");
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_ddl() {
        assert_eq!(
            create_ledger_sql(Dialect::SQLite, DEFAULT_VERSION_TABLE),
            "CREATE TABLE IF NOT EXISTS schema_migrations(version TEXT PRIMARY KEY)"
        );
        assert_eq!(
            create_ledger_sql(Dialect::MySQL, "versions"),
            "CREATE TABLE IF NOT EXISTS versions(version VARCHAR(255) PRIMARY KEY)"
        );
    }

    #[test]
    fn test_version_literal_is_quoted() {
        assert_eq!(
            record_version_sql(Dialect::PostgreSQL, "schema_migrations", "o'clock"),
            "INSERT INTO schema_migrations(version) VALUES('o''clock') ON CONFLICT DO NOTHING"
        );
    }
}
