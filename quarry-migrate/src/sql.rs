//! SQL generation for migrations.

use quarry_query::Dialect;
use tracing::info;

use crate::history::{self, DEFAULT_VERSION_TABLE};
use crate::schema::{default_index_name, ColumnDef, ColumnType, Migration, MigrationStatement, TableDef};
use crate::script::{Script, Section, Statement};

/// Default seed marker table.
pub const DEFAULT_MARKER_TABLE: &str = "_seeds_applied";

/// Options shared by the schema and seed generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Target dialect.
    pub dialect: Dialect,
    /// Ledger of applied migration versions.
    pub version_table: String,
    /// Marker recording that seeds ran.
    pub marker_table: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

impl GeneratorOptions {
    /// Options for `dialect` with the default table names.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            version_table: DEFAULT_VERSION_TABLE.to_string(),
            marker_table: DEFAULT_MARKER_TABLE.to_string(),
        }
    }

    /// Use a different ledger table.
    pub fn with_version_table(mut self, table: impl Into<String>) -> Self {
        self.version_table = table.into();
        self
    }

    /// Use a different seed marker table.
    pub fn with_marker_table(mut self, table: impl Into<String>) -> Self {
        self.marker_table = table.into();
        self
    }
}

/// Renders extracted migrations as an idempotent SQL script.
///
/// ```rust
/// use quarry_migrate::schema::{Migration, MigrationStatement};
/// use quarry_migrate::sql::{GeneratorOptions, SchemaSqlGenerator};
/// use quarry_query::Dialect;
///
/// let migration = Migration {
///     version: "20240101000000".into(),
///     name: None,
///     statements: vec![MigrationStatement::DropTable { table: "legacy".into() }],
/// };
///
/// let script = SchemaSqlGenerator::new(GeneratorOptions::new(Dialect::SQLite)).generate(&[migration]);
/// assert_eq!(
///     script.statements(),
///     vec![
///         "CREATE TABLE IF NOT EXISTS schema_migrations(version TEXT PRIMARY KEY)",
///         "DROP TABLE IF EXISTS legacy",
///         "INSERT INTO schema_migrations(version) VALUES('20240101000000') ON CONFLICT DO NOTHING",
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaSqlGenerator {
    options: GeneratorOptions,
}

impl SchemaSqlGenerator {
    /// Create a generator.
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Generator options.
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate the script for a list of migrations, in the given order.
    pub fn generate(&self, migrations: &[Migration]) -> Script {
        let dialect = self.options.dialect;
        let script = Script {
            header: vec![
                "Schema migrations".to_string(),
                format!("Generated by quarry for {}.", dialect),
                format!(
                    "Safe to run more than once; applied versions are recorded in {}.",
                    self.options.version_table
                ),
            ],
            preamble: vec![Statement::new(history::create_ledger_sql(
                dialect,
                &self.options.version_table,
            ))],
            sections: migrations.iter().map(|m| self.migration(m)).collect(),
        };
        info!(
            dialect = %dialect,
            migrations = migrations.len(),
            statements = script.statements().len(),
            "generated schema script"
        );
        script
    }

    /// Generate the section for one migration.
    pub fn migration(&self, migration: &Migration) -> Section {
        let mut statements: Vec<Statement> = migration
            .statements
            .iter()
            .map(|s| self.statement(s))
            .collect();
        statements.push(Statement::new(history::record_version_sql(
            self.options.dialect,
            &self.options.version_table,
            &migration.version,
        )));

        let title = match &migration.name {
            Some(name) => format!("Migration: {}\nName: {}", migration.version, name),
            None => format!("Migration: {}", migration.version),
        };
        Section {
            version: Some(migration.version.clone()),
            title: Some(title),
            statements,
        }
    }

    /// Render one statement.
    pub fn statement(&self, statement: &MigrationStatement) -> Statement {
        match statement {
            MigrationStatement::CreateTable(def) => Statement::new(self.create_table(def)),
            MigrationStatement::AddIndex {
                table,
                columns,
                unique,
                name,
            } => {
                let name = name
                    .clone()
                    .unwrap_or_else(|| default_index_name(table, columns));
                Statement::new(format!(
                    "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                    if *unique { "UNIQUE " } else { "" },
                    name,
                    table,
                    columns.join(", ")
                ))
            }
            MigrationStatement::AddColumn { table, column } => Statement::new(format!(
                "ALTER TABLE {} ADD COLUMN {}",
                table,
                self.column_definition(column)
            )),
            // Not every engine can drop columns; left for manual application.
            MigrationStatement::RemoveColumn { table, column } => {
                Statement::disabled(format!("ALTER TABLE {} DROP COLUMN {}", table, column))
            }
            MigrationStatement::DropTable { table } => {
                Statement::new(format!("DROP TABLE IF EXISTS {}", table))
            }
        }
    }

    fn create_table(&self, def: &TableDef) -> String {
        let mut lines: Vec<String> = def
            .columns
            .iter()
            .map(|c| self.column_definition(c))
            .collect();

        for fk in &def.foreign_keys {
            lines.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                fk.column, fk.ref_table, fk.ref_column
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            def.name,
            lines.join(",\n  ")
        )
    }

    /// Column line: name, type, then primary key, auto-increment, not-null
    /// and default modifiers in that order.
    fn column_definition(&self, column: &ColumnDef) -> String {
        let dialect = self.options.dialect;
        let serial = column.auto_increment && dialect == Dialect::PostgreSQL;

        let sql_type = match column.column_type {
            ColumnType::BigInt if serial => "BIGSERIAL".to_string(),
            _ if serial => "SERIAL".to_string(),
            other => other.sql_type(dialect, column.limit),
        };
        let mut parts = vec![column.name.clone(), sql_type];

        if column.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if column.auto_increment {
            match dialect {
                Dialect::SQLite => parts.push("AUTOINCREMENT".to_string()),
                Dialect::MySQL => parts.push("AUTO_INCREMENT".to_string()),
                Dialect::PostgreSQL => {}
            }
        }
        if !column.nullable && !column.primary_key {
            parts.push("NOT NULL".to_string());
        }
        if let Some(default) = &column.default {
            parts.push(format!("DEFAULT {}", default.to_sql_literal(dialect)));
        }

        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ForeignKey;
    use pretty_assertions::assert_eq;

    fn users_table() -> TableDef {
        TableDef {
            name: "users".into(),
            columns: vec![
                ColumnDef::primary_key("id"),
                ColumnDef::new("email", ColumnType::String).not_null(),
                ColumnDef::new("active", ColumnType::Boolean).with_default(true),
                ColumnDef::new("team_id", ColumnType::Integer),
            ],
            foreign_keys: vec![ForeignKey {
                column: "team_id".into(),
                ref_table: "teams".into(),
                ref_column: "id".into(),
            }],
        }
    }

    fn generator(dialect: Dialect) -> SchemaSqlGenerator {
        SchemaSqlGenerator::new(GeneratorOptions::new(dialect))
    }

    #[test]
    fn test_create_table_sqlite() {
        let sql = generator(Dialect::SQLite).create_table(&users_table());
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS users (\n  \
             id INTEGER PRIMARY KEY AUTOINCREMENT,\n  \
             email VARCHAR(255) NOT NULL,\n  \
             active BOOLEAN DEFAULT TRUE,\n  \
             team_id INTEGER,\n  \
             FOREIGN KEY (team_id) REFERENCES teams(id)\n)"
        );
    }

    #[test]
    fn test_primary_key_per_dialect() {
        let id = ColumnDef::primary_key("id");
        assert_eq!(
            generator(Dialect::PostgreSQL).column_definition(&id),
            "id SERIAL PRIMARY KEY"
        );
        assert_eq!(
            generator(Dialect::MySQL).column_definition(&id),
            "id INTEGER PRIMARY KEY AUTO_INCREMENT"
        );
    }

    #[test]
    fn test_index_statements() {
        let g = generator(Dialect::SQLite);
        let named = MigrationStatement::AddIndex {
            table: "users".into(),
            columns: vec!["email".into()],
            unique: true,
            name: Some("by_email".into()),
        };
        assert_eq!(
            g.statement(&named).sql,
            "CREATE UNIQUE INDEX IF NOT EXISTS by_email ON users (email)"
        );

        let generated = MigrationStatement::AddIndex {
            table: "posts".into(),
            columns: vec!["user_id".into(), "created_at".into()],
            unique: false,
            name: None,
        };
        assert_eq!(
            g.statement(&generated).sql,
            "CREATE INDEX IF NOT EXISTS index_posts_on_user_id_and_created_at ON posts (user_id, created_at)"
        );
    }

    #[test]
    fn test_remove_column_is_commented_out() {
        let statement = generator(Dialect::SQLite).statement(&MigrationStatement::RemoveColumn {
            table: "users".into(),
            column: "legacy".into(),
        });
        assert!(statement.disabled);
        assert_eq!(statement.sql, "ALTER TABLE users DROP COLUMN legacy");
    }

    #[test]
    fn test_script_layout() {
        let migrations = vec![
            Migration {
                version: "1".into(),
                name: Some("create_users".into()),
                statements: vec![MigrationStatement::AddColumn {
                    table: "users".into(),
                    column: ColumnDef::new("nickname", ColumnType::String).with_limit(40),
                }],
            },
            Migration {
                version: "2".into(),
                name: None,
                statements: vec![MigrationStatement::RemoveColumn {
                    table: "users".into(),
                    column: "nickname".into(),
                }],
            },
        ];

        let text = generator(Dialect::MySQL).generate(&migrations).render();
        let expected = "\
-- Schema migrations
-- Generated by quarry for mysql.
-- Safe to run more than once; applied versions are recorded in schema_migrations.

CREATE TABLE IF NOT EXISTS schema_migrations(version VARCHAR(255) PRIMARY KEY);

-- Migration: 1
-- Name: create_users
ALTER TABLE users ADD COLUMN nickname VARCHAR(40);
INSERT IGNORE INTO schema_migrations(version) VALUES('1');

-- Migration: 2
-- ALTER TABLE users DROP COLUMN nickname;
INSERT IGNORE INTO schema_migrations(version) VALUES('2');
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_custom_version_table() {
        let options = GeneratorOptions::new(Dialect::PostgreSQL).with_version_table("quarry_versions");
        let script = SchemaSqlGenerator::new(options).generate(&[]);
        assert_eq!(
            script.statements(),
            vec!["CREATE TABLE IF NOT EXISTS quarry_versions(version TEXT PRIMARY KEY)"]
        );
    }
}
