//! Schema statements produced by the extractor.

use quarry_query::{Dialect, Value};
use serde::{Deserialize, Serialize};

/// Abstract column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Text,
    Integer,
    BigInt,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Timestamp,
    Time,
    Binary,
    Json,
}

impl ColumnType {
    /// Parse a column-type method name (`string`, `datetime`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "text" => Self::Text,
            "integer" => Self::Integer,
            "bigint" => Self::BigInt,
            "float" => Self::Float,
            "decimal" => Self::Decimal,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "timestamp" => Self::Timestamp,
            "time" => Self::Time,
            "binary" => Self::Binary,
            "json" => Self::Json,
            _ => return None,
        })
    }

    /// Render the SQL type for `dialect`.
    pub fn sql_type(self, dialect: Dialect, limit: Option<u32>) -> String {
        match self {
            Self::String => format!("VARCHAR({})", limit.unwrap_or(255)),
            Self::Text => "TEXT".to_string(),
            Self::Integer => "INTEGER".to_string(),
            Self::BigInt => "BIGINT".to_string(),
            Self::Float => match dialect {
                Dialect::SQLite => "REAL",
                Dialect::PostgreSQL => "DOUBLE PRECISION",
                Dialect::MySQL => "DOUBLE",
            }
            .to_string(),
            Self::Decimal => "DECIMAL".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Date => "DATE".to_string(),
            Self::DateTime | Self::Timestamp => match dialect {
                Dialect::MySQL => "DATETIME",
                _ => "TIMESTAMP",
            }
            .to_string(),
            Self::Time => "TIME".to_string(),
            Self::Binary => match dialect {
                Dialect::PostgreSQL => "BYTEA",
                _ => "BLOB",
            }
            .to_string(),
            Self::Json => match dialect {
                Dialect::SQLite => "TEXT",
                Dialect::PostgreSQL => "JSONB",
                Dialect::MySQL => "JSON",
            }
            .to_string(),
        }
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<Value>,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub limit: Option<u32>,
}

impl ColumnDef {
    /// A nullable column with no default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            primary_key: false,
            auto_increment: false,
            limit: None,
        }
    }

    /// The implicit auto-increment integer primary key.
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            nullable: false,
            primary_key: true,
            auto_increment: true,
            ..Self::new(name, ColumnType::Integer)
        }
    }

    /// Mark the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the length limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A foreign-key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

/// A table to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// One schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationStatement {
    CreateTable(TableDef),
    AddIndex {
        table: String,
        columns: Vec<String>,
        unique: bool,
        name: Option<String>,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    RemoveColumn {
        table: String,
        column: String,
    },
    DropTable {
        table: String,
    },
}

impl MigrationStatement {
    /// The table the statement touches.
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable(def) => &def.name,
            Self::AddIndex { table, .. }
            | Self::AddColumn { table, .. }
            | Self::RemoveColumn { table, .. }
            | Self::DropTable { table } => table,
        }
    }
}

/// Default index name: `index_<table>_on_<col>[_and_<col>...]`.
pub fn default_index_name(table: &str, columns: &[String]) -> String {
    format!("index_{}_on_{}", table, columns.join("_and_"))
}

/// An extracted migration, ready for generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    pub version: String,
    pub name: Option<String>,
    pub statements: Vec<MigrationStatement>,
}
