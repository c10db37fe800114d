//! Schema extraction from migration descriptions.
//!
//! The extractor walks a [`MigrationSource`] body, descending into class
//! bodies and `def change` / `def up` (never `def down`), and recognizes
//! `create_table`, `add_index`, `add_column`, `remove_column` and
//! `drop_table`. Unknown calls are skipped with a warning. A malformed
//! statement records an [`ExtractError`] and extraction continues.

use quarry_query::Value;
use tracing::{debug, warn};

use crate::ast::{Block, MigrationSource, Node};
use crate::error::ExtractError;
use crate::inflect::pluralize;
use crate::schema::{ColumnDef, ColumnType, ForeignKey, Migration, MigrationStatement, TableDef};

/// Result of extracting one migration.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The statements that could be built.
    pub migration: Migration,
    /// Statements that could not.
    pub errors: Vec<ExtractError>,
}

impl Extraction {
    /// Whether every statement was extracted.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Extracts [`MigrationStatement`]s from a migration body.
#[derive(Debug, Default)]
pub struct SchemaExtractor {
    statements: Vec<MigrationStatement>,
    errors: Vec<ExtractError>,
    index: usize,
}

impl SchemaExtractor {
    /// Extract one migration.
    pub fn extract(source: &MigrationSource) -> Extraction {
        let mut extractor = Self::default();
        extractor.visit_body(&source.body);
        debug!(
            version = %source.version,
            statements = extractor.statements.len(),
            errors = extractor.errors.len(),
            "extracted migration"
        );
        Extraction {
            migration: Migration {
                version: source.version.clone(),
                name: source.name.clone(),
                statements: extractor.statements,
            },
            errors: extractor.errors,
        }
    }

    fn visit_body(&mut self, body: &[Node]) {
        for node in body {
            match node {
                Node::Class { body, .. } => self.visit_body(body),
                Node::Def { name, body } if name == "change" || name == "up" => {
                    self.visit_body(body)
                }
                Node::Def { .. } => {}
                Node::Call {
                    receiver: None,
                    method,
                    args,
                    block,
                } => {
                    let index = self.index;
                    self.index += 1;
                    if let Err(err) = self.visit_call(index, method, args, block.as_ref()) {
                        warn!(statement = index, method = %method, error = %err.message, "skipping malformed statement");
                        self.errors.push(err);
                    }
                }
                other => {
                    warn!(statement = self.index, kind = other.kind(), "skipping unrecognized statement");
                    self.index += 1;
                }
            }
        }
    }

    fn visit_call(
        &mut self,
        index: usize,
        method: &str,
        args: &[Node],
        block: Option<&Block>,
    ) -> Result<(), ExtractError> {
        let err = |message: &str| ExtractError::new(index, method, message);
        let name_arg = |position: usize, what: &str| {
            args.get(position)
                .and_then(Node::as_name)
                .map(str::to_string)
                .ok_or_else(|| err(&format!("expected {} as argument {}", what, position + 1)))
        };

        match method {
            "create_table" => {
                let table = name_arg(0, "a table name")?;
                let options = args.get(1);
                let (def, indexes) = self.create_table(index, table, options, block)?;
                self.statements.push(MigrationStatement::CreateTable(def));
                self.statements.extend(indexes);
            }
            "add_index" => {
                let table = name_arg(0, "a table name")?;
                let columns = index_columns(args.get(1)).ok_or_else(|| err("expected index columns"))?;
                self.statements
                    .push(add_index(table, columns, args.get(2)));
            }
            "add_column" => {
                let table = name_arg(0, "a table name")?;
                let column = name_arg(1, "a column name")?;
                let type_name = name_arg(2, "a column type")?;
                let column_type = ColumnType::parse(&type_name)
                    .ok_or_else(|| err(&format!("unknown column type '{}'", type_name)))?;
                let column = apply_options(ColumnDef::new(column, column_type), args.get(3));
                self.statements
                    .push(MigrationStatement::AddColumn { table, column });
            }
            "remove_column" => {
                let table = name_arg(0, "a table name")?;
                let column = name_arg(1, "a column name")?;
                self.statements
                    .push(MigrationStatement::RemoveColumn { table, column });
            }
            "drop_table" => {
                let table = name_arg(0, "a table name")?;
                self.statements.push(MigrationStatement::DropTable { table });
            }
            _ => warn!(statement = index, method = %method, "skipping unrecognized call"),
        }
        Ok(())
    }

    fn create_table(
        &self,
        index: usize,
        table: String,
        options: Option<&Node>,
        block: Option<&Block>,
    ) -> Result<(TableDef, Vec<MigrationStatement>), ExtractError> {
        let mut def = TableDef::new(table);
        let mut indexes = Vec::new();

        let implicit_id = !matches!(
            options.and_then(|o| o.hash_get("id")),
            Some(Node::Bool { value: false })
        );
        if implicit_id {
            let pk = options
                .and_then(|o| o.hash_get("primary_key"))
                .and_then(Node::as_name)
                .unwrap_or("id");
            def.columns.push(ColumnDef::primary_key(pk));
        }

        let Some(block) = block else {
            return Ok((def, indexes));
        };
        let builder = block.params.first().map(String::as_str);

        for node in &block.body {
            let Node::Call {
                receiver,
                method,
                args,
                ..
            } = node
            else {
                warn!(statement = index, table = %def.name, kind = node.kind(), "skipping non-call in create_table");
                continue;
            };
            let on_builder = match receiver.as_deref() {
                Some(Node::Ident { name }) => builder.is_none_or(|b| b == name),
                _ => false,
            };
            if !on_builder {
                warn!(statement = index, table = %def.name, method = %method, "skipping call outside table builder");
                continue;
            }

            let err = |message: String| ExtractError::new(index, format!("create_table.{}", method), message);
            let (names, opts) = split_options(args);

            match method.as_str() {
                "timestamps" => {
                    for name in ["created_at", "updated_at"] {
                        def.columns
                            .push(ColumnDef::new(name, ColumnType::DateTime).not_null());
                    }
                }
                "references" | "belongs_to" => {
                    if names.is_empty() {
                        return Err(err("expected a reference name".to_string()));
                    }
                    for reference in names {
                        let reference = reference
                            .as_name()
                            .ok_or_else(|| err(format!("expected a reference name, got {}", reference.kind())))?;
                        let column = format!("{}_id", reference);
                        def.columns.push(apply_options(
                            ColumnDef::new(&column, ColumnType::Integer),
                            opts,
                        ));
                        if let Some(fk) = foreign_key(&column, reference, opts) {
                            def.foreign_keys.push(fk);
                        }
                    }
                }
                "column" => {
                    let name = names
                        .first()
                        .and_then(|n| n.as_name())
                        .ok_or_else(|| err("expected a column name".to_string()))?;
                    let type_name = names
                        .get(1)
                        .and_then(|n| n.as_name())
                        .ok_or_else(|| err("expected a column type".to_string()))?;
                    let column_type = ColumnType::parse(type_name)
                        .ok_or_else(|| err(format!("unknown column type '{}'", type_name)))?;
                    def.columns
                        .push(apply_options(ColumnDef::new(name, column_type), opts));
                }
                "index" => {
                    let columns = index_columns(names.first().copied())
                        .ok_or_else(|| err("expected index columns".to_string()))?;
                    indexes.push(add_index(def.name.clone(), columns, opts));
                }
                other => match ColumnType::parse(other) {
                    Some(column_type) => {
                        if names.is_empty() {
                            return Err(err("expected a column name".to_string()));
                        }
                        for name in names {
                            let name = name
                                .as_name()
                                .ok_or_else(|| err(format!("expected a column name, got {}", name.kind())))?;
                            def.columns
                                .push(apply_options(ColumnDef::new(name, column_type), opts));
                        }
                    }
                    None => {
                        warn!(statement = index, table = %def.name, method = %other, "skipping unrecognized column method")
                    }
                },
            }
        }

        Ok((def, indexes))
    }
}

/// Split call arguments into positional arguments and a trailing options hash.
fn split_options(args: &[Node]) -> (Vec<&Node>, Option<&Node>) {
    match args.split_last() {
        Some((last @ Node::Hash { .. }, rest)) => (rest.iter().collect(), Some(last)),
        _ => (args.iter().collect(), None),
    }
}

/// Apply `null`, `default` and `limit`. Other options are ignored.
fn apply_options(mut column: ColumnDef, options: Option<&Node>) -> ColumnDef {
    let Some(options) = options else {
        return column;
    };
    if let Some(Node::Bool { value }) = options.hash_get("null") {
        column.nullable = *value;
    }
    if let Some(default) = options.hash_get("default").and_then(Node::to_value) {
        if !default.is_null() {
            column.default = Some(default);
        }
    }
    if let Some(limit) = options
        .hash_get("limit")
        .and_then(Node::to_value)
        .as_ref()
        .and_then(Value::as_i64)
        .and_then(|l| u32::try_from(l).ok())
    {
        column.limit = Some(limit);
    }
    column
}

/// `foreign_key: true` references `<pluralized reference>.id`;
/// `foreign_key: { to_table: :x }` names the table explicitly.
fn foreign_key(column: &str, reference: &str, options: Option<&Node>) -> Option<ForeignKey> {
    let ref_table = match options?.hash_get("foreign_key")? {
        Node::Bool { value: true } => pluralize(reference),
        hash @ Node::Hash { .. } => hash
            .hash_get("to_table")
            .and_then(Node::as_name)
            .map(str::to_string)
            .unwrap_or_else(|| pluralize(reference)),
        _ => return None,
    };
    Some(ForeignKey {
        column: column.to_string(),
        ref_table,
        ref_column: "id".to_string(),
    })
}

fn index_columns(node: Option<&Node>) -> Option<Vec<String>> {
    match node? {
        Node::Array { items } if !items.is_empty() => items
            .iter()
            .map(|item| item.as_name().map(str::to_string))
            .collect(),
        other => other.as_name().map(|name| vec![name.to_string()]),
    }
}

fn add_index(table: String, columns: Vec<String>, options: Option<&Node>) -> MigrationStatement {
    let unique = matches!(
        options.and_then(|o| o.hash_get("unique")),
        Some(Node::Bool { value: true })
    );
    let name = options
        .and_then(|o| o.hash_get("name"))
        .and_then(Node::as_name)
        .map(str::to_string);
    MigrationStatement::AddIndex {
        table,
        columns,
        unique,
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use pretty_assertions::assert_eq;

    fn t(method: &str, args: Vec<Node>) -> Node {
        send(ident("t"), method, args)
    }

    fn source(body: Vec<Node>) -> MigrationSource {
        MigrationSource::new("20240101000000", body)
    }

    #[test]
    fn test_create_table_with_implicit_id_and_options() {
        let body = vec![call_with_block(
            "create_table",
            vec![sym("users")],
            "t",
            vec![
                t("string", vec![sym("email"), hash([("null", bool(false)), ("limit", int(120))])]),
                t("boolean", vec![sym("active"), hash([("default", bool(true))])]),
                t("timestamps", vec![]),
            ],
        )];

        let extraction = SchemaExtractor::extract(&source(body));
        assert!(extraction.is_clean());
        let MigrationStatement::CreateTable(def) = &extraction.migration.statements[0] else {
            panic!("expected create_table");
        };

        let names: Vec<&str> = def.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "active", "created_at", "updated_at"]);

        assert!(def.columns[0].primary_key && def.columns[0].auto_increment);
        let email = def.column("email").unwrap();
        assert!(!email.nullable);
        assert_eq!(email.limit, Some(120));
        assert_eq!(def.column("active").unwrap().default, Some(Value::Bool(true)));
        assert!(!def.column("created_at").unwrap().nullable);
    }

    #[test]
    fn test_id_false_and_unknown_options() {
        let body = vec![call_with_block(
            "create_table",
            vec![sym("tags"), hash([("id", bool(false))])],
            "t",
            vec![t("string", vec![sym("label"), hash([("collation", str("C"))])])],
        )];

        let extraction = SchemaExtractor::extract(&source(body));
        let MigrationStatement::CreateTable(def) = &extraction.migration.statements[0] else {
            panic!("expected create_table");
        };
        assert_eq!(def.columns, vec![ColumnDef::new("label", ColumnType::String)]);
    }

    #[test]
    fn test_references_with_foreign_key() {
        let body = vec![call_with_block(
            "create_table",
            vec![sym("posts")],
            "t",
            vec![
                t("references", vec![sym("author"), hash([("foreign_key", bool(true))])]),
                t("belongs_to", vec![sym("category")]),
            ],
        )];

        let extraction = SchemaExtractor::extract(&source(body));
        let MigrationStatement::CreateTable(def) = &extraction.migration.statements[0] else {
            panic!("expected create_table");
        };
        assert_eq!(def.column("author_id").unwrap().column_type, ColumnType::Integer);
        assert!(def.column("category_id").is_some());
        assert_eq!(
            def.foreign_keys,
            vec![ForeignKey {
                column: "author_id".into(),
                ref_table: "authors".into(),
                ref_column: "id".into(),
            }]
        );
    }

    #[test]
    fn test_descends_into_change_not_down() {
        let body = vec![Node::Class {
            name: "CreateThings".into(),
            superclass: Some("ActiveRecord::Migration".into()),
            body: vec![
                Node::Def {
                    name: "up".into(),
                    body: vec![call("drop_table", vec![sym("old")])],
                },
                Node::Def {
                    name: "down".into(),
                    body: vec![call("drop_table", vec![sym("never")])],
                },
            ],
        }];

        let extraction = SchemaExtractor::extract(&source(body));
        assert_eq!(
            extraction.migration.statements,
            vec![MigrationStatement::DropTable { table: "old".into() }]
        );
    }

    #[test]
    fn test_index_column_and_remove() {
        let body = vec![
            call(
                "add_index",
                vec![
                    sym("posts"),
                    Node::Array {
                        items: vec![sym("author_id"), sym("created_at")],
                    },
                    hash([("unique", bool(true))]),
                ],
            ),
            call("add_column", vec![sym("posts"), sym("views"), sym("integer"), hash([("default", int(0))])]),
            call("remove_column", vec![sym("posts"), sym("legacy")]),
        ];

        let statements = SchemaExtractor::extract(&source(body)).migration.statements;
        assert_eq!(
            statements[0],
            MigrationStatement::AddIndex {
                table: "posts".into(),
                columns: vec!["author_id".into(), "created_at".into()],
                unique: true,
                name: None,
            }
        );
        assert_eq!(
            statements[1],
            MigrationStatement::AddColumn {
                table: "posts".into(),
                column: ColumnDef::new("views", ColumnType::Integer).with_default(0i64),
            }
        );
        assert_eq!(
            statements[2],
            MigrationStatement::RemoveColumn {
                table: "posts".into(),
                column: "legacy".into(),
            }
        );
    }

    #[test]
    fn test_bad_statement_does_not_abort() {
        let body = vec![
            call("add_index", vec![int(1)]),
            call("execute", vec![str("VACUUM")]),
            call("add_column", vec![sym("users"), sym("age"), sym("hologram")]),
            call("drop_table", vec![sym("sessions")]),
        ];

        let extraction = SchemaExtractor::extract(&source(body));
        assert_eq!(
            extraction.migration.statements,
            vec![MigrationStatement::DropTable {
                table: "sessions".into()
            }]
        );
        let failed: Vec<(usize, &str)> = extraction
            .errors
            .iter()
            .map(|e| (e.statement, e.method.as_str()))
            .collect();
        assert_eq!(failed, vec![(0, "add_index"), (2, "add_column")]);
    }

    #[test]
    fn test_index_inside_create_table() {
        let body = vec![call_with_block(
            "create_table",
            vec![sym("accounts")],
            "t",
            vec![
                t("string", vec![sym("slug")]),
                t("index", vec![sym("slug"), hash([("unique", bool(true)), ("name", str("by_slug"))])]),
            ],
        )];

        let statements = SchemaExtractor::extract(&source(body)).migration.statements;
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1],
            MigrationStatement::AddIndex {
                table: "accounts".into(),
                columns: vec!["slug".into()],
                unique: true,
                name: Some("by_slug".into()),
            }
        );
    }
}
