//! Seed extraction and idempotent seed SQL.
//!
//! The extractor records the "stop if `Model` already has rows" guard and
//! every literal `Model.create(...)` / `create!` / `insert` call. The
//! generator does not re-emit the guard; each insert is instead conditioned
//! on an empty marker table, and the marker row is written last, so running
//! the script again inserts nothing.

use indexmap::IndexMap;
use quarry_query::{Dialect, Value};
use tracing::{debug, info, warn};

use crate::ast::{Node, Pair};
use crate::error::ExtractError;
use crate::inflect::tableize;
use crate::script::{Script, Section, Statement};
use crate::sql::GeneratorOptions;

const INSERT_METHODS: &[&str] = &["create", "create!", "insert"];
const TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// One row to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedInsert {
    /// Model constant the row was created through.
    pub model: String,
    /// Target table (pluralized snake_case model name).
    pub table: String,
    /// Literal attributes in source order.
    pub attributes: IndexMap<String, Value>,
}

/// Everything extracted from a seed description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPlan {
    /// Model named by the idempotency guard, if one was found.
    pub guard: Option<String>,
    pub inserts: Vec<SeedInsert>,
    pub errors: Vec<ExtractError>,
}

/// Walks a seed body and builds a [`SeedPlan`].
#[derive(Debug, Default)]
pub struct SeedExtractor {
    plan: SeedPlan,
    index: usize,
}

impl SeedExtractor {
    /// Extract the seed plan from a body.
    pub fn extract(body: &[Node]) -> SeedPlan {
        let mut extractor = Self::default();
        extractor.visit_body(body);
        debug!(
            guard = ?extractor.plan.guard,
            inserts = extractor.plan.inserts.len(),
            errors = extractor.plan.errors.len(),
            "extracted seeds"
        );
        extractor.plan
    }

    fn visit_body(&mut self, body: &[Node]) {
        for node in body {
            self.visit(node);
        }
    }

    fn visit(&mut self, node: &Node) {
        let index = self.index;
        self.index += 1;

        match node {
            Node::If { condition, then } => {
                let returns = then.iter().any(|n| matches!(n, Node::Return { .. }));
                match guard_model(condition) {
                    Some(model) if returns => self.record_guard(model),
                    _ => self.visit_body(then),
                }
            }
            // `unless Model.exists? ... end` wraps the inserts instead of returning early.
            Node::Unless { condition, then } => {
                if let Some(model) = guard_model(condition) {
                    self.record_guard(model);
                }
                self.visit_body(then);
            }
            Node::Def { body, .. } | Node::Class { body, .. } => self.visit_body(body),
            Node::Call {
                receiver,
                method,
                args,
                block,
            } => {
                let model = receiver.as_deref().and_then(Node::as_const);
                match model {
                    Some(model) if INSERT_METHODS.contains(&method.as_str()) => {
                        if let Err(err) = self.inserts(index, model, method, args) {
                            warn!(statement = index, method = %method, error = %err.message, "skipping malformed seed");
                            self.plan.errors.push(err);
                        }
                    }
                    _ if block.is_none() => {
                        warn!(statement = index, method = %method, "skipping unrecognized seed call")
                    }
                    _ => {}
                }
                if let Some(block) = block {
                    self.visit_body(&block.body);
                }
            }
            other => debug!(statement = index, kind = other.kind(), "skipping seed statement"),
        }
    }

    fn record_guard(&mut self, model: &str) {
        match &self.plan.guard {
            Some(existing) if existing != model => {
                warn!(guard = %existing, ignored = %model, "seed file has more than one guard")
            }
            Some(_) => {}
            None => self.plan.guard = Some(model.to_string()),
        }
    }

    fn inserts(
        &mut self,
        index: usize,
        model: &str,
        method: &str,
        args: &[Node],
    ) -> Result<(), ExtractError> {
        let hashes: Vec<&[Pair]> = match args {
            [Node::Hash { pairs }] => vec![pairs.as_slice()],
            [Node::Array { items }] => items
                .iter()
                .map(Node::as_hash)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| ExtractError::new(index, method, "expected an array of attribute hashes"))?,
            _ => {
                return Err(ExtractError::new(
                    index,
                    method,
                    format!("expected one attribute hash for {}", model),
                ));
            }
        };

        let table = tableize(model);
        for pairs in hashes {
            match literal_attributes(pairs) {
                Some(attributes) => self.plan.inserts.push(SeedInsert {
                    model: model.to_string(),
                    table: table.clone(),
                    attributes,
                }),
                None => warn!(statement = index, model = %model, "skipping seed with non-literal attributes"),
            }
        }
        Ok(())
    }
}

/// `Model.count > 0`, `Model.exists?` or `Model.any?`.
fn guard_model(condition: &Node) -> Option<&str> {
    match condition {
        Node::Binary { op, lhs, rhs } if op == ">" => match (lhs.as_ref(), rhs.as_ref()) {
            (
                Node::Call {
                    receiver: Some(receiver),
                    method,
                    args,
                    ..
                },
                Node::Int { value: 0 },
            ) if method == "count" && args.is_empty() => receiver.as_const(),
            _ => None,
        },
        Node::Call {
            receiver: Some(receiver),
            method,
            ..
        } if method == "exists?" || method == "any?" => receiver.as_const(),
        _ => None,
    }
}

fn literal_attributes(pairs: &[Pair]) -> Option<IndexMap<String, Value>> {
    pairs
        .iter()
        .map(|pair| Some((pair.key.as_name()?.to_string(), pair.value.to_value()?)))
        .collect()
}

/// Renders a [`SeedPlan`] as an idempotent SQL script.
#[derive(Debug, Clone, Default)]
pub struct SeedSqlGenerator {
    options: GeneratorOptions,
}

impl SeedSqlGenerator {
    /// Create a generator.
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Generate the seed script.
    pub fn generate(&self, plan: &SeedPlan) -> Script {
        let dialect = self.options.dialect;
        let marker = &self.options.marker_table;

        let mut header = vec![
            "Seed data".to_string(),
            format!("Generated by quarry for {}.", dialect),
            format!(
                "Safe to run more than once; rows are inserted only while {} is empty.",
                marker
            ),
        ];
        if let Some(guard) = &plan.guard {
            header.push(format!("Guarded model: {}", guard));
        }

        let mut statements: Vec<Statement> =
            plan.inserts.iter().map(|i| Statement::new(self.insert(i))).collect();
        statements.push(Statement::new(format!(
            "INSERT INTO {}(id) SELECT 1{} WHERE NOT EXISTS (SELECT 1 FROM {})",
            marker,
            from_dual(dialect),
            marker
        )));

        info!(dialect = %dialect, inserts = plan.inserts.len(), "generated seed script");
        Script {
            header,
            preamble: vec![Statement::new(format!(
                "CREATE TABLE IF NOT EXISTS {}(id INTEGER PRIMARY KEY)",
                marker
            ))],
            sections: vec![Section {
                version: None,
                title: Some("Seeds".to_string()),
                statements,
            }],
        }
    }

    fn insert(&self, insert: &SeedInsert) -> String {
        let dialect = self.options.dialect;
        let mut columns: Vec<&str> = Vec::with_capacity(insert.attributes.len() + 2);
        let mut values: Vec<String> = Vec::with_capacity(insert.attributes.len() + 2);

        for (column, value) in &insert.attributes {
            columns.push(column);
            values.push(value.to_sql_literal(dialect));
        }
        for column in TIMESTAMP_COLUMNS {
            if !insert.attributes.contains_key(column) {
                columns.push(column);
                values.push("CURRENT_TIMESTAMP".to_string());
            }
        }

        format!(
            "INSERT INTO {} ({}) SELECT {}{} WHERE NOT EXISTS (SELECT 1 FROM {})",
            insert.table,
            columns.join(", "),
            values.join(", "),
            from_dual(dialect),
            self.options.marker_table
        )
    }
}

/// MySQL needs a table reference before `WHERE`.
fn from_dual(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySQL => " FROM DUAL",
        _ => "",
    }
}
