//! Condition types for building WHERE clauses.
//!
//! A [`ConditionTree`] is an immutable predicate: an AND-chain of plain
//! conditions and `NOT (...)` groups kept in insertion order, OR-ed against
//! any number of alternative groups.
//!
//! ```rust
//! use quarry_query::filter::{eq, is_in, ConditionTree};
//! use quarry_query::{Dialect, SqlBuilder};
//!
//! let tree = ConditionTree::default()
//!     .with_conditions(vec![eq("active", true)])
//!     .with_negated(vec![is_in("role", vec!["guest", "bot"])]);
//!
//! let mut builder = SqlBuilder::new(Dialect::PostgreSQL);
//! tree.write_sql(&mut builder).unwrap();
//! let (sql, values) = builder.build();
//! assert_eq!(sql, "active = $1 AND NOT (role IN ($2, $3))");
//! assert_eq!(values.len(), 3);
//! ```

use std::sync::Arc;

use crate::error::{QueryError, QueryResult};
use crate::row::Row;
use crate::sql::SqlBuilder;
use crate::value::{Operand, Value};

/// A single predicate term.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value` (`column IS NULL` when the value is null).
    Eq(String, Value),
    /// `column IN (values...)`. An empty list renders `column IN ()`.
    In(String, Vec<Value>),
    /// `column IS NULL`.
    IsNull(String),
    /// A raw SQL fragment using `?` placeholders, with its values.
    Raw(String, Vec<Value>),
}

impl Condition {
    /// Build a condition from a hash-style `column => operand` pair.
    pub fn from_pair(column: impl Into<String>, operand: impl Into<Operand>) -> Self {
        let column = column.into();
        match operand.into() {
            Operand::Value(Value::Null) => Self::IsNull(column),
            Operand::Value(value) => Self::Eq(column, value),
            Operand::List(values) => Self::In(column, values),
        }
    }

    /// Check if this is a raw fragment.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(..))
    }

    /// Number of values this condition binds.
    pub fn value_count(&self) -> usize {
        match self {
            Self::Eq(_, v) if v.is_null() => 0,
            Self::Eq(..) => 1,
            Self::In(_, values) | Self::Raw(_, values) => values.len(),
            Self::IsNull(_) => 0,
        }
    }

    /// Render this condition, pushing its values onto the builder.
    pub fn write_sql(&self, builder: &mut SqlBuilder) -> QueryResult<()> {
        match self {
            Self::Eq(col, value) if value.is_null() => {
                builder.push(col).push(" IS NULL");
            }
            Self::Eq(col, value) => {
                builder.push(col).push(" = ").push_param(value.clone());
            }
            Self::In(col, values) => {
                builder.push(col).push(" IN (").push_params(values).push(")");
            }
            Self::IsNull(col) => {
                builder.push(col).push(" IS NULL");
            }
            Self::Raw(fragment, values) => {
                validate_raw(fragment, values)?;
                write_raw(fragment, values, builder);
            }
        }
        Ok(())
    }
}

/// `column = value`, or `column IS NULL` for a null value.
pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Condition {
    Condition::from_pair(column, Operand::Value(value.into()))
}

/// `column IN (values...)`.
pub fn is_in<T: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = T>) -> Condition {
    Condition::In(column.into(), values.into_iter().map(Into::into).collect())
}

/// `column IS NULL`.
pub fn is_null(column: impl Into<String>) -> Condition {
    Condition::IsNull(column.into())
}

/// A raw SQL fragment with `?` placeholders.
pub fn raw(fragment: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Condition {
    Condition::Raw(fragment.into(), values.into_iter().collect())
}

/// Placeholder positions of a raw fragment, skipping quoted text.
fn raw_placeholder_positions(fragment: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut in_single = false;
    let mut in_double = false;
    for (i, c) in fragment.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '?' if !in_single && !in_double => positions.push(i),
            _ => {}
        }
    }
    positions
}

fn validate_raw(fragment: &str, values: &[Value]) -> QueryResult<()> {
    let expected = raw_placeholder_positions(fragment).len();
    if expected == values.len() {
        return Ok(());
    }

    let err = if fragment.to_ascii_uppercase().contains("BETWEEN") && values.len() < expected {
        QueryError::validation(format!(
            "BETWEEN fragment `{}` needs {} values, got {}",
            fragment,
            expected,
            values.len()
        ))
        .with_suggestion("Pass both bounds: where_raw(\"col BETWEEN ? AND ?\", [low, high])")
    } else {
        QueryError::validation(format!(
            "raw condition `{}` has {} placeholders but {} values were supplied",
            fragment,
            expected,
            values.len()
        ))
    };
    Err(err.with_context("compiling raw condition"))
}

fn write_raw(fragment: &str, values: &[Value], builder: &mut SqlBuilder) {
    let mut last = 0;
    for (pos, value) in raw_placeholder_positions(fragment).into_iter().zip(values) {
        builder.push(&fragment[last..pos]).push_param(value.clone());
        last = pos + 1;
    }
    builder.push(&fragment[last..]);
}

/// One link of the AND-chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Conjunct {
    /// A plain condition.
    Condition(Condition),
    /// A group rendered as `NOT (a AND b ...)`.
    Not(Vec<Condition>),
}

/// Anything that can be turned into an ordered list of AND-ed conditions.
pub trait IntoConditions {
    /// Convert into conditions, preserving order.
    fn into_conditions(self) -> Vec<Condition>;
}

impl IntoConditions for Condition {
    fn into_conditions(self) -> Vec<Condition> {
        vec![self]
    }
}

impl IntoConditions for Vec<Condition> {
    fn into_conditions(self) -> Vec<Condition> {
        self
    }
}

impl<const N: usize> IntoConditions for [Condition; N] {
    fn into_conditions(self) -> Vec<Condition> {
        self.into_iter().collect()
    }
}

impl<K: Into<String>, O: Into<Operand>> IntoConditions for (K, O) {
    fn into_conditions(self) -> Vec<Condition> {
        vec![Condition::from_pair(self.0, self.1)]
    }
}

impl<K: Into<String>, O: Into<Operand>> IntoConditions for Vec<(K, O)> {
    fn into_conditions(self) -> Vec<Condition> {
        self.into_iter().map(|(k, o)| Condition::from_pair(k, o)).collect()
    }
}

impl<K: Into<String>, O: Into<Operand>, const N: usize> IntoConditions for [(K, O); N] {
    fn into_conditions(self) -> Vec<Condition> {
        self.into_iter().map(|(k, o)| Condition::from_pair(k, o)).collect()
    }
}

/// An immutable predicate.
///
/// Appending produces a new tree; lists that were not touched stay shared
/// with the tree they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTree {
    conjuncts: Arc<Vec<Conjunct>>,
    alternatives: Arc<Vec<Vec<Condition>>>,
}

impl ConditionTree {
    /// An empty tree renders no WHERE clause at all.
    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty() && self.alternatives.is_empty()
    }

    /// The AND-chain in insertion order.
    pub fn conjuncts(&self) -> &[Conjunct] {
        &self.conjuncts
    }

    /// Plain (non-negated) conditions of the AND-chain, in order.
    pub fn base(&self) -> impl Iterator<Item = &Condition> {
        self.conjuncts.iter().filter_map(|c| match c {
            Conjunct::Condition(c) => Some(c),
            Conjunct::Not(_) => None,
        })
    }

    /// NOT groups of the AND-chain, in order.
    pub fn negated(&self) -> impl Iterator<Item = &[Condition]> {
        self.conjuncts.iter().filter_map(|c| match c {
            Conjunct::Not(group) => Some(group.as_slice()),
            Conjunct::Condition(_) => None,
        })
    }

    /// OR-ed alternative groups, in order.
    pub fn alternatives(&self) -> &[Vec<Condition>] {
        &self.alternatives
    }

    /// Iterate every condition in render order.
    pub fn iter_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conjuncts
            .iter()
            .flat_map(|c| match c {
                Conjunct::Condition(c) => std::slice::from_ref(c),
                Conjunct::Not(group) => group.as_slice(),
            })
            .chain(self.alternatives.iter().flatten())
    }

    /// Append conditions to the AND-chain.
    pub fn with_conditions(&self, conditions: Vec<Condition>) -> Self {
        if conditions.is_empty() {
            return self.clone();
        }
        let mut conjuncts = Vec::with_capacity(self.conjuncts.len() + conditions.len());
        conjuncts.extend(self.conjuncts.iter().cloned());
        conjuncts.extend(conditions.into_iter().map(Conjunct::Condition));
        Self {
            conjuncts: Arc::new(conjuncts),
            alternatives: Arc::clone(&self.alternatives),
        }
    }

    /// Append a NOT group to the AND-chain.
    pub fn with_negated(&self, group: Vec<Condition>) -> Self {
        if group.is_empty() {
            return self.clone();
        }
        let mut conjuncts = Vec::with_capacity(self.conjuncts.len() + 1);
        conjuncts.extend(self.conjuncts.iter().cloned());
        conjuncts.push(Conjunct::Not(group));
        Self {
            conjuncts: Arc::new(conjuncts),
            alternatives: Arc::clone(&self.alternatives),
        }
    }

    /// Append an OR-ed alternative group.
    pub fn with_alternative(&self, group: Vec<Condition>) -> Self {
        if group.is_empty() {
            return self.clone();
        }
        let mut alternatives = Vec::with_capacity(self.alternatives.len() + 1);
        alternatives.extend(self.alternatives.iter().cloned());
        alternatives.push(group);
        Self {
            conjuncts: Arc::clone(&self.conjuncts),
            alternatives: Arc::new(alternatives),
        }
    }

    /// Render the predicate (without the `WHERE` keyword).
    ///
    /// The AND-chain is parenthesized only when alternatives follow it.
    pub fn write_sql(&self, builder: &mut SqlBuilder) -> QueryResult<()> {
        let has_chain = !self.conjuncts.is_empty();
        let has_alternatives = !self.alternatives.is_empty();

        if has_chain {
            if has_alternatives {
                builder.push("(");
            }
            for (i, conjunct) in self.conjuncts.iter().enumerate() {
                if i > 0 {
                    builder.push(" AND ");
                }
                match conjunct {
                    Conjunct::Condition(condition) => condition.write_sql(builder)?,
                    Conjunct::Not(group) => {
                        builder.push("NOT (");
                        write_group(group, builder)?;
                        builder.push(")");
                    }
                }
            }
            if has_alternatives {
                builder.push(")");
            }
        }

        for (i, group) in self.alternatives.iter().enumerate() {
            if has_chain || i > 0 {
                builder.push(" OR ");
            }
            builder.push("(");
            write_group(group, builder)?;
            builder.push(")");
        }

        Ok(())
    }
}

fn write_group(group: &[Condition], builder: &mut SqlBuilder) -> QueryResult<()> {
    for (i, condition) in group.iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        condition.write_sql(builder)?;
    }
    Ok(())
}

/// A condition tree evaluated against already-loaded rows instead of SQL.
///
/// Raw fragments cannot be evaluated in memory, so [`MemoryFilter::compile`]
/// returns `None` for trees containing one and the caller falls back to SQL.
#[derive(Debug, Clone)]
pub struct MemoryFilter {
    tree: ConditionTree,
}

impl MemoryFilter {
    /// Compile a tree, or `None` when it cannot be evaluated in memory.
    pub fn compile(tree: &ConditionTree) -> Option<Self> {
        if tree.iter_conditions().any(Condition::is_raw) {
            return None;
        }
        Some(Self { tree: tree.clone() })
    }

    /// Check whether `row` satisfies the predicate.
    ///
    /// Evaluation is three-valued like SQL: a comparison with a missing or
    /// null column is unknown, `NOT` of unknown stays unknown, and only a
    /// definite true matches.
    pub fn matches(&self, row: &Row) -> bool {
        let chain = (!self.tree.conjuncts.is_empty()).then(|| {
            all(self.tree.conjuncts.iter().map(|conjunct| match conjunct {
                Conjunct::Condition(c) => evaluate(c, row),
                Conjunct::Not(group) => all(group.iter().map(|c| evaluate(c, row))).map(|v| !v),
            }))
        });

        if chain.is_none() && self.tree.alternatives.is_empty() {
            return true;
        }

        let alternatives = self
            .tree
            .alternatives
            .iter()
            .map(|group| all(group.iter().map(|c| evaluate(c, row))));
        any(chain.into_iter().chain(alternatives)) == Some(true)
    }

    /// Keep the rows that satisfy the predicate.
    pub fn filter<'r>(&self, rows: impl IntoIterator<Item = &'r Row>) -> Vec<&'r Row> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

/// SQL `AND` over truth values, `None` being unknown.
fn all(values: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut result = Some(true);
    for value in values {
        match value {
            Some(false) => return Some(false),
            None => result = None,
            Some(true) => {}
        }
    }
    result
}

/// SQL `OR` over truth values, `None` being unknown.
fn any(values: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut result = Some(false);
    for value in values {
        match value {
            Some(true) => return Some(true),
            None => result = None,
            Some(false) => {}
        }
    }
    result
}

fn evaluate(condition: &Condition, row: &Row) -> Option<bool> {
    match condition {
        Condition::Eq(col, expected) if expected.is_null() => Some(is_null_in(row, col)),
        Condition::Eq(col, expected) => {
            let actual = row.get(col).filter(|v| !v.is_null())?;
            Some(values_equal(actual, expected))
        }
        Condition::In(_, list) if list.is_empty() => Some(false),
        Condition::In(col, list) => {
            let actual = row.get(col).filter(|v| !v.is_null())?;
            any(list.iter().map(|expected| {
                (!expected.is_null()).then(|| values_equal(actual, expected))
            }))
        }
        Condition::IsNull(col) => Some(is_null_in(row, col)),
        // compile() rejects raw fragments
        Condition::Raw(..) => None,
    }
}

fn is_null_in(row: &Row, column: &str) -> bool {
    row.get(column).is_none_or(Value::is_null)
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Dialect;
    use pretty_assertions::assert_eq;

    fn render(tree: &ConditionTree, dialect: Dialect) -> QueryResult<(String, Vec<Value>)> {
        let mut builder = SqlBuilder::new(dialect);
        tree.write_sql(&mut builder)?;
        Ok(builder.build())
    }

    #[test]
    fn test_pair_shapes() {
        assert_eq!(Condition::from_pair("a", 1), Condition::Eq("a".into(), Value::Int(1)));
        assert_eq!(Condition::from_pair("a", None::<i64>), Condition::IsNull("a".into()));
        assert_eq!(
            Condition::from_pair("a", vec![1, 2]),
            Condition::In("a".into(), vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_empty_in_is_inert() {
        let tree = ConditionTree::default().with_conditions(vec![is_in::<i64>("id", vec![])]);
        let (sql, values) = render(&tree, Dialect::SQLite).unwrap();
        assert_eq!(sql, "id IN ()");
        assert!(values.is_empty());
    }

    #[test]
    fn test_raw_numbering_continues_across_terms() {
        let tree = ConditionTree::default()
            .with_conditions(vec![eq("a", 1)])
            .with_conditions(vec![raw("b > ? AND c < ?", [Value::Int(2), Value::Int(3)])])
            .with_negated(vec![eq("d", 4)]);
        let (sql, values) = render(&tree, Dialect::PostgreSQL).unwrap();
        assert_eq!(sql, "a = $1 AND b > $2 AND c < $3 AND NOT (d = $4)");
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]);
    }

    #[test]
    fn test_raw_ignores_quoted_question_marks() {
        let tree = ConditionTree::default()
            .with_conditions(vec![raw("title = '?' AND id = ?", [Value::Int(1)])]);
        let (sql, _) = render(&tree, Dialect::PostgreSQL).unwrap();
        assert_eq!(sql, "title = '?' AND id = $1");
    }

    #[test]
    fn test_raw_count_mismatch_is_validation_error() {
        let tree = ConditionTree::default().with_conditions(vec![raw("a = ?", [])]);
        let err = render(&tree, Dialect::SQLite).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_between_with_one_value() {
        let tree = ConditionTree::default()
            .with_conditions(vec![raw("age BETWEEN ? AND ?", [Value::Int(18)])]);
        let err = render(&tree, Dialect::SQLite).unwrap_err();
        assert!(err.is_validation());
        assert!(err.message.contains("BETWEEN"));
    }

    #[test]
    fn test_alternatives_without_chain() {
        let tree = ConditionTree::default()
            .with_alternative(vec![eq("a", 1)])
            .with_alternative(vec![eq("b", 2), eq("c", 3)]);
        let (sql, _) = render(&tree, Dialect::PostgreSQL).unwrap();
        assert_eq!(sql, "(a = $1) OR (b = $2 AND c = $3)");
    }

    #[test]
    fn test_parent_tree_is_untouched() {
        let parent = ConditionTree::default().with_conditions(vec![eq("a", 1)]);
        let child = parent.with_negated(vec![eq("b", 2)]);
        assert_eq!(parent.conjuncts().len(), 1);
        assert_eq!(child.conjuncts().len(), 2);
        assert!(Arc::ptr_eq(&parent.alternatives, &child.alternatives));
    }

    #[test]
    fn test_memory_filter() {
        let tree = ConditionTree::default()
            .with_conditions(vec![eq("active", true)])
            .with_negated(vec![eq("role", "bot")])
            .with_alternative(vec![is_null("deleted_at"), eq("id", 7)]);
        let filter = MemoryFilter::compile(&tree).unwrap();

        let mut row = Row::new();
        row.insert("active".into(), Value::Bool(true));
        row.insert("role".into(), Value::from("admin"));
        assert!(filter.matches(&row));

        row.insert("role".into(), Value::from("bot"));
        assert!(!filter.matches(&row));

        row.insert("id".into(), Value::Float(7.0));
        assert!(filter.matches(&row));
    }

    #[test]
    fn test_memory_filter_null_inside_not_is_excluded() {
        let tree = ConditionTree::default().with_negated(vec![eq("role", "bot")]);
        let filter = MemoryFilter::compile(&tree).unwrap();

        let mut row = Row::new();
        row.insert("role".into(), Value::Null);
        assert!(!filter.matches(&row));
        assert!(!filter.matches(&Row::new()));

        row.insert("role".into(), Value::from("admin"));
        assert!(filter.matches(&row));
    }

    #[test]
    fn test_memory_filter_unknown_or_true_matches() {
        let tree = ConditionTree::default()
            .with_conditions(vec![eq("role", "admin")])
            .with_alternative(vec![is_in("id", vec![1, 2])]);
        let filter = MemoryFilter::compile(&tree).unwrap();

        let mut row = Row::new();
        row.insert("id".into(), Value::Int(2));
        assert!(filter.matches(&row));

        row.insert("id".into(), Value::Int(3));
        assert!(!filter.matches(&row));
    }

    #[test]
    fn test_memory_filter_rejects_raw() {
        let tree = ConditionTree::default().with_conditions(vec![raw("lower(name) = ?", [Value::from("x")])]);
        assert!(MemoryFilter::compile(&tree).is_none());
    }
}
