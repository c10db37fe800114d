//! In-memory executor shared by the integration tests.
//!
//! It understands just enough SQL to serve the statements quarry compiles:
//! `SELECT ... FROM t [WHERE col = ? | col IN (...) | col IS NULL] [ORDER BY col] [LIMIT n]`,
//! `SELECT COUNT(*) as count FROM t` and `INSERT INTO t (...) VALUES (...)`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use quarry_query::{Executor, QueryError, QueryOutput, QueryResult, Row, Value};

#[derive(Default)]
pub struct MemoryExecutor {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    failing_table: Option<String>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, table: &str, rows: Vec<Row>) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), rows);
        self
    }

    /// Every query against `table` fails as if cancelled.
    pub fn failing_on(mut self, table: &str) -> Self {
        self.failing_table = Some(table.to_string());
        self
    }

    pub fn query_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<(String, Vec<Value>)> {
        self.log.lock().unwrap().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn word_after<'s>(sql: &'s str, marker: &str) -> Option<&'s str> {
    let start = sql.find(marker)? + marker.len();
    sql[start..].split_whitespace().next()
}

fn matches_value(actual: Option<&Value>, expected: &Value) -> bool {
    actual.is_some_and(|v| !v.is_null() && v == expected)
}

#[async_trait]
impl Executor for MemoryExecutor {
    async fn execute(&self, sql: &str, values: Vec<Value>) -> QueryResult<QueryOutput> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), values.clone()));

        if let Some(table) = word_after(sql, "INSERT INTO ") {
            let columns_start = sql.find('(').unwrap_or(sql.len());
            let columns_end = sql.find(')').unwrap_or(sql.len());
            let columns: Vec<&str> = sql
                .get(columns_start + 1..columns_end)
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();

            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            let id = rows.len() as i64 + 1;
            let mut new_row = row(&[("id", Value::Int(id))]);
            for (column, value) in columns.iter().zip(values) {
                new_row.insert(column.to_string(), value);
            }
            rows.push(new_row);
            return Ok(QueryOutput::affected(1, Some(Value::Int(id))));
        }

        let table = word_after(sql, " FROM ")
            .ok_or_else(|| QueryError::database(format!("unsupported statement: {}", sql)))?;
        if self.failing_table.as_deref() == Some(table) {
            return Err(QueryError::cancelled(format!("query on {} cancelled", table)));
        }

        let mut rows = self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default();

        if let Some(column) = word_after(sql, " WHERE ") {
            match word_after(sql, &format!(" WHERE {} ", column)) {
                Some("IN") => rows.retain(|r| values.iter().any(|v| matches_value(r.get(column), v))),
                Some("=") => rows.retain(|r| matches_value(r.get(column), &values[0])),
                Some("IS") => rows.retain(|r| r.get(column).is_none_or(Value::is_null)),
                _ => {}
            }
        }

        if let Some(column) = word_after(sql, " ORDER BY ") {
            let descending = word_after(sql, &format!(" ORDER BY {} ", column))
                .is_some_and(|dir| dir.starts_with("DESC"));
            rows.sort_by_key(|r| r.get(column).and_then(Value::as_i64));
            if descending {
                rows.reverse();
            }
        }

        if let Some(limit) = word_after(sql, " LIMIT ").and_then(|n| n.parse::<usize>().ok()) {
            rows.truncate(limit);
        }

        if sql.starts_with("SELECT COUNT(") {
            return Ok(QueryOutput::from_rows(vec![row(&[(
                "count",
                Value::Int(rows.len() as i64),
            )])]));
        }

        Ok(QueryOutput::from_rows(rows))
    }
}
