//! SQLite-backed executor shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use quarry::query::{Executor, QueryError, QueryOutput, QueryResult, Row, Value};
use rusqlite::types::Value as SqliteValue;
use rusqlite::{params_from_iter, Connection};

pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    pub fn open() -> Self {
        Self {
            conn: Mutex::new(Connection::open_in_memory().unwrap()),
        }
    }

    pub fn count(&self, table: &str) -> i64 {
        self.conn
            .lock()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    pub fn columns(&self, table: &str) -> Vec<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{}')", table))
            .unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        columns
    }
}

fn to_sqlite(value: Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(b as i64),
        Value::Int(i) => SqliteValue::Integer(i),
        Value::Float(f) => SqliteValue::Real(f),
        Value::String(s) => SqliteValue::Text(s),
        Value::Timestamp(t) => SqliteValue::Text(t.to_rfc3339()),
    }
}

fn from_sqlite(value: SqliteValue) -> Value {
    match value {
        SqliteValue::Null => Value::Null,
        SqliteValue::Integer(i) => Value::Int(i),
        SqliteValue::Real(f) => Value::Float(f),
        SqliteValue::Text(s) => Value::String(s),
        SqliteValue::Blob(_) => Value::Null,
    }
}

fn db_error(e: rusqlite::Error) -> QueryError {
    QueryError::database(e.to_string())
}

#[async_trait]
impl Executor for SqliteExecutor {
    async fn execute(&self, sql: &str, values: Vec<Value>) -> QueryResult<QueryOutput> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql).map_err(db_error)?;
        let params = params_from_iter(values.into_iter().map(to_sqlite));

        if stmt.column_count() == 0 {
            let affected = stmt.execute(params).map_err(db_error)?;
            return Ok(QueryOutput::affected(
                affected as u64,
                Some(Value::Int(conn.last_insert_rowid())),
            ));
        }

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params).map_err(db_error)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(db_error)? {
            let mut record = Row::default();
            for (i, name) in names.iter().enumerate() {
                let value: SqliteValue = row.get(i).map_err(db_error)?;
                record.insert(name.clone(), from_sqlite(value));
            }
            out.push(record);
        }
        Ok(QueryOutput::from_rows(out))
    }
}
