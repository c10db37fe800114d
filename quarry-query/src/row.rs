//! Rows returned by the executor and the records built from them.
//!
//! A [`Row`] is the raw column map an executor hands back. A [`Record`] wraps
//! a row with its model name and any associations the resolver attached.

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Column name to value, in the order the executor returned them.
pub type Row = IndexMap<String, Value>;

/// Resolved association data attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Association {
    /// `BelongsTo` / `HasOne`: the matching record, if any.
    One(Option<Box<Record>>),
    /// `HasMany`: all matching records (possibly none).
    Many(Vec<Record>),
}

impl Association {
    /// The single record, for `One`.
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Self::One(record) => record.as_deref(),
            Self::Many(_) => None,
        }
    }

    /// The record list, for `Many`.
    pub fn as_many(&self) -> Option<&[Record]> {
        match self {
            Self::Many(records) => Some(records),
            Self::One(_) => None,
        }
    }
}

/// A materialized row of a registered model.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Model name the row belongs to.
    pub model: String,
    /// Column values.
    pub fields: Row,
    /// Associations populated by eager loading.
    pub associations: IndexMap<String, Association>,
}

impl Record {
    /// Wrap a row.
    pub fn new(model: impl Into<String>, fields: Row) -> Self {
        Self {
            model: model.into(),
            fields,
            associations: IndexMap::new(),
        }
    }

    /// Get a column value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Get an integer column value.
    pub fn get_i64(&self, column: &str) -> QueryResult<i64> {
        match self.fields.get(column) {
            Some(Value::Int(v)) => Ok(*v),
            Some(other) => Err(QueryError::invalid_data_type(
                column,
                format!("expected integer, got {:?}", other),
            )
            .with_model(&self.model)),
            None => Err(QueryError::invalid_data_type(column, "column missing").with_model(&self.model)),
        }
    }

    /// Get a string column value.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.fields.get(column).and_then(Value::as_str)
    }

    /// Get a loaded association.
    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }

    /// Check whether an association has been loaded.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.associations.contains_key(name)
    }

    /// Attach a resolved association.
    pub(crate) fn set_association(&mut self, name: impl Into<String>, association: Association) {
        self.associations.insert(name.into(), association);
    }

    /// Convert the record graph to JSON.
    ///
    /// Columns come first in row order, then associations in load order.
    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::with_capacity(self.fields.len() + self.associations.len());
        for (column, value) in &self.fields {
            map.insert(column.clone(), value_to_json(value));
        }
        for (name, association) in &self.associations {
            let json = match association {
                Association::One(Some(record)) => record.to_json(),
                Association::One(None) => JsonValue::Null,
                Association::Many(records) => {
                    JsonValue::Array(records.iter().map(Record::to_json).collect())
                }
            };
            map.insert(name.clone(), json);
        }
        JsonValue::Object(map)
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_get_i64() {
        let record = Record::new("User", row(&[("id", Value::Int(1)), ("name", Value::from("a"))]));
        assert_eq!(record.get_i64("id").unwrap(), 1);
        assert!(record.get_i64("name").is_err());
        assert!(record.get_i64("missing").is_err());
        assert_eq!(record.get_str("name"), Some("a"));
    }

    #[test]
    fn test_to_json_with_associations() {
        let mut user = Record::new("User", row(&[("id", Value::Int(1))]));
        let post = Record::new("Post", row(&[("id", Value::Int(10)), ("title", Value::from("Hi"))]));
        user.set_association("posts", Association::Many(vec![post]));
        user.set_association("profile", Association::One(None));

        assert_eq!(
            user.to_json(),
            json!({
                "id": 1,
                "posts": [{"id": 10, "title": "Hi"}],
                "profile": null
            })
        );
    }
}
