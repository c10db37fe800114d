//! Structured description of migration and seed bodies.
//!
//! Both extractors consume a closed [`Node`] enumeration, deserialized from
//! JSON tagged by `"type"`:
//!
//! ```rust
//! use quarry_migrate::ast::{MigrationSource, Node};
//!
//! let source = MigrationSource::from_json(r#"{
//!     "version": "20240101000000",
//!     "body": [
//!         {"type": "call", "method": "drop_table", "args": [{"type": "sym", "value": "legacy"}]}
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(source.body.len(), 1);
//! assert!(matches!(&source.body[0], Node::Call { method, .. } if method == "drop_table"));
//! ```

use quarry_query::Value;
use serde::{Deserialize, Serialize};

use crate::error::MigrateResult;

/// A node of a migration or seed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// `nil`
    Nil,
    /// `true` / `false`
    Bool { value: bool },
    /// Integer literal.
    Int { value: i64 },
    /// Float literal.
    Float { value: f64 },
    /// String literal.
    Str { value: String },
    /// Symbol literal (`:name`).
    Sym { value: String },
    /// Constant reference (`User`).
    Const { name: String },
    /// Local identifier (`t`).
    Ident { name: String },
    /// Array literal.
    Array {
        #[serde(default)]
        items: Vec<Node>,
    },
    /// Hash literal; pairs keep their source order.
    Hash {
        #[serde(default)]
        pairs: Vec<Pair>,
    },
    /// Method call, optionally on a receiver and with a block.
    Call {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<Box<Node>>,
        method: String,
        #[serde(default)]
        args: Vec<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block: Option<Block>,
    },
    /// Binary operator (`a > b`).
    Binary {
        op: String,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// `if` statement or modifier.
    If {
        condition: Box<Node>,
        #[serde(default)]
        then: Vec<Node>,
    },
    /// `unless` statement or modifier.
    Unless {
        condition: Box<Node>,
        #[serde(default)]
        then: Vec<Node>,
    },
    /// `return`, with an optional value.
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<Node>>,
    },
    /// Method definition.
    Def {
        name: String,
        #[serde(default)]
        body: Vec<Node>,
    },
    /// Class definition.
    Class {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        superclass: Option<String>,
        #[serde(default)]
        body: Vec<Node>,
    },
}

/// A `key => value` pair of a hash literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub key: Node,
    pub value: Node,
}

/// A `do |params| ... end` block attached to a call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub body: Vec<Node>,
}

impl Node {
    /// Symbol or string contents.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Sym { value } | Self::Str { value } => Some(value),
            _ => None,
        }
    }

    /// Constant name.
    pub fn as_const(&self) -> Option<&str> {
        match self {
            Self::Const { name } => Some(name),
            _ => None,
        }
    }

    /// Hash pairs, if this is a hash literal.
    pub fn as_hash(&self) -> Option<&[Pair]> {
        match self {
            Self::Hash { pairs } => Some(pairs),
            _ => None,
        }
    }

    /// Look up `key` (symbol or string) in a hash literal.
    pub fn hash_get(&self, key: &str) -> Option<&Node> {
        self.as_hash()?
            .iter()
            .find(|pair| pair.key.as_name() == Some(key))
            .map(|pair| &pair.value)
    }

    /// Convert a scalar literal to a [`Value`]. Symbols become strings.
    ///
    /// Returns `None` for anything that is not a literal.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Nil => Some(Value::Null),
            Self::Bool { value } => Some(Value::Bool(*value)),
            Self::Int { value } => Some(Value::Int(*value)),
            Self::Float { value } => Some(Value::Float(*value)),
            Self::Str { value } | Self::Sym { value } => Some(Value::String(value.clone())),
            _ => None,
        }
    }

    /// Short name of the node shape, used in extraction errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool { .. } => "bool",
            Self::Int { .. } => "int",
            Self::Float { .. } => "float",
            Self::Str { .. } => "str",
            Self::Sym { .. } => "sym",
            Self::Const { .. } => "const",
            Self::Ident { .. } => "ident",
            Self::Array { .. } => "array",
            Self::Hash { .. } => "hash",
            Self::Call { .. } => "call",
            Self::Binary { .. } => "binary",
            Self::If { .. } => "if",
            Self::Unless { .. } => "unless",
            Self::Return { .. } => "return",
            Self::Def { .. } => "def",
            Self::Class { .. } => "class",
        }
    }
}

/// One migration: its version, an optional name and its parsed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationSource {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Vec<Node>,
}

impl MigrationSource {
    /// Create a migration source.
    pub fn new(version: impl Into<String>, body: Vec<Node>) -> Self {
        Self {
            version: version.into(),
            name: None,
            body,
        }
    }

    /// Set the migration name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse a migration source from its JSON description.
    pub fn from_json(json: &str) -> MigrateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parse a list of body nodes from JSON (used for seed descriptions).
pub fn parse_body(json: &str) -> MigrateResult<Vec<Node>> {
    Ok(serde_json::from_str(json)?)
}

/// Convenience constructors used when building descriptions by hand.
pub mod build {
    use super::{Block, Node, Pair};

    pub fn sym(value: &str) -> Node {
        Node::Sym {
            value: value.to_string(),
        }
    }

    pub fn str(value: &str) -> Node {
        Node::Str {
            value: value.to_string(),
        }
    }

    pub fn int(value: i64) -> Node {
        Node::Int { value }
    }

    pub fn bool(value: bool) -> Node {
        Node::Bool { value }
    }

    pub fn konst(name: &str) -> Node {
        Node::Const {
            name: name.to_string(),
        }
    }

    pub fn ident(name: &str) -> Node {
        Node::Ident {
            name: name.to_string(),
        }
    }

    pub fn hash<const N: usize>(pairs: [(&str, Node); N]) -> Node {
        Node::Hash {
            pairs: pairs
                .into_iter()
                .map(|(key, value)| Pair {
                    key: sym(key),
                    value,
                })
                .collect(),
        }
    }

    /// A receiver-less call.
    pub fn call(method: &str, args: Vec<Node>) -> Node {
        Node::Call {
            receiver: None,
            method: method.to_string(),
            args,
            block: None,
        }
    }

    /// A call on `receiver`.
    pub fn send(receiver: Node, method: &str, args: Vec<Node>) -> Node {
        Node::Call {
            receiver: Some(Box::new(receiver)),
            method: method.to_string(),
            args,
            block: None,
        }
    }

    /// A receiver-less call with a `do |param| ... end` block.
    pub fn call_with_block(method: &str, args: Vec<Node>, param: &str, body: Vec<Node>) -> Node {
        Node::Call {
            receiver: None,
            method: method.to_string(),
            args,
            block: Some(Block {
                params: vec![param.to_string()],
                body,
            }),
        }
    }
}
