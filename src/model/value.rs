//! The closed set of shapes a callback can legitimately produce or consume.

use serde::{Deserialize, Serialize};

use crate::model::http::{FetchRequest, FetchResponse};

/// Insertion-ordered field mapping. Free-form mappings and schema-tagged
/// records are the same shape for traversal purposes.
pub type Record = indexmap::IndexMap<String, Value>;

/// One node of a live or snapshotted object graph.
///
/// The snapshot engine is closed over these variants; anything else a
/// callback yields should be wrapped as a [`Value::Scalar`] and passes
/// through recording unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Request(Box<FetchRequest>),
    Response(Box<FetchResponse>),
    Record(Record),
    /// Ordered, mutable sequence.
    Seq(Vec<Value>),
    /// Fixed sequence; must round-trip as fixed, never decay into `Seq`.
    Fixed(Vec<Value>),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Scalar(serde_json::Value),
}

impl Value {
    pub fn null() -> Self {
        Value::Scalar(serde_json::Value::Null)
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Scalar(serde_json::Value::String(s.into()))
    }

    pub fn int(n: i64) -> Self {
        Value::Scalar(serde_json::Value::from(n))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by the redaction engine to short-circuit: empty,
    /// zero, null and false values are never descended into.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Request(_) | Value::Response(_) => true,
            Value::Record(record) => !record.is_empty(),
            Value::Seq(items) | Value::Fixed(items) => !items.is_empty(),
            Value::Bytes(bytes) => !bytes.is_empty(),
            Value::Scalar(scalar) => match scalar {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
                serde_json::Value::String(s) => !s.is_empty(),
                serde_json::Value::Array(a) => !a.is_empty(),
                serde_json::Value::Object(o) => !o.is_empty(),
            },
        }
    }
}
