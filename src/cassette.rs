//! The cassette fixture artifact and its packing seam.

use serde::{Deserialize, Serialize};

use crate::error::RecorderError;
use crate::model::{Record, Value};
use crate::snapshot::DEFAULT_CALLBACK;

/// Tag on a recorded callback output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Request,
    Record,
}

/// One callback output as recorded into a cassette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedOutput {
    #[serde(rename = "type")]
    pub kind: OutputKind,
    pub data: Value,
}

/// The unit of a fixture: everything needed to replay one callback
/// invocation.
///
/// Created when a response reaches its callback, mutated once when the
/// callback's outputs are recorded, then persisted or discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cassette {
    pub spider_name: String,
    pub request: Record,
    pub response: Record,
    /// Spider attributes captured once at job start.
    pub init_attrs: Record,
    /// Spider attributes at invocation time.
    pub input_attrs: Record,
    /// Spider attributes after the callback ran.
    #[serde(default)]
    pub output_attrs: Record,
    #[serde(default)]
    pub output_data: Vec<TaggedOutput>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl Cassette {
    /// Callback name the triggering request resolved to.
    pub fn callback_name(&self) -> &str {
        self.request
            .get("callback")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CALLBACK)
    }
}

/// Packs cassettes to and from their persisted byte form. The format is an
/// external contract, opaque to the recorder.
pub trait CassettePacker {
    fn pack(&self, cassette: &Cassette) -> Result<Vec<u8>, RecorderError>;
    fn unpack(&self, bytes: &[u8]) -> Result<Cassette, RecorderError>;
}

/// Default packer: serde_json bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPacker;

impl CassettePacker for JsonPacker {
    fn pack(&self, cassette: &Cassette) -> Result<Vec<u8>, RecorderError> {
        Ok(serde_json::to_vec(cassette)?)
    }

    fn unpack(&self, bytes: &[u8]) -> Result<Cassette, RecorderError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
