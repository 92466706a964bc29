//! Fetch request/response shapes as the recorder sees them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::value::{Record, Value};

/// Header keys occur in both text and raw-byte form depending on where the
/// host framework produced them; redaction has to strip both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderKey {
    Text(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
}

/// Insertion-ordered header mapping with dual-form keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderMap {
    #[serde(with = "indexmap::map::serde_seq")]
    entries: IndexMap<HeaderKey, Vec<u8>>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(HeaderKey::Text(name.into()), value.into());
    }

    pub fn insert_bytes(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.insert(HeaderKey::Bytes(name.into()), value.into());
    }

    pub fn get_text(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .get(&HeaderKey::Text(name.to_string()))
            .map(Vec::as_slice)
    }

    /// True if `name` is present under either key form.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&HeaderKey::Text(name.to_string()))
            || self
                .entries
                .contains_key(&HeaderKey::Bytes(name.as_bytes().to_vec()))
    }

    /// Removes `name` under both its text and byte-encoded key forms,
    /// tolerating absence.
    pub fn remove(&mut self, name: &str) {
        self.entries.shift_remove(&HeaderKey::Text(name.to_string()));
        self.entries
            .shift_remove(&HeaderKey::Bytes(name.as_bytes().to_vec()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderKey, &[u8])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Portable record form used inside snapshots. Byte-form keys are
    /// rendered as lossy UTF-8.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        for (key, value) in &self.entries {
            let name = match key {
                HeaderKey::Text(s) => s.clone(),
                HeaderKey::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            };
            record.insert(name, Value::Bytes(value.clone()));
        }
        record
    }
}

/// A fetch request as handed to (or produced by) a callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: HeaderMap,
    /// Callback name; `None` or empty resolves to the default entry point
    /// when snapshotted.
    #[serde(default)]
    pub callback: Option<String>,
    /// Arbitrary nested metadata.
    #[serde(default)]
    pub meta: Record,
    #[serde(with = "serde_bytes", default)]
    pub body: Vec<u8>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: HeaderMap::new(),
            callback: None,
            meta: Record::new(),
            body: Vec::new(),
        }
    }

    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }
}

/// Concrete response subtype tag, recorded so replay can rebuild the same
/// polymorphic shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Html,
    Xml,
    Json,
    Text,
    Raw,
}

impl ResponseKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            ResponseKind::Html => "http.HtmlResponse",
            ResponseKind::Xml => "http.XmlResponse",
            ResponseKind::Json => "http.JsonResponse",
            ResponseKind::Text => "http.TextResponse",
            ResponseKind::Raw => "http.Response",
        }
    }
}

/// A fetch response, carrying the request that originated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub request: FetchRequest,
    pub status: u16,
    #[serde(with = "serde_bytes", default)]
    pub body: Vec<u8>,
    #[serde(default)]
    pub headers: HeaderMap,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    pub kind: ResponseKind,
}

impl FetchResponse {
    pub fn new(request: FetchRequest, status: u16) -> Self {
        Self {
            request,
            status,
            body: Vec::new(),
            headers: HeaderMap::new(),
            flags: Vec::new(),
            encoding: None,
            kind: ResponseKind::Html,
        }
    }
}

/// One item a callback produced: a follow-up request or a scraped record.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutput {
    Request(FetchRequest),
    Record(Value),
}
