//! Snapshot and redaction engine.
//!
//! Walks an arbitrary object graph from the known closed set of shapes and
//! produces a fully portable, privacy-scrubbed copy, without ever mutating
//! the live values the crawl job keeps using.

pub mod engine;
pub mod redact;

pub use engine::{Snapshotter, CASSETTE_META_KEY, DEFAULT_CALLBACK, RULE_META_KEY};
pub use redact::redact_path;
