//! Declared crawl-job state.
//!
//! The recorder never introspects the host framework's job object; the job
//! exposes exactly the state worth recording through this structure.

use serde::{Deserialize, Serialize};

use crate::model::{Record, Value};

/// A routing rule. Requests queued under a matched rule resolve their
/// recorded callback to the rule's declared name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// URL pattern the rule matches on (opaque to the recorder).
    pub pattern: String,
    /// Callback name requests under this rule are dispatched to.
    pub callback: String,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            callback: callback.into(),
        }
    }
}

/// Snapshot-relevant state of a crawl job.
#[derive(Debug, Clone, Default)]
pub struct Spider {
    pub name: String,
    /// Mutable job attributes, recorded into cassettes after name filtering.
    pub attrs: Record,
    /// Present when the job routes requests through rules.
    pub rules: Option<Vec<Rule>>,
}

impl Spider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Record::new(),
            rules: None,
        }
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn uses_rules(&self) -> bool {
        self.rules.is_some()
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.as_ref()?.get(index)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: Value) {
        self.attrs.insert(name.into(), value);
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }
}
