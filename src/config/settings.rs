//! Recorder configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RecorderError;

/// Headers stripped from recorded fixtures unless explicitly allowlisted.
pub const AUTH_HEADERS: [&str; 2] = ["Authorization", "Proxy-Authorization"];

/// Floor and default for `max_fixtures_per_callback`.
pub const MIN_FIXTURES_PER_CALLBACK: u64 = 10;

/// Recorder settings.
///
/// Two keys have deprecated predecessors that are consulted only when the
/// current key is empty: `dont_record_headers` (was `excluded_headers`) and
/// `record_auth_headers` (was `included_auth_headers`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Header names never recorded into fixtures.
    pub dont_record_headers: Vec<String>,
    /// Deprecated predecessor of `dont_record_headers`.
    pub excluded_headers: Vec<String>,
    /// Auth-like headers to record despite the built-in denylist.
    pub record_auth_headers: Vec<String>,
    /// Deprecated predecessor of `record_auth_headers`.
    pub included_auth_headers: Vec<String>,
    /// Metadata path expressions redacted from request snapshots.
    pub dont_record_meta: Vec<String>,
    /// Spider attribute names excluded from attribute snapshots.
    pub dont_record_spider_attrs: Vec<String>,
    /// Upper bound on persisted fixtures per callback.
    pub max_fixtures_per_callback: Option<u64>,
    /// Extra directory segment between the spider's test root and the
    /// per-callback fixture directories.
    pub extra_path: Option<String>,
    /// Spider attribute whose value derives fixture filenames.
    pub fixture_naming_attr: Option<String>,
    /// Base output path; defaults to the current directory.
    pub base_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, RecorderError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn with_extra_path(mut self, extra: impl Into<String>) -> Self {
        self.extra_path = Some(extra.into());
        self
    }

    pub fn with_fixture_naming_attr(mut self, attr: impl Into<String>) -> Self {
        self.fixture_naming_attr = Some(attr.into());
        self
    }

    /// Effective header denylist: the configured list (falling back to the
    /// deprecated key when empty) plus the well-known auth headers not
    /// present in the allowlist.
    pub fn header_denylist(&self) -> Vec<String> {
        let mut excluded = if self.dont_record_headers.is_empty() {
            self.excluded_headers.clone()
        } else {
            self.dont_record_headers.clone()
        };
        let included = if self.record_auth_headers.is_empty() {
            &self.included_auth_headers
        } else {
            &self.record_auth_headers
        };
        for header in AUTH_HEADERS {
            if !included.iter().any(|h| h == header) {
                excluded.push(header.to_string());
            }
        }
        excluded
    }

    /// Per-callback fixture bound, clamped to a floor of 10.
    pub fn max_fixtures(&self) -> u64 {
        self.max_fixtures_per_callback
            .unwrap_or(MIN_FIXTURES_PER_CALLBACK)
            .max(MIN_FIXTURES_PER_CALLBACK)
    }

    /// One advisory warning per deprecated setting still in use. Never
    /// blocking.
    pub fn deprecated_warnings(&self) -> Vec<String> {
        let mapping = [
            (
                !self.excluded_headers.is_empty(),
                "excluded_headers",
                "dont_record_headers",
            ),
            (
                !self.included_auth_headers.is_empty(),
                "included_auth_headers",
                "record_auth_headers",
            ),
        ];
        mapping
            .iter()
            .filter(|(in_use, _, _)| *in_use)
            .map(|(_, old, new)| {
                format!("DEPRECATED: '{old}' is going to be removed soon. Please use '{new}' instead.")
            })
            .collect()
    }
}
