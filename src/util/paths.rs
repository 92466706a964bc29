//! Output path resolution.

use std::path::PathBuf;

use crate::config::Settings;

/// Base directory fixtures are written under: the configured `base_path`,
/// falling back to the current directory.
pub fn base_path(settings: &Settings) -> PathBuf {
    settings
        .base_path
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}
