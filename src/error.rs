//! Error types for fixture recording.

/// Error type for recorder operations.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// Filesystem failure while writing fixtures or creating directories.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cassette failed to pack or unpack.
    #[error("cassette packing error: {0}")]
    Pack(#[from] serde_json::Error),

    /// Settings file could not be parsed.
    #[error("settings error: {0}")]
    Settings(#[from] toml::de::Error),
}
