//! Error types for the file store.

use std::io;
use std::path::PathBuf;

/// Failures opening, parsing, or persisting a config file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Config file {} does not contain a JSON object", .0.display())]
    NotAnObject(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
