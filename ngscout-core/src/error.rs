//! Error types for ngscout operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Glob pattern error: {0}")]
    GlobPattern(String),

    #[error("Regex pattern error: {0}")]
    RegexPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config already exists at {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("JSON transform error: {0}")]
    Transform(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
