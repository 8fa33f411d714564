//! Error types for the bundle crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bundle file not found: {0}")]
    NotFound(String),

    #[error("bundle {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },

    #[error("missing required entry: {0}")]
    MissingEntry(String),

    #[error("manifest validation error: {0}")]
    ManifestInvalid(String),
}
