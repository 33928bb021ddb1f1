//! Error types for the fkdump-codec crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unknown serialization format: {format}")]
    UnknownFormat { format: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
