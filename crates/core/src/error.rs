use crate::compression::CompressionError;
use crate::extract::ExtractionError;
use clonescope_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloneScopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),
    #[error("Blob error: {0}")]
    Blob(#[from] BlobError),
    #[error("Collaborator error: {0}")]
    Api(#[from] ApiError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid state transition: {0}")]
    State(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structural problems found while decoding a serialized fingerprint.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob truncated: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("malformed blob: {0}")]
    Malformed(String),
}

impl From<CloneScopeError> for ApiError {
    fn from(err: CloneScopeError) -> Self {
        match err {
            CloneScopeError::Api(inner) => inner,
            CloneScopeError::Io(e) => ApiError::Storage(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloneScopeError>;
