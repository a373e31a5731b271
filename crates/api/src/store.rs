use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(pub String);

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyed, content-opaque storage for serialized fingerprints.
pub trait BlobStore: Send + Sync {
    fn put(&self, bytes: &[u8]) -> ApiResult<BlobId>;

    /// Returns `Ok(None)` when no blob is stored under `id`.
    fn get(&self, id: &BlobId) -> ApiResult<Option<Vec<u8>>>;
}
