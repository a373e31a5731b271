use clonescope_api::{ApiError, ApiResult, BlobId, BlobStore};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use xxhash_rust::xxh3::xxh3_64;

/// Stores blobs under `<root>/<first two hex digits>/<id>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &BlobId) -> ApiResult<PathBuf> {
        let valid = id.0.len() == 16 && id.0.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(ApiError::InvalidArgument(format!("malformed blob id '{}'", id)));
        }
        Ok(self.root.join(&id.0[..2]).join(&id.0))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, bytes: &[u8]) -> ApiResult<BlobId> {
        let id = BlobId(format!("{:016x}", xxh3_64(bytes)));
        let path = self.blob_path(&id)?;
        if path.exists() {
            return Ok(id);
        }
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;
        // Publish atomically; concurrent writers of the same blob each get
        // their own temp file and the last rename wins with identical bytes.
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(id)
    }

    fn get(&self, id: &BlobId) -> ApiResult<Option<Vec<u8>>> {
        let path = self.blob_path(id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
