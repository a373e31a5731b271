use crate::blob;
use crate::compression::CompressionRegistry;
use crate::dedup::reduce;
use crate::error::Result;
use crate::extract::{ExtractionError, Extractor};
use crate::model::TraversalMode;
use clonescope_api::{
    ApiError, ApiResult, CorpusEntry, CorpusShard, CorpusSource, MatchProvenance, SourceKind,
};
use dashmap::DashMap;
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

pub const SHARD_EXTENSION: &str = "db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub internal_id: u64,
    pub file_id: String,
    pub revision: String,
    pub license: String,
    /// Original text, kept for name-verified matching.
    pub source: Option<String>,
    #[serde(with = "serde_bytes")]
    pub blob: Vec<u8>,
}

/// On-disk content of one shard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusShardFile {
    pub language: String,
    pub entries: Vec<CorpusRecord>,
}

impl CorpusShardFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(rmp_serde::from_slice(&bytes)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, rmp_serde::to_vec_named(self)?)?;
        Ok(())
    }
}

/// Corpus laid out as `<root>/<language>/<kind>/<name>.db`.
///
/// Shard ids are paths relative to the root. Loaded shards are cached for
/// source lookups.
#[derive(Debug)]
pub struct FsCorpus {
    root: PathBuf,
    loaded: DashMap<String, Arc<CorpusShardFile>>,
}

impl FsCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shard_path(&self, shard_id: &str) -> PathBuf {
        self.root.join(shard_id)
    }

    fn load(&self, shard_id: &str) -> ApiResult<Arc<CorpusShardFile>> {
        if let Some(cached) = self.loaded.get(shard_id) {
            return Ok(cached.clone());
        }
        let path = self.shard_path(shard_id);
        if !path.is_file() {
            return Err(ApiError::NotFound(format!("shard '{}'", shard_id)));
        }
        let file = Arc::new(CorpusShardFile::read(&path).map_err(ApiError::from)?);
        self.loaded.insert(shard_id.to_string(), file.clone());
        Ok(file)
    }
}

impl CorpusSource for FsCorpus {
    fn shards(&self, language: &str) -> ApiResult<Vec<CorpusShard>> {
        let mut shards = Vec::new();
        for kind in SourceKind::ALL {
            let dir = self.root.join(language).join(kind.as_str());
            if !dir.is_dir() {
                continue;
            }
            let mut found: Vec<PathBuf> = WalkDir::new(&dir)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == SHARD_EXTENSION))
                .collect();
            found.sort();

            for path in found {
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                shards.push(CorpusShard {
                    id: relative.to_string_lossy().replace('\\', "/"),
                    language: language.to_string(),
                    kind,
                });
            }
        }
        Ok(shards)
    }

    fn entries<'a>(
        &'a self,
        shard: &CorpusShard,
    ) -> ApiResult<Box<dyn Iterator<Item = CorpusEntry> + Send + 'a>> {
        let path = self.shard_path(&shard.id);
        let file = CorpusShardFile::read(&path).map_err(ApiError::from)?;
        Ok(Box::new(file.entries.into_iter().map(|record| CorpusEntry {
            internal_id: record.internal_id,
            file_id: record.file_id,
            revision: record.revision,
            license: record.license,
            blob: record.blob,
        })))
    }

    fn source_text(&self, provenance: &MatchProvenance) -> ApiResult<Option<String>> {
        let shard = match self.load(&provenance.shard_id) {
            Ok(shard) => shard,
            Err(ApiError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(shard
            .entries
            .iter()
            .find(|record| record.internal_id == provenance.internal_id)
            .and_then(|record| record.source.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub path: PathBuf,
    pub stored: usize,
    pub skipped: usize,
}

/// Fingerprints a source tree into a new corpus shard.
pub struct CorpusWriter<'a> {
    extractor: &'a Extractor,
    registry: &'a CompressionRegistry,
    root: PathBuf,
    keep_source: bool,
}

impl<'a> CorpusWriter<'a> {
    pub fn new(
        extractor: &'a Extractor,
        registry: &'a CompressionRegistry,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            registry,
            root: root.into(),
            keep_source: true,
        }
    }

    /// Whether to embed source text (needed for the deep pass).
    pub fn keep_source(mut self, keep: bool) -> Self {
        self.keep_source = keep;
        self
    }

    pub fn store(
        &self,
        source_root: &Path,
        language: &str,
        kind: SourceKind,
        shard_name: &str,
        cancel: &CancellationToken,
    ) -> Result<StoreSummary> {
        let handler = self
            .extractor
            .handler(language)
            .ok_or(ExtractionError::UnsupportedLanguage)?;
        let language = handler.id().to_string();

        let mut files: Vec<PathBuf> = WalkBuilder::new(source_root)
            .build()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .map(|e| e.into_path())
            .filter(|p| {
                self.extractor
                    .handler_for_path(p)
                    .is_some_and(|h| h.id() == language)
            })
            .collect();
        files.sort();

        let license = find_license(source_root).unwrap_or_default();

        let records: Vec<Option<CorpusRecord>> = files
            .par_iter()
            .enumerate()
            .map(|(internal_id, path)| {
                if cancel.is_cancelled() {
                    return None;
                }
                self.fingerprint_file(source_root, path, internal_id as u64, &license, cancel)
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled.into());
        }

        let entries: Vec<CorpusRecord> = records.into_iter().flatten().collect();
        let skipped = files.len() - entries.len();
        let stored = entries.len();

        let path = self
            .root
            .join(&language)
            .join(kind.as_str())
            .join(format!("{}.{}", shard_name, SHARD_EXTENSION));
        CorpusShardFile { language, entries }.write(&path)?;

        tracing::info!(
            "Stored {} files into {} ({} skipped)",
            stored,
            path.display(),
            skipped
        );
        Ok(StoreSummary {
            path,
            stored,
            skipped,
        })
    }

    fn fingerprint_file(
        &self,
        source_root: &Path,
        path: &Path,
        internal_id: u64,
        license: &str,
        cancel: &CancellationToken,
    ) -> Option<CorpusRecord> {
        let source = match fs::read(path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };
        let hint = path.extension().and_then(|ext| ext.to_str());
        let extraction = match self
            .extractor
            .extract(&source, hint, TraversalMode::Shallow, cancel)
        {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };

        let forest = reduce([&extraction.tree]);
        let blob = blob::serialize_bytes(&forest, self.registry);
        let file_id = path
            .strip_prefix(source_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        Some(CorpusRecord {
            internal_id,
            file_id,
            revision: format!("{:016x}", xxh3_64(&source)),
            license: license.to_string(),
            source: self
                .keep_source
                .then(|| String::from_utf8_lossy(&source).into_owned()),
            blob,
        })
    }
}

fn find_license(root: &Path) -> Option<String> {
    let entries = fs::read_dir(root).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .find(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case("license") || s.eq_ignore_ascii_case("copying"))
        })
        .and_then(|p| fs::read_to_string(p).ok())
}
