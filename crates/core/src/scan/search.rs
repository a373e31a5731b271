use crate::blob;
use crate::compression::CompressionRegistry;
use crate::config::Environment;
use crate::dedup::rebuild;
use crate::error::{CloneScopeError, Result};
use crate::extract::Extractor;
use crate::fingerprint::FingerprintIndex;
use crate::matcher::{match_deep, match_fast};
use crate::model::TraversalMode;
use clonescope_api::{
    CorpusEntry, CorpusShard, CorpusSource, MatchKind, MatchProvenance, MatchResult,
    ScanResultSink,
};
use dashmap::DashMap;
use ignore::WalkBuilder;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A fingerprinted file of the query side.
#[derive(Debug)]
pub struct QueryFile {
    pub path: PathBuf,
    pub language: String,
    pub index: FingerprintIndex,
}

/// Runs the fast and deep passes of a scan.
///
/// Query files are extracted on a small dedicated pool; corpus shards fan out
/// on a larger one, one task per shard.
pub struct Searcher {
    extractor: Arc<Extractor>,
    registry: Arc<CompressionRegistry>,
    query_pool: ThreadPool,
    corpus_pool: ThreadPool,
    deep_queries: DashMap<PathBuf, Arc<QueryFile>>,
}

fn aborted(cancel: &CancellationToken, sink: &dyn ScanResultSink) -> bool {
    cancel.is_cancelled() || sink.is_aborted()
}

impl Searcher {
    pub fn new(
        extractor: Arc<Extractor>,
        registry: Arc<CompressionRegistry>,
        env: &Environment,
    ) -> Result<Self> {
        let query_pool = ThreadPoolBuilder::new()
            .num_threads(env.query_workers)
            .thread_name(|i| format!("clonescope-query-{}", i))
            .build()
            .map_err(|e| CloneScopeError::Internal(e.to_string()))?;
        let corpus_pool = ThreadPoolBuilder::new()
            .num_threads(env.corpus_threads())
            .thread_name(|i| format!("clonescope-corpus-{}", i))
            .build()
            .map_err(|e| CloneScopeError::Internal(e.to_string()))?;

        Ok(Self {
            extractor,
            registry,
            query_pool,
            corpus_pool,
            deep_queries: DashMap::new(),
        })
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Fingerprints every supported file under `root` in the given mode.
    pub fn fingerprint_root(
        &self,
        root: &Path,
        window_size: usize,
        mode: TraversalMode,
        cancel: &CancellationToken,
    ) -> Vec<QueryFile> {
        let mut files: Vec<PathBuf> = WalkBuilder::new(root)
            .build()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .map(|e| e.into_path())
            .filter(|p| self.extractor.handler_for_path(p).is_some())
            .collect();
        files.sort();

        self.query_pool.install(|| {
            files
                .par_iter()
                .filter_map(|path| self.fingerprint_file(path, window_size, mode, cancel))
                .collect()
        })
    }

    fn fingerprint_file(
        &self,
        path: &Path,
        window_size: usize,
        mode: TraversalMode,
        cancel: &CancellationToken,
    ) -> Option<QueryFile> {
        match self.extractor.extract_file(path, mode, cancel) {
            Ok(extraction) => Some(QueryFile {
                path: path.to_path_buf(),
                language: extraction.language,
                index: FingerprintIndex::build(&extraction.tree, window_size),
            }),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Fast pass: records one result per (corpus unit, query file) hit.
    pub fn search(
        &self,
        root: &Path,
        window_size: usize,
        corpus: &dyn CorpusSource,
        sink: &dyn ScanResultSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let queries = self.fingerprint_root(root, window_size, TraversalMode::Shallow, cancel);
        if aborted(cancel, sink) {
            return Ok(());
        }

        let mut by_language: BTreeMap<String, Vec<QueryFile>> = BTreeMap::new();
        for query in queries {
            by_language
                .entry(query.language.clone())
                .or_default()
                .push(query);
        }

        let mut tasks: Vec<(CorpusShard, &[QueryFile])> = Vec::new();
        for (language, files) in &by_language {
            let shards = corpus.shards(language)?;
            tracing::info!(
                "{} {} query files against {} shards",
                files.len(),
                language,
                shards.len()
            );
            tasks.extend(shards.into_iter().map(|shard| (shard, files.as_slice())));
        }

        sink.set_max_unit_count(tasks.len() + 1);
        sink.inc_finished_unit_count(1);

        self.corpus_pool.install(|| {
            tasks.par_iter().for_each(|(shard, files)| {
                if !aborted(cancel, sink) {
                    self.search_shard(shard, files, window_size, corpus, sink, cancel);
                }
                sink.inc_finished_unit_count(1);
            })
        });

        Ok(())
    }

    fn search_shard(
        &self,
        shard: &CorpusShard,
        queries: &[QueryFile],
        window_size: usize,
        corpus: &dyn CorpusSource,
        sink: &dyn ScanResultSink,
        cancel: &CancellationToken,
    ) {
        let entries = match corpus.entries(shard) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping shard {}: {}", shard.id, e);
                return;
            }
        };

        for entry in entries {
            if aborted(cancel, sink) {
                return;
            }
            let Some(indexes) = self.index_entry(shard, &entry, window_size) else {
                continue;
            };

            for query in queries {
                if aborted(cancel, sink) {
                    return;
                }
                if indexes
                    .iter()
                    .any(|index| match_fast(index, &query.index, window_size))
                {
                    sink.add_result(MatchResult::new(Vec::new()).with_provenance(
                        MatchProvenance {
                            source_kind: shard.kind,
                            shard_id: shard.id.clone(),
                            internal_id: entry.internal_id,
                            file_id: entry.file_id.clone(),
                            revision: entry.revision.clone(),
                            search_file: query.path.clone(),
                            kind: MatchKind::Fast,
                        },
                    ));
                }
            }
        }
    }

    fn index_entry(
        &self,
        shard: &CorpusShard,
        entry: &CorpusEntry,
        window_size: usize,
    ) -> Option<Vec<FingerprintIndex>> {
        let trees = blob::deserialize_bytes(&entry.blob, &self.registry)
            .and_then(|forest| rebuild(&forest).map_err(CloneScopeError::from));
        match trees {
            Ok(trees) => Some(
                trees
                    .iter()
                    .map(|tree| FingerprintIndex::build(tree, window_size))
                    .collect(),
            ),
            Err(e) => {
                tracing::debug!(
                    "Unreadable entry {} in {}: {}",
                    entry.internal_id,
                    shard.id,
                    e
                );
                None
            }
        }
    }

    /// Deep pass over the fast results already in `sink`.
    ///
    /// Every hit is re-extracted on both sides with names and matched again;
    /// hits whose corpus source is unavailable are skipped but still counted.
    pub fn search_deep(
        &self,
        root: &Path,
        window_size: usize,
        corpus: &dyn CorpusSource,
        sink: &dyn ScanResultSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.deep_queries.clear();
        let candidates: Vec<MatchResult> = sink
            .results()
            .into_iter()
            .filter(|result| {
                result
                    .provenance
                    .as_ref()
                    .is_some_and(|p| p.search_file.starts_with(root))
            })
            .collect();

        sink.set_max_unit_count(candidates.len());
        self.corpus_pool.install(|| {
            candidates.par_iter().for_each(|candidate| {
                if !aborted(cancel, sink) {
                    self.verify(candidate, window_size, corpus, sink, cancel);
                }
                sink.inc_finished_unit_count(1);
            })
        });

        Ok(())
    }

    fn verify(
        &self,
        candidate: &MatchResult,
        window_size: usize,
        corpus: &dyn CorpusSource,
        sink: &dyn ScanResultSink,
        cancel: &CancellationToken,
    ) {
        let Some(provenance) = candidate.provenance.as_ref() else {
            return;
        };
        let Some(query) = self.deep_query(&provenance.search_file, window_size, cancel) else {
            return;
        };

        let text = match corpus.source_text(provenance) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(
                    "No source for {}#{}, skipping deep match",
                    provenance.shard_id,
                    provenance.internal_id
                );
                return;
            }
            Err(e) => {
                tracing::warn!("Source lookup failed for {}: {}", provenance.shard_id, e);
                return;
            }
        };

        let base = match self.extractor.extract(
            text.as_bytes(),
            Some(&query.language),
            TraversalMode::Deep,
            cancel,
        ) {
            Ok(extraction) => FingerprintIndex::build(&extraction.tree, window_size),
            Err(e) => {
                tracing::debug!("Corpus unit {} not extractable: {}", provenance.file_id, e);
                return;
            }
        };

        let result = match_deep(&base, &query.index, window_size);
        if !result.is_empty() {
            sink.add_deep_result(result.with_provenance(MatchProvenance {
                kind: MatchKind::Deep,
                ..provenance.clone()
            }));
        }
    }

    fn deep_query(
        &self,
        path: &Path,
        window_size: usize,
        cancel: &CancellationToken,
    ) -> Option<Arc<QueryFile>> {
        if let Some(hit) = self.deep_queries.get(path) {
            return Some(hit.clone());
        }
        let query = Arc::new(self.fingerprint_file(path, window_size, TraversalMode::Deep, cancel)?);
        self.deep_queries.insert(path.to_path_buf(), query.clone());
        Some(query)
    }
}
