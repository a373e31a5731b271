use crate::error::ApiResult;
use crate::models::{MatchProvenance, SourceKind};

/// One independently searchable unit of the corpus (a database file).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorpusShard {
    pub id: String,
    pub language: String,
    pub kind: SourceKind,
}

/// A stored source unit, ready for rebuild.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub internal_id: u64,
    pub file_id: String,
    pub revision: String,
    pub license: String,
    /// Serialized dedup table and child index list.
    pub blob: Vec<u8>,
}

/// Enumerates previously fingerprinted source units.
pub trait CorpusSource: Send + Sync {
    /// Shards holding units of the given language.
    fn shards(&self, language: &str) -> ApiResult<Vec<CorpusShard>>;

    /// Streams the entries of a shard.
    fn entries<'a>(
        &'a self,
        shard: &CorpusShard,
    ) -> ApiResult<Box<dyn Iterator<Item = CorpusEntry> + Send + 'a>>;

    /// Source text of the unit a match points at, if it is still available.
    fn source_text(&self, provenance: &MatchProvenance) -> ApiResult<Option<String>>;
}
