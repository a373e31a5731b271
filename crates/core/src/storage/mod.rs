//! Filesystem-backed collaborators: a content-addressed blob store and the
//! `<language>/<kind>/*.db` corpus layout.

mod blob_store;
mod corpus;

pub use blob_store::FsBlobStore;
pub use corpus::{CorpusRecord, CorpusShardFile, CorpusWriter, FsCorpus, StoreSummary};
