pub mod corpus;
pub mod error;
pub mod models;
pub mod sink;
pub mod store;

// Re-export commonly used types
pub use corpus::{CorpusEntry, CorpusShard, CorpusSource};
pub use error::{ApiError, ApiResult};
pub use models::*;
pub use sink::ScanResultSink;
pub use store::{BlobId, BlobStore};
