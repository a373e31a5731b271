//! Scan jobs: fingerprint a query tree, probe it against the corpus, then
//! verify the hits with names.

mod job;
mod result;
mod search;

pub use job::{ScanJob, ScanStatus};
pub use result::{ScanResult, ScanSummary};
pub use search::{QueryFile, Searcher};
