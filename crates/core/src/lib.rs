pub mod blob;
pub mod compression;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod scan;
pub mod storage;

pub use error::{CloneScopeError, Result};
