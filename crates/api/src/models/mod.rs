pub mod key;
pub mod matching;

pub use key::StructuralKey;
pub use matching::{MatchKind, MatchProvenance, MatchResult, MatchWindow, SourceKind};
