use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where a corpus unit was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    StackExchange,
    GitHub,
    SourceForge,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::StackExchange,
        SourceKind::GitHub,
        SourceKind::SourceForge,
    ];

    /// Directory name used by the on-disk corpus layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::StackExchange => "stackexchange",
            SourceKind::GitHub => "github",
            SourceKind::SourceForge => "sourceforge",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown source kind '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Existence probe hit; no windows enumerated.
    Fast,
    /// Enumerated and name-verified windows.
    Deep,
}

/// Inclusive source line ranges of one matching region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchWindow {
    pub base_start: u32,
    pub base_end: u32,
    pub search_start: u32,
    pub search_end: u32,
}

impl MatchWindow {
    pub fn base_contains(&self, line: u32) -> bool {
        (self.base_start..=self.base_end).contains(&line)
    }

    pub fn search_contains(&self, line: u32) -> bool {
        (self.search_start..=self.search_end).contains(&line)
    }
}

/// Identifies the corpus unit and the query file a match belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProvenance {
    pub source_kind: SourceKind,
    /// Shard (database) the corpus unit was read from.
    pub shard_id: String,
    pub internal_id: u64,
    /// File or snippet identifier inside the source repository.
    pub file_id: String,
    pub revision: String,
    pub search_file: PathBuf,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub windows: Vec<MatchWindow>,
    pub provenance: Option<MatchProvenance>,
}

impl MatchResult {
    pub fn new(windows: Vec<MatchWindow>) -> Self {
        Self {
            windows,
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, provenance: MatchProvenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("github".parse::<SourceKind>(), Ok(SourceKind::GitHub));
        assert_eq!(
            "StackExchange".parse::<SourceKind>(),
            Ok(SourceKind::StackExchange)
        );
        assert!("gitlab".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_window_ranges_are_inclusive() {
        let window = MatchWindow {
            base_start: 3,
            base_end: 7,
            search_start: 10,
            search_end: 14,
        };
        assert!(window.base_contains(3));
        assert!(window.base_contains(7));
        assert!(!window.base_contains(8));
        assert!(window.search_contains(14));
        assert!(!window.search_contains(9));
    }

    #[test]
    fn test_result_json_shape() {
        let result = MatchResult::new(vec![]).with_provenance(MatchProvenance {
            source_kind: SourceKind::SourceForge,
            shard_id: "shard".into(),
            internal_id: 7,
            file_id: "a/b.cpp".into(),
            revision: "r1".into(),
            search_file: PathBuf::from("q.cpp"),
            kind: MatchKind::Fast,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["provenance"]["source_kind"], "sourceforge");
        assert_eq!(json["provenance"]["kind"], "fast");
    }
}
