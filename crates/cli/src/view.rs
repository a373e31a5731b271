use clonescope_api::{MatchResult, MatchWindow};
use tabled::Tabled;

/// One matching region as printed by `compare`.
#[derive(Tabled)]
pub struct WindowView {
    #[tabled(rename = "Base lines")]
    pub base: String,
    #[tabled(rename = "Search lines")]
    pub search: String,
}

impl From<&MatchWindow> for WindowView {
    fn from(window: &MatchWindow) -> Self {
        Self {
            base: format!("{}-{}", window.base_start, window.base_end),
            search: format!("{}-{}", window.search_start, window.search_end),
        }
    }
}

/// One scan hit: a corpus unit matched by a query file.
#[derive(Tabled)]
pub struct ResultView {
    #[tabled(rename = "Query file")]
    pub query: String,
    #[tabled(rename = "Corpus file")]
    pub corpus: String,
    #[tabled(rename = "Shard")]
    pub shard: String,
    #[tabled(rename = "Revision")]
    pub revision: String,
    #[tabled(rename = "Regions")]
    pub regions: String,
}

impl ResultView {
    pub fn from_result(result: &MatchResult) -> Option<Self> {
        let provenance = result.provenance.as_ref()?;
        let regions = if result.windows.is_empty() {
            "-".to_string()
        } else {
            result
                .windows
                .iter()
                .map(|w| {
                    format!(
                        "{}-{}:{}-{}",
                        w.search_start, w.search_end, w.base_start, w.base_end
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        Some(Self {
            query: provenance.search_file.display().to_string(),
            corpus: provenance.file_id.clone(),
            shard: provenance.shard_id.clone(),
            revision: provenance.revision.chars().take(8).collect(),
            regions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clonescope_api::{MatchKind, MatchProvenance, SourceKind};
    use std::path::PathBuf;

    #[test]
    fn test_result_view_formats_regions() {
        let result = MatchResult::new(vec![MatchWindow {
            base_start: 10,
            base_end: 20,
            search_start: 1,
            search_end: 11,
        }])
        .with_provenance(MatchProvenance {
            source_kind: SourceKind::GitHub,
            shard_id: "cpp/github/a.db".to_string(),
            internal_id: 4,
            file_id: "src/a.cpp".to_string(),
            revision: "0123456789abcdef".to_string(),
            search_file: PathBuf::from("query/b.cpp"),
            kind: MatchKind::Deep,
        });

        let view = ResultView::from_result(&result).unwrap();
        assert_eq!(view.regions, "1-11:10-20");
        assert_eq!(view.revision, "01234567");
        assert_eq!(view.corpus, "src/a.cpp");
    }

    #[test]
    fn test_result_without_provenance_is_skipped() {
        assert!(ResultView::from_result(&MatchResult::default()).is_none());
    }
}
