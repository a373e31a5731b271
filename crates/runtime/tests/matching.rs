mod common;

use clonescope_api::MatchWindow;
use clonescope_core::matcher::{match_deep, match_fast};
use clonescope_core::model::TraversalMode;
use common::{call_line, cpp_snippet, extractor, index, line_extent};

#[test]
fn test_identical_snippets_match_as_one_window() {
    let extractor = extractor();
    let source = cpp_snippet(None);

    let tree = extractor
        .extract(
            source.as_bytes(),
            Some("cpp"),
            TraversalMode::Shallow,
            &Default::default(),
        )
        .unwrap()
        .tree;
    assert!(tree.len() >= 200, "only {} nodes", tree.len());

    let base = index(&extractor, &source, TraversalMode::Shallow, 64);
    let search = index(&extractor, &source, TraversalMode::Shallow, 64);
    assert!(match_fast(&base, &search, 64));

    let (start, end) = line_extent(&base);
    let full = vec![MatchWindow {
        base_start: start,
        base_end: end,
        search_start: start,
        search_end: end,
    }];
    assert_eq!(match_deep(&base, &search, 64).windows, full);

    let base = index(&extractor, &source, TraversalMode::Deep, 64);
    let search = index(&extractor, &source, TraversalMode::Deep, 64);
    assert!(base.is_deep());
    assert_eq!(match_deep(&base, &search, 64).windows, full);
}

#[test]
fn test_renamed_call_only_matches_structurally() {
    let extractor = extractor();
    let original = cpp_snippet(None);
    let renamed = cpp_snippet(Some(2));

    // One window covering the whole snippet.
    let width = index(&extractor, &original, TraversalMode::Deep, 1).len();

    let base = index(&extractor, &original, TraversalMode::Shallow, width);
    let search = index(&extractor, &renamed, TraversalMode::Shallow, width);
    assert_eq!(base.window_count(), 1);
    assert!(match_fast(&base, &search, width));

    let base = index(&extractor, &original, TraversalMode::Deep, width);
    let search = index(&extractor, &renamed, TraversalMode::Deep, width);
    assert!(match_deep(&base, &search, width).is_empty());
}

#[test]
fn test_renamed_call_splits_deep_regions() {
    let extractor = extractor();
    let original = cpp_snippet(None);
    let renamed = cpp_snippet(Some(2));

    let base = index(&extractor, &original, TraversalMode::Deep, 16);
    let search = index(&extractor, &renamed, TraversalMode::Deep, 16);
    let windows = match_deep(&base, &search, 16).windows;

    assert!(windows.len() >= 2, "{:?}", windows);
    assert!(windows.iter().any(|w| w.base_contains(1)));
    assert!(windows.iter().any(|w| w.base_start > call_line(2)));
    assert!(windows.iter().all(|w| !(w.base_start < call_line(2) && w.base_end > call_line(2))));
}

#[test]
fn test_unrelated_code_does_not_match() {
    let extractor = extractor();
    let source = cpp_snippet(None);
    let other = "struct Point { double x; double y; };\n\
                 Point origin() { return Point{0.0, 0.0}; }\n";

    let base = index(&extractor, &source, TraversalMode::Shallow, 16);
    let search = index(&extractor, other, TraversalMode::Shallow, 16);
    assert!(!match_fast(&base, &search, 16));
    assert!(match_deep(&base, &search, 16).is_empty());
}
