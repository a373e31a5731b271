use crate::view::WindowView;
use clonescope_core::config::Environment;
use clonescope_core::fingerprint::FingerprintIndex;
use clonescope_core::matcher::{match_deep, match_fast};
use clonescope_core::model::TraversalMode;
use std::path::Path;
use tabled::{Table, settings::Style};
use tokio_util::sync::CancellationToken;

pub fn run(
    env: &Environment,
    base: &Path,
    search: &Path,
    window: usize,
    deep: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = clonescope_runtime::build_default_extractor(env);
    let mode = if deep {
        TraversalMode::Deep
    } else {
        TraversalMode::Shallow
    };
    let token = CancellationToken::new();

    let base_tree = extractor.extract_file(base, mode, &token)?.tree;
    let search_tree = extractor.extract_file(search, mode, &token)?.tree;
    let base_index = FingerprintIndex::build(&base_tree, window);
    let search_index = FingerprintIndex::build(&search_tree, window);

    println!(
        "{}: {} nodes, {}: {} nodes, window {}",
        base.display(),
        base_index.len(),
        search.display(),
        search_index.len(),
        window
    );

    if !match_fast(&base_index, &search_index, window) {
        println!("No shared structure.");
        return Ok(());
    }

    let result = match_deep(&base_index, &search_index, window);
    if result.is_empty() {
        println!("Structure matches, but no region survives name verification.");
        return Ok(());
    }

    let views: Vec<WindowView> = result.windows.iter().map(WindowView::from).collect();
    println!("{}", Table::new(&views).with(Style::psql()));
    Ok(())
}
