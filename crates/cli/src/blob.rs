use clonescope_api::BlobStore;
use clonescope_core::blob;
use clonescope_core::config::Environment;
use clonescope_core::dedup::reduce;
use clonescope_core::model::TraversalMode;
use clonescope_core::storage::FsBlobStore;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub fn run(env: &Environment, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = clonescope_runtime::build_default_extractor(env);
    let registry = clonescope_runtime::build_registry(env);

    let extraction =
        extractor.extract_file(path, TraversalMode::Shallow, &CancellationToken::new())?;
    let forest = reduce([&extraction.tree]);
    let words = blob::serialize(&forest, &registry);
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();

    let store = FsBlobStore::new(&env.data_path)?;
    let id = store.put(&bytes)?;

    println!("Blob:     {}", id);
    println!("Language: {}", extraction.language);
    println!(
        "Nodes:    {} ({} distinct subtrees)",
        extraction.tree.len(),
        forest.table.len()
    );
    println!("Bytes:    {}", bytes.len());
    if let Some([indices, symbols, fields, counts]) = blob::section_sizes(&words) {
        println!(
            "Sections: indices {} / symbols {} / fields {} / counts {} words",
            indices, symbols, fields, counts
        );
    }
    Ok(())
}
