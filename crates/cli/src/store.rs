use clonescope_api::SourceKind;
use clonescope_core::config::Environment;
use clonescope_core::storage::CorpusWriter;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(
    env: Environment,
    lang: String,
    kind: SourceKind,
    name: String,
    path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Storing {} as {}/{}/{}...", path.display(), lang, kind, name);

    let token = CancellationToken::new();
    let interrupt = super::cancel_on_ctrl_c(token.clone());

    let summary = tokio::task::spawn_blocking(move || {
        let extractor = clonescope_runtime::build_default_extractor(&env);
        let registry = clonescope_runtime::build_registry(&env);
        CorpusWriter::new(&extractor, &registry, &env.db_path)
            .store(&path, &lang, kind, &name, &token)
    })
    .await??;
    interrupt.abort();

    println!("Shard:   {}", summary.path.display());
    println!("Stored:  {}", summary.stored);
    println!("Skipped: {}", summary.skipped);
    Ok(())
}
