use crate::view::ResultView;
use clonescope_api::{MatchResult, ScanResultSink};
use clonescope_core::config::Environment;
use clonescope_core::scan::{ScanJob, ScanStatus};
use clonescope_core::storage::FsCorpus;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, settings::Style};
use tracing::info;

#[derive(Serialize)]
struct ScanReport {
    root: PathBuf,
    status: ScanStatus,
    results: Vec<MatchResult>,
    deep_results: Vec<MatchResult>,
}

pub async fn run(
    env: Environment,
    root: PathBuf,
    window: usize,
    deep: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let searcher = clonescope_runtime::build_searcher(&env)?;
    let corpus = FsCorpus::new(&env.db_path);
    let job = Arc::new(ScanJob::new(&root, window).with_deep(deep));
    job.start()?;

    info!(
        "Scanning {} against {} (window {})...",
        root.display(),
        env.db_path.display(),
        window
    );
    let interrupt = super::cancel_on_ctrl_c(job.cancel_token());
    let worker = job.clone();
    let status = tokio::task::spawn_blocking(move || worker.run(&searcher, &corpus)).await??;
    interrupt.abort();

    let report = ScanReport {
        root,
        status,
        results: job.result().results(),
        deep_results: job.result().deep_results(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Scan {}: {} candidate hits, {} verified",
        report.status,
        report.results.len(),
        report.deep_results.len()
    );
    let shown = if deep {
        &report.deep_results
    } else {
        &report.results
    };
    let views: Vec<ResultView> = shown.iter().filter_map(ResultView::from_result).collect();
    if !views.is_empty() {
        println!("{}", Table::new(&views).with(Style::psql()));
    }
    Ok(())
}
