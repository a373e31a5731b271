use super::{ScanResult, Searcher};
use crate::error::{CloneScopeError, Result};
use clonescope_api::CorpusSource;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Idle,
    Started,
    Running,
    Aborted,
    Finished,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanStatus::Idle => "idle",
            ScanStatus::Started => "started",
            ScanStatus::Running => "running",
            ScanStatus::Aborted => "aborted",
            ScanStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// One scan of a query root against the corpus.
///
/// `Idle -> Started -> Running -> {Aborted | Finished}`. Cancelling the
/// job's token at any point ends it in `Aborted` at the next check.
pub struct ScanJob {
    root: PathBuf,
    window_size: usize,
    deep: bool,
    status: Mutex<ScanStatus>,
    cancel: CancellationToken,
    result: Arc<ScanResult>,
}

impl ScanJob {
    pub fn new(root: impl Into<PathBuf>, window_size: usize) -> Self {
        let cancel = CancellationToken::new();
        Self {
            root: root.into(),
            window_size,
            deep: true,
            status: Mutex::new(ScanStatus::Idle),
            result: Arc::new(ScanResult::new(cancel.clone())),
            cancel,
        }
    }

    /// Whether `run` follows the fast pass with a deep pass.
    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn status(&self) -> ScanStatus {
        *self.status.lock()
    }

    pub fn result(&self) -> &Arc<ScanResult> {
        &self.result
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn start(&self) -> Result<()> {
        self.transition(ScanStatus::Idle, ScanStatus::Started)
    }

    pub fn abort(&self) {
        self.cancel.cancel();
        let mut status = self.status.lock();
        if matches!(*status, ScanStatus::Idle | ScanStatus::Started) {
            *status = ScanStatus::Aborted;
        }
    }

    /// Runs the fast and, if enabled, deep passes of a started job.
    ///
    /// Returns the terminal status. Errors also leave the job `Aborted`.
    pub fn run(&self, searcher: &Searcher, corpus: &dyn CorpusSource) -> Result<ScanStatus> {
        self.transition(ScanStatus::Started, ScanStatus::Running)?;
        tracing::info!("Scan of {} running", self.root.display());

        let outcome = self.run_passes(searcher, corpus);
        let terminal = match (&outcome, self.cancel.is_cancelled()) {
            (Ok(()), false) => ScanStatus::Finished,
            _ => ScanStatus::Aborted,
        };
        *self.status.lock() = terminal;

        let summary = self.result.summary();
        tracing::info!(
            "Scan of {} {}: {} hits, {} verified",
            self.root.display(),
            terminal,
            summary.results,
            summary.deep_results
        );
        outcome.map(|_| terminal)
    }

    fn run_passes(&self, searcher: &Searcher, corpus: &dyn CorpusSource) -> Result<()> {
        let sink = self.result.as_ref();
        searcher.search(&self.root, self.window_size, corpus, sink, &self.cancel)?;
        if self.cancel.is_cancelled() || !self.deep {
            return Ok(());
        }
        searcher.search_deep(&self.root, self.window_size, corpus, sink, &self.cancel)
    }

    fn transition(&self, from: ScanStatus, to: ScanStatus) -> Result<()> {
        let mut status = self.status.lock();
        if *status != from {
            return Err(CloneScopeError::State(format!(
                "cannot move from {} to {}",
                *status, to
            )));
        }
        *status = to;
        Ok(())
    }
}
