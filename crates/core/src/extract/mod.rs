//! Turns source text into structural trees.
//!
//! An [`Extractor`] owns the registered [`LanguageHandler`]s, picks one per
//! input and walks the resulting syntax tree into a [`StructuralTree`].

mod walk;

use crate::config::Environment;
use crate::model::{StructuralTree, TraversalMode};
use clonescope_plugin::LanguageHandler;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tree_sitter::{ParseOptions, ParseState, Parser, Tree};

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("parse exceeded the {0:?} timeout")]
    Timeout(Duration),
    #[error("parse cancelled")]
    Cancelled,
    #[error("parser produced no tree")]
    ParserFailure,
    #[error("no registered handler accepts this input")]
    UnsupportedLanguage,
    #[error("grammar rejected by parser: {0}")]
    Language(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A successfully extracted tree and the handler that produced it.
#[derive(Debug)]
pub struct Extraction {
    pub tree: StructuralTree,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    handlers: Vec<Arc<dyn LanguageHandler>>,
    timeout: Duration,
    max_depth: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            timeout: Duration::from_secs(crate::config::DEFAULT_PARSE_TIMEOUT_SECS),
            max_depth: crate::config::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_env(env: &Environment) -> Self {
        Self::new()
            .with_timeout(env.parse_timeout())
            .with_max_depth(env.max_depth)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn register(&mut self, handler: Arc<dyn LanguageHandler>) {
        tracing::debug!("Registered language handler '{}'", handler.id());
        self.handlers.push(handler);
    }

    pub fn handlers(&self) -> &[Arc<dyn LanguageHandler>] {
        &self.handlers
    }

    /// Looks a handler up by id or by file extension (with or without dot).
    pub fn handler(&self, hint: &str) -> Option<&Arc<dyn LanguageHandler>> {
        let hint = hint.trim_start_matches('.');
        self.handlers.iter().find(|h| {
            h.id() == hint || h.extensions().iter().any(|ext| ext.eq_ignore_ascii_case(hint))
        })
    }

    pub fn handler_for_path(&self, path: &Path) -> Option<&Arc<dyn LanguageHandler>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.handler(ext))
    }

    /// Extracts a tree from a file, choosing the handler by its extension.
    pub fn extract_file(
        &self,
        path: &Path,
        mode: TraversalMode,
        cancel: &CancellationToken,
    ) -> Result<Extraction, ExtractionError> {
        let source = std::fs::read(path)?;
        let hint = path.extension().and_then(|ext| ext.to_str());
        self.extract(&source, hint, mode, cancel)
    }

    /// Extracts a tree from a buffer.
    ///
    /// A hint matching a handler id or extension selects that handler.
    /// Otherwise every handler is tried in registration order and the first
    /// parse without error nodes wins.
    pub fn extract(
        &self,
        source: &[u8],
        language_hint: Option<&str>,
        mode: TraversalMode,
        cancel: &CancellationToken,
    ) -> Result<Extraction, ExtractionError> {
        if let Some(handler) = language_hint.and_then(|hint| self.handler(hint)) {
            let tree = self.parse(handler.as_ref(), source, cancel)?;
            return Ok(self.build(handler.as_ref(), &tree, source, mode));
        }

        for handler in &self.handlers {
            match self.parse(handler.as_ref(), source, cancel) {
                Ok(tree) if !tree.root_node().has_error() => {
                    tracing::debug!("Content accepted by '{}' handler", handler.id());
                    return Ok(self.build(handler.as_ref(), &tree, source, mode));
                }
                Ok(_) => continue,
                Err(ExtractionError::Cancelled) => return Err(ExtractionError::Cancelled),
                Err(e) => tracing::debug!("Handler '{}' failed to parse: {}", handler.id(), e),
            }
        }

        Err(ExtractionError::UnsupportedLanguage)
    }

    fn parse(
        &self,
        handler: &dyn LanguageHandler,
        source: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Tree, ExtractionError> {
        if cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }

        let mut parser = Parser::new();
        parser
            .set_language(&handler.grammar())
            .map_err(|e| ExtractionError::Language(e.to_string()))?;

        let started = Instant::now();
        let timeout = self.timeout;
        let mut progress = |_: &ParseState| {
            if cancel.is_cancelled() || started.elapsed() > timeout {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let options = ParseOptions::new().progress_callback(&mut progress);

        let len = source.len();
        let tree = parser.parse_with_options(
            &mut |offset, _| &source[offset.min(len)..],
            None,
            Some(options),
        );

        match tree {
            Some(tree) => Ok(tree),
            None if cancel.is_cancelled() => Err(ExtractionError::Cancelled),
            None if started.elapsed() > timeout => Err(ExtractionError::Timeout(timeout)),
            None => Err(ExtractionError::ParserFailure),
        }
    }

    fn build(
        &self,
        handler: &dyn LanguageHandler,
        tree: &Tree,
        source: &[u8],
        mode: TraversalMode,
    ) -> Extraction {
        let structural = walk::TreeWalker {
            handler,
            source,
            mode,
            max_depth: self.max_depth,
        }
        .walk(tree);

        Extraction {
            tree: structural,
            language: handler.id().to_string(),
        }
    }
}
