use clonescope_core::compression::CompressionRegistry;
use clonescope_core::config::Environment;
use clonescope_core::error::Result;
use clonescope_core::extract::Extractor;
use clonescope_core::scan::Searcher;
use clonescope_plugin::LanguageHandler;
use std::sync::Arc;
use tree_sitter::Parser;

/// Builds an extractor with every bundled language handler.
///
/// C++ is registered first, so it wins when content of unknown language
/// parses cleanly under several grammars.
pub fn build_default_extractor(env: &Environment) -> Extractor {
    let mut extractor = Extractor::from_env(env);
    register(&mut extractor, Arc::new(clonescope_cpp::CppHandler::new()));
    register(&mut extractor, Arc::new(clonescope_java::JavaHandler::new()));
    extractor
}

fn register(extractor: &mut Extractor, handler: Arc<dyn LanguageHandler>) {
    // A grammar built against an incompatible ABI is rejected here, not per file.
    match Parser::new().set_language(&handler.grammar()) {
        Ok(()) => extractor.register(handler),
        Err(e) => tracing::error!("Failed to load {} grammar: {}", handler.id(), e),
    }
}

pub fn build_registry(env: &Environment) -> CompressionRegistry {
    CompressionRegistry::from_env(env)
}

/// Assembles a searcher from the environment with the default languages
/// and codecs.
pub fn build_searcher(env: &Environment) -> Result<Searcher> {
    Searcher::new(
        Arc::new(build_default_extractor(env)),
        Arc::new(build_registry(env)),
        env,
    )
}

/// File logging for a CLI command, optionally echoed to stderr. Drop the
/// returned guard last.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(clonescope_core::logging::init_logging(component, to_stderr))
}
