mod blob;
mod compare;
mod scan;
mod store;
mod view;

use clap::{Parser, Subcommand};
use clonescope_api::SourceKind;
use clonescope_core::config::Environment;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "clonescope",
    version,
    about = "Structural code clone detection",
    long_about = "Clonescope fingerprints source code by the shape of its syntax trees and finds \
                  copied regions between a query tree and a corpus of stored fingerprints, \
                  even when identifiers or formatting differ."
)]
pub struct Cli {
    /// Configuration file (defaults to the nearest clonescope.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fingerprint a source directory into a corpus shard
    Store {
        /// Language handler id or extension (e.g. cpp, java)
        #[arg(long)]
        lang: String,
        /// Where the sources were collected from
        #[arg(long, default_value = "github")]
        kind: SourceKind,
        /// Shard file name, without extension
        #[arg(long)]
        name: String,
        #[arg(value_name = "SOURCE_ROOT")]
        path: PathBuf,
    },
    /// Match two files against each other and print the shared regions
    Compare {
        /// Require identifier names to agree as well
        #[arg(long)]
        deep: bool,
        /// Window size in structural nodes
        #[arg(long)]
        window: Option<usize>,
        #[arg(value_name = "BASE")]
        base: PathBuf,
        #[arg(value_name = "SEARCH")]
        search: PathBuf,
    },
    /// Scan a directory against the configured corpus
    Scan {
        /// Window size in structural nodes
        #[arg(long)]
        window: Option<usize>,
        /// Skip name verification of the hits
        #[arg(long)]
        no_deep: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Query root. Defaults to the configured scan path.
        #[arg(value_name = "ROOT")]
        path: Option<PathBuf>,
    },
    /// Store a file's serialized fingerprint in the blob store
    Blob {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = clonescope_runtime::init_logging("cli", true);

    let env = match &cli.config {
        Some(path) => Environment::load(path)?,
        None => Environment::discover()?,
    };

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Store {
            lang,
            kind,
            name,
            path,
        } => rt.block_on(store::run(env, lang, kind, name, path)),
        Commands::Compare {
            deep,
            window,
            base,
            search,
        } => {
            let window = window.unwrap_or(env.window_size);
            compare::run(&env, &base, &search, window, deep)
        }
        Commands::Scan {
            window,
            no_deep,
            json,
            path,
        } => {
            let root = path.unwrap_or_else(|| env.scan_path.clone());
            let window = window.unwrap_or(env.window_size);
            rt.block_on(scan::run(env, root, window, !no_deep, json))
        }
        Commands::Blob { path } => blob::run(&env, &path),
    }
}

/// Cancels `token` on the first Ctrl-C. Abort the handle once the guarded
/// work is over.
fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            token.cancel();
        }
    })
}
