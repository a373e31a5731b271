//! Runtime configuration.
//!
//! An [`Environment`] is an ordinary value handed to whatever needs it. It is
//! read from a `clonescope.json` file found next to the executable (or in any
//! of its ancestors), in the working directory chain, or in
//! `~/.clonescope/`. Missing keys fall back to defaults.

use crate::error::{CloneScopeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "clonescope.json";

pub const DEFAULT_WINDOW_SIZE: usize = 64;
pub const DEFAULT_PARSE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_DEPTH: usize = 1000;
pub const DEFAULT_QUERY_WORKERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Environment {
    /// Corpus root (`<db_path>/<language>/<kind>/*.db`).
    pub db_path: PathBuf,
    pub work_path: PathBuf,
    /// Blob store root.
    pub data_path: PathBuf,
    /// Default query root for scans.
    pub scan_path: PathBuf,
    pub window_size: usize,
    pub parse_timeout_secs: u64,
    pub max_depth: usize,
    pub query_workers: usize,
    /// Zero means one worker per CPU.
    pub corpus_workers: usize,
    pub enable_optional_codecs: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("db"),
            work_path: PathBuf::from("work"),
            data_path: PathBuf::from("data"),
            scan_path: PathBuf::from("scan"),
            window_size: DEFAULT_WINDOW_SIZE,
            parse_timeout_secs: DEFAULT_PARSE_TIMEOUT_SECS,
            max_depth: DEFAULT_MAX_DEPTH,
            query_workers: DEFAULT_QUERY_WORKERS,
            corpus_workers: 0,
            enable_optional_codecs: false,
        }
    }
}

impl Environment {
    /// Loads a config file; relative paths inside it resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut env: Environment = serde_json::from_str(&content)?;
        env.validate()?;
        if let Some(dir) = path.parent() {
            env.resolve_relative_to(dir);
        }
        Ok(env)
    }

    /// Finds and loads the nearest config file, or returns defaults.
    pub fn discover() -> Result<Self> {
        match Self::locate() {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            None => {
                tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    fn locate() -> Option<PathBuf> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let cwd = std::env::current_dir().ok();

        exe_dir
            .iter()
            .chain(cwd.iter())
            .find_map(|start| find_upwards(start, CONFIG_FILE_NAME))
            .or_else(|| {
                dirs::home_dir()
                    .map(|home| home.join(".clonescope").join(CONFIG_FILE_NAME))
                    .filter(|candidate| candidate.is_file())
            })
    }

    pub fn parse_timeout(&self) -> Duration {
        Duration::from_secs(self.parse_timeout_secs)
    }

    pub fn corpus_threads(&self) -> usize {
        if self.corpus_workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.corpus_workers
        }
    }

    fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(CloneScopeError::Config("window_size must be positive".into()));
        }
        if self.query_workers == 0 {
            return Err(CloneScopeError::Config(
                "query_workers must be positive".into(),
            ));
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.db_path,
            &mut self.work_path,
            &mut self.data_path,
            &mut self.scan_path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let env = Environment::default();
        assert_eq!(env.window_size, 64);
        assert_eq!(env.parse_timeout(), Duration::from_secs(60));
        assert_eq!(env.max_depth, 1000);
        assert_eq!(env.query_workers, 2);
        assert!(!env.enable_optional_codecs);
        assert!(env.corpus_threads() >= 1);
    }

    #[test]
    fn test_load_partial_file_resolves_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "db_path": "corpus", "window_size": 32 }"#).unwrap();

        let env = Environment::load(&path).unwrap();
        assert_eq!(env.window_size, 32);
        assert_eq!(env.db_path, dir.path().join("corpus"));
        assert_eq!(env.data_path, dir.path().join("data"));
        assert_eq!(env.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_load_rejects_unknown_keys_and_zero_window() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&path, r#"{ "windowSize": 32 }"#).unwrap();
        assert!(matches!(
            Environment::load(&path),
            Err(CloneScopeError::Json(_))
        ));

        fs::write(&path, r#"{ "window_size": 0 }"#).unwrap();
        assert!(matches!(
            Environment::load(&path),
            Err(CloneScopeError::Config(_))
        ));
    }

    #[test]
    fn test_find_upwards() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a").join(CONFIG_FILE_NAME), "{}").unwrap();

        let found = find_upwards(&nested, CONFIG_FILE_NAME).unwrap();
        assert_eq!(found, dir.path().join("a").join(CONFIG_FILE_NAME));
        assert!(find_upwards(dir.path(), CONFIG_FILE_NAME).is_none());
    }
}
