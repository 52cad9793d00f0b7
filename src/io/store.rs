use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::io::config_io;
use crate::io::lock::LockError;
use crate::model::config::StoreConfig;

/// Directory holding a preference store.
pub const STORE_DIR: &str = ".prefmend";

/// Error type for preference store I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no preference store found: run `prefmend init` to create .prefmend/")]
    NotAStore,
    #[error("preference store already exists at {0} (use --force to reinitialize)")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not serialize preferences: {0}")]
    StateSerializeError(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// An opened preference store: its directory and parsed config.
#[derive(Debug, Clone)]
pub struct Store {
    pub dir: PathBuf,
    pub config: StoreConfig,
}

impl Store {
    /// Open the store rooted at `dir` (the `.prefmend/` directory itself).
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        if !dir.join(config_io::CONFIG_FILE).is_file() {
            return Err(StoreError::NotAStore);
        }
        let config = config_io::read_config(dir)?;
        debug!(dir = %dir.display(), state_file = %config.storage.state_file, "opened store");
        Ok(Store {
            dir: dir.to_path_buf(),
            config,
        })
    }

    /// Path of the persisted user object.
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(&self.config.storage.state_file)
    }
}

/// Walk up from `start` looking for a `.prefmend/` directory with a config.
/// Returns the store directory.
pub fn discover_store(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(STORE_DIR);
        if candidate.is_dir() && candidate.join(config_io::CONFIG_FILE).is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(StoreError::NotAStore);
        }
    }
}

/// Create `.prefmend/` under `root` with the default config.
/// An existing store is only rewritten with `force`; its state file is kept.
pub fn init_store(root: &Path, force: bool) -> Result<PathBuf, StoreError> {
    let dir = root.join(STORE_DIR);
    if dir.join(config_io::CONFIG_FILE).exists() && !force {
        return Err(StoreError::AlreadyExists(dir));
    }
    fs::create_dir_all(&dir).map_err(|e| StoreError::WriteError {
        path: dir.clone(),
        source: e,
    })?;
    config_io::write_default_config(&dir)?;
    Ok(dir)
}
