use super::RuntimeError;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub root: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn required_directories(&self) -> Vec<PathBuf> {
        vec![self.guilds_dir(), self.root.join("logs")]
    }

    pub fn guilds_dir(&self) -> PathBuf {
        self.root.join("guilds")
    }

    pub fn runtime_log_path(&self) -> PathBuf {
        self.root.join("logs/runtime.log")
    }
}

pub const DEFAULT_STATE_ROOT_DIR: &str = ".concierge";

pub fn default_state_root_path() -> Result<PathBuf, RuntimeError> {
    let home = std::env::var_os("HOME").ok_or(RuntimeError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(DEFAULT_STATE_ROOT_DIR))
}

/// `CONCIERGE_STATE_ROOT` overrides the home-based default.
pub fn resolve_state_root() -> Result<PathBuf, RuntimeError> {
    if let Some(root) = std::env::var_os("CONCIERGE_STATE_ROOT") {
        if !root.is_empty() {
            return Ok(PathBuf::from(root));
        }
    }
    default_state_root_path()
}

pub fn bootstrap_state_root(paths: &StatePaths) -> Result<(), RuntimeError> {
    for path in paths.required_directories() {
        fs::create_dir_all(&path).map_err(|source| RuntimeError::CreateDir {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}
