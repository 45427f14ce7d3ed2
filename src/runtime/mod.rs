pub mod logging;
pub mod runs;
pub mod state_paths;

pub use logging::append_runtime_log;
pub use runs::{start_onboarding, RunRequest};
pub use state_paths::{
    bootstrap_state_root, default_state_root_path, resolve_state_root, StatePaths,
    DEFAULT_STATE_ROOT_DIR,
};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to create runtime path {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to resolve home directory for runtime state root")]
    HomeDirectoryUnavailable,
}
