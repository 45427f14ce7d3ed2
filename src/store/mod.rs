use crate::onboarding::{validate_steps, WorkflowDefinition};
use crate::shared::{atomic_write_file, GuildId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read guild document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write guild document {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to serialize guild document {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("onboarding definition rejected: {}", .violations.join("; "))]
    Rejected { violations: Vec<String> },
}

fn read_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Read {
        path: path.display().to_string(),
        source,
    }
}

fn write_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Write {
        path: path.display().to_string(),
        source,
    }
}

/// Per-guild welcome document; the text path of the member-join greeting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// YAML documents under `<state root>/guilds/<guild id>/`. Administrator
/// edits land here after validation; the onboarding core only reads.
#[derive(Debug, Clone)]
pub struct GuildStore {
    root: PathBuf,
}

impl GuildStore {
    pub fn new(state_root: &Path) -> Self {
        Self {
            root: state_root.join("guilds"),
        }
    }

    pub fn definition_path(&self, guild_id: &GuildId) -> PathBuf {
        self.root.join(guild_id.as_str()).join("onboarding.yaml")
    }

    pub fn welcome_path(&self, guild_id: &GuildId) -> PathBuf {
        self.root.join(guild_id.as_str()).join("welcome.yaml")
    }

    /// Missing documents read as an empty, disabled definition; a guild's
    /// definition exists from first access onward.
    pub fn load_definition(&self, guild_id: &GuildId) -> Result<WorkflowDefinition, StoreError> {
        let path = self.definition_path(guild_id);
        if !path.exists() {
            return Ok(WorkflowDefinition::empty(guild_id.clone()));
        }
        let raw = fs::read_to_string(&path).map_err(|source| read_error(&path, source))?;
        serde_yaml::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Persists an administrator edit, wholesale. A definition that fails
    /// validation is rejected with every violation and nothing is written.
    pub fn save_definition(&self, definition: &WorkflowDefinition) -> Result<(), StoreError> {
        let violations = validate_steps(&definition.steps);
        if !violations.is_empty() {
            return Err(StoreError::Rejected { violations });
        }
        let path = self.definition_path(&definition.guild_id);
        let body = serde_yaml::to_string(definition).map_err(|source| StoreError::Serialize {
            path: path.display().to_string(),
            source,
        })?;
        self.write_document(&path, body.as_bytes())
    }

    pub fn load_welcome(&self, guild_id: &GuildId) -> Result<WelcomeConfig, StoreError> {
        let path = self.welcome_path(guild_id);
        if !path.exists() {
            return Ok(WelcomeConfig::default());
        }
        let raw = fs::read_to_string(&path).map_err(|source| read_error(&path, source))?;
        serde_yaml::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save_welcome(
        &self,
        guild_id: &GuildId,
        welcome: &WelcomeConfig,
    ) -> Result<(), StoreError> {
        let path = self.welcome_path(guild_id);
        let body = serde_yaml::to_string(welcome).map_err(|source| StoreError::Serialize {
            path: path.display().to_string(),
            source,
        })?;
        self.write_document(&path, body.as_bytes())
    }

    /// Guilds that have at least one persisted document.
    pub fn guild_ids(&self) -> Result<Vec<GuildId>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|source| read_error(&self.root, source))? {
            let entry = entry.map_err(|source| read_error(&self.root, source))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(raw) = name.to_str() else {
                continue;
            };
            if let Ok(guild_id) = GuildId::parse(raw) {
                ids.push(guild_id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn write_document(&self, path: &Path, body: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| write_error(parent, source))?;
        }
        atomic_write_file(path, body).map_err(|source| write_error(path, source))
    }
}
