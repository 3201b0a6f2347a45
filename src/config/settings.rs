use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::MasterKey;
use crate::errors::{Result, VaultError};

/// Project-level configuration, loaded from `.apivault.toml`.
///
/// Every field has a sensible default so the vault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path (relative to the project root) of the SQLite vault database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Environment variable holding the 64-hex-character master key.
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database_path() -> String {
    ".apivault/vault.db".to_string()
}

fn default_master_key_env() -> String {
    "ENCRYPTION_KEY".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            master_key_env: default_master_key_env(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".apivault.toml";

    /// Load settings from `<project_dir>/.apivault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Configuration(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path to the vault database.
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.database_path)
    }

    /// Load and validate the master key from the configured variable.
    pub fn master_key(&self) -> Result<MasterKey> {
        MasterKey::from_env(&self.master_key_env)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
