//! Configuration management for envault

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::{expand_tilde, VaultPaths, DEFAULT_VAULT_DIR};

/// Environment variable that overrides the configured vault directory
pub const VAULT_ENV: &str = "ENVAULT_HOME";

/// Which encryption backend protects profile files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// External `gpg --symmetric`
    #[default]
    Gpg,
    /// In-process age passphrase encryption
    Age,
}

/// Global envault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Vault root directory
    #[serde(default = "default_vault_dir")]
    pub vault_dir: PathBuf,

    /// Encryption backend
    #[serde(default)]
    pub provider: ProviderKind,

    /// gpg executable name or path
    #[serde(default = "default_gpg_program")]
    pub gpg_program: String,

    /// Shell used by `load --shell` (falls back to $SHELL)
    #[serde(default)]
    pub shell: Option<String>,
}

fn default_vault_dir() -> PathBuf {
    PathBuf::from(DEFAULT_VAULT_DIR)
}

fn default_gpg_program() -> String {
    "gpg".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            provider: ProviderKind::default(),
            gpg_program: default_gpg_program(),
            shell: None,
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", path))
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from the standard location, applying the environment override
    pub fn load_default() -> Result<Self> {
        let mut config = Self::load(&Self::config_path())?;
        if let Some(dir) = std::env::var_os(VAULT_ENV).filter(|v| !v.is_empty()) {
            config.vault_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the config file path (~/.config/envault/config.json)
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("envault")
            .join("config.json")
    }

    /// Vault layout for the configured directory
    pub fn vault_paths(&self) -> VaultPaths {
        VaultPaths::new(expand_tilde(&self.vault_dir))
    }

    /// Shell program for profile subshells
    pub fn shell_program(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "/bin/bash".to_string())
    }
}
