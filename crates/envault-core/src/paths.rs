//! Standard paths used by envault

use std::path::{Path, PathBuf};

/// Suffix of every encrypted profile file
pub const PROFILE_SUFFIX: &str = ".env.gpg";

/// Name of the profiles subdirectory inside the vault
pub const PROFILES_DIR: &str = "profiles";

/// Default vault location, relative to the home directory
pub const DEFAULT_VAULT_DIR: &str = "~/.apivault";

/// Layout of one vault on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    /// Vault root (~/.apivault)
    pub root: PathBuf,
    /// Encrypted profiles (~/.apivault/profiles)
    pub profiles: PathBuf,
}

impl VaultPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let profiles = root.join(PROFILES_DIR);
        Self { root, profiles }
    }

    /// Path of the encrypted file for a profile
    pub fn profile_file(&self, name: &str) -> PathBuf {
        self.profiles.join(format!("{}{}", name, PROFILE_SUFFIX))
    }

    /// Profile name for a file name in the profiles directory, if it is one
    pub fn profile_name(file_name: &str) -> Option<&str> {
        file_name
            .strip_suffix(PROFILE_SUFFIX)
            .filter(|stem| !stem.is_empty())
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
