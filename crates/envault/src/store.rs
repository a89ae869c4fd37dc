//! Profile store - encrypted profile files inside the vault
//!
//! Each profile is exactly one file, `<vault>/profiles/<name>.env.gpg`,
//! holding an opaque blob produced by the encryption provider. The store
//! knows nothing about variables; it moves whole plaintexts in and out.
//!
//! Expected failures (missing profile, wrong passphrase, missing gpg, I/O)
//! are logged here and reported as `false` / `None`.

use envault_core::VaultPaths;
use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::envfile::{self, EnvVars};
use crate::error::{Result, VaultError};
use crate::provider::EncryptionProvider;

const STAGING_PREFIX: &str = ".envault.";

/// Reject names that would escape the profiles directory
pub fn validate_name(name: &str) -> Result<()> {
    if matches!(name, "" | "." | "..") || name.contains('/') || name.contains('\0') {
        return Err(VaultError::InvalidProfileName(name.to_string()));
    }
    Ok(())
}

pub struct ProfileStore {
    paths: VaultPaths,
    provider: Box<dyn EncryptionProvider>,
}

impl ProfileStore {
    pub fn new(paths: VaultPaths, provider: Box<dyn EncryptionProvider>) -> Self {
        Self { paths, provider }
    }

    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    /// Create the vault and profiles directories (mode 700). Idempotent.
    pub fn ensure_vault(&self) -> bool {
        match self.try_ensure_vault() {
            Ok(()) => true,
            Err(e) => {
                warn!(vault = %self.paths.root.display(), error = %e, "cannot prepare vault");
                false
            }
        }
    }

    fn try_ensure_vault(&self) -> Result<()> {
        if !self.paths.profiles.is_dir() {
            info!(vault = %self.paths.root.display(), "creating vault");
        }
        fs::create_dir_all(&self.paths.profiles)?;
        fs::set_permissions(&self.paths.root, Permissions::from_mode(0o700))?;
        fs::set_permissions(&self.paths.profiles, Permissions::from_mode(0o700))?;
        Ok(())
    }

    /// Path of a profile's encrypted file, if the name is usable
    pub fn profile_path(&self, name: &str) -> Option<PathBuf> {
        validate_name(name).ok()?;
        Some(self.paths.profile_file(name))
    }

    pub fn profile_exists(&self, name: &str) -> bool {
        self.profile_path(name).is_some_and(|p| p.is_file())
    }

    /// Encrypt `vars` as the complete new content of profile `name`
    pub fn encrypt_profile(&self, name: &str, vars: &EnvVars) -> bool {
        match self.try_encrypt_profile(name, vars) {
            Ok(()) => true,
            Err(e) => {
                warn!(profile = name, provider = self.provider.name(), error = %e, "encryption failed");
                false
            }
        }
    }

    fn try_encrypt_profile(&self, name: &str, vars: &EnvVars) -> Result<()> {
        validate_name(name)?;
        self.try_ensure_vault()?;

        let destination = self.paths.profile_file(name);
        let plaintext = envfile::render(vars);

        // Encrypt beside the destination, then rename over it: a failed or
        // interrupted run leaves the previous blob untouched. The staging name
        // never ends in the profile suffix and is no longer than any profile's.
        let staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(".tmp")
            .permissions(Permissions::from_mode(0o600))
            .tempfile_in(&self.paths.profiles)?;

        self.provider
            .encrypt_to_file(plaintext.as_bytes(), staged.path())?;

        fs::set_permissions(staged.path(), Permissions::from_mode(0o600))?;
        staged.persist(&destination).map_err(|e| e.error)?;

        debug!(profile = name, variables = vars.len(), "profile written");
        Ok(())
    }

    /// Decrypt profile `name` to its export-line plaintext.
    ///
    /// A missing profile returns `None` without running the provider, so
    /// nobody is asked for a passphrase for nothing.
    pub fn decrypt_profile(&self, name: &str) -> Option<String> {
        match self.try_decrypt_profile(name) {
            Ok(content) => Some(content),
            Err(VaultError::NotFound(_)) => {
                debug!(profile = name, "profile not found");
                None
            }
            Err(e) => {
                warn!(profile = name, provider = self.provider.name(), error = %e, "decryption failed");
                None
            }
        }
    }

    fn try_decrypt_profile(&self, name: &str) -> Result<String> {
        validate_name(name)?;

        let path = self.paths.profile_file(name);
        if !path.is_file() {
            return Err(VaultError::NotFound(name.to_string()));
        }

        let plaintext = self.provider.decrypt_from_file(&path)?;
        String::from_utf8(plaintext).map_err(|_| VaultError::InvalidUtf8)
    }

    /// Profile names in the vault, sorted. Only file names are inspected.
    pub fn list_profiles(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.paths.profiles) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.paths.profiles.display(), error = %e, "no profiles directory");
                return vec![];
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().to_string();
                VaultPaths::profile_name(&file_name)
                    .filter(|name| validate_name(name).is_ok())
                    .map(str::to_string)
            })
            .collect();

        names.sort();
        names
    }

    /// Remove a profile's file. `false` if it was absent or could not be removed.
    pub fn delete_profile(&self, name: &str) -> bool {
        let Some(path) = self.profile_path(name) else {
            warn!(profile = name, "invalid profile name");
            return false;
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                info!(profile = name, "profile deleted");
                true
            }
            Err(e) => {
                debug!(profile = name, error = %e, "profile not deleted");
                false
            }
        }
    }
}
