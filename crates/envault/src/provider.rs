//! Encryption providers
//!
//! A provider turns plaintext into an opaque blob at a path and back. It is
//! stateless per call: every call obtains the passphrase anew, and nothing
//! is cached between calls.

use age::secrecy::{ExposeSecret, SecretString};
use envault_core::{Config, ProviderKind};
use std::path::Path;

use crate::age_backend::AgeProvider;
use crate::error::{Result, VaultError};
use crate::gpg::GpgProvider;

/// Symmetric encryption capability used by the profile store
pub trait EncryptionProvider {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Encrypt `plaintext` into `destination`, replacing any existing file
    fn encrypt_to_file(&self, plaintext: &[u8], destination: &Path) -> Result<()>;

    /// Decrypt `source`. Either the whole plaintext or an error.
    fn decrypt_from_file(&self, source: &Path) -> Result<Vec<u8>>;
}

/// Why a passphrase is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphrasePurpose {
    Encrypt,
    Decrypt,
}

/// Where providers that need one get their passphrase from
pub trait PassphraseSource {
    fn passphrase(&self, purpose: PassphrasePurpose) -> Result<SecretString>;
}

/// Hidden prompt on the controlling terminal
pub struct TerminalPrompt;

impl PassphraseSource for TerminalPrompt {
    fn passphrase(&self, purpose: PassphrasePurpose) -> Result<SecretString> {
        let first = rpassword::prompt_password("Passphrase: ")?;
        if first.is_empty() {
            return Err(VaultError::Encryption("Empty passphrase not allowed".to_string()));
        }
        let first = SecretString::new(first);

        if purpose == PassphrasePurpose::Encrypt {
            let second = SecretString::new(rpassword::prompt_password("Repeat passphrase: ")?);
            if first.expose_secret() != second.expose_secret() {
                return Err(VaultError::Encryption("Passphrases do not match".to_string()));
            }
        }

        Ok(first)
    }
}

/// Build the provider selected by the configuration
pub fn from_config(config: &Config) -> Box<dyn EncryptionProvider> {
    match config.provider {
        ProviderKind::Gpg => Box::new(GpgProvider::new(config.gpg_program.clone())),
        ProviderKind::Age => Box::new(AgeProvider::new(Box::new(TerminalPrompt))),
    }
}
