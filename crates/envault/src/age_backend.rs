//! age backend
//!
//! Passphrase-based age encryption (scrypt + ChaCha20-Poly1305) done in
//! process, for machines without gpg. The ciphertext is produced in memory,
//! so no plaintext temp file is involved.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, VaultError};
use crate::provider::{EncryptionProvider, PassphrasePurpose, PassphraseSource};

pub struct AgeProvider {
    passphrase: Box<dyn PassphraseSource>,
}

impl AgeProvider {
    pub fn new(passphrase: Box<dyn PassphraseSource>) -> Self {
        Self { passphrase }
    }
}

impl EncryptionProvider for AgeProvider {
    fn name(&self) -> &str {
        "age"
    }

    fn encrypt_to_file(&self, plaintext: &[u8], destination: &Path) -> Result<()> {
        let passphrase = self.passphrase.passphrase(PassphrasePurpose::Encrypt)?;
        let encryptor = age::Encryptor::with_user_passphrase(passphrase);

        let mut encrypted = vec![];
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        writer
            .write_all(plaintext)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        writer
            .finish()
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        debug!(destination = %destination.display(), bytes = encrypted.len(), "writing age blob");
        fs::write(destination, encrypted)?;
        Ok(())
    }

    fn decrypt_from_file(&self, source: &Path) -> Result<Vec<u8>> {
        if !source.exists() {
            return Err(VaultError::NotFound(source.display().to_string()));
        }

        let encrypted = fs::read(source)?;

        let decryptor = match age::Decryptor::new(&encrypted[..])
            .map_err(|e| VaultError::Decryption(e.to_string()))?
        {
            age::Decryptor::Passphrase(d) => d,
            _ => {
                return Err(VaultError::Decryption(
                    "Profile is not passphrase-encrypted".to_string(),
                ))
            }
        };

        let passphrase = self.passphrase.passphrase(PassphrasePurpose::Decrypt)?;

        let mut decrypted = vec![];
        let mut reader = decryptor
            .decrypt(&passphrase, None)
            .map_err(|e| VaultError::Decryption(e.to_string()))?;

        // A failed tag check discards everything read so far
        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| VaultError::Decryption(e.to_string()))?;

        debug!(source = %source.display(), "age blob decrypted");
        Ok(decrypted)
    }
}
