//! Vault errors
//!
//! These never cross the store/manager boundary: `ProfileStore` and
//! `ProfileManager` log them and answer with `bool` / `Option`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Encryption program not installed: {0}")]
    ToolMissing(String),

    #[error("{program} exited with status {code:?}")]
    ToolFailed { program: String, code: Option<i32> },

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Invalid profile name: {0:?}")]
    InvalidProfileName(String),

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Decrypted profile is not valid UTF-8")]
    InvalidUtf8,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VaultError>;
