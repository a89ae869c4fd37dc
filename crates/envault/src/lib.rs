//! envault - Encrypted environment-variable profiles
//!
//! "Secrets at rest stay encrypted; they exist in plaintext only inside the
//! shell that asked for them."
//!
//! A profile is a named set of KEY=VALUE pairs stored as one encrypted file
//! in an owner-only vault directory. Profiles decrypt to `export` lines for
//! `eval`, or straight into a subshell.
//!
//! Encryption is delegated to gpg (default) or age, behind
//! [`EncryptionProvider`].

pub mod age_backend;
pub mod envfile;
pub mod error;
pub mod gpg;
pub mod profiles;
pub mod provider;
pub mod shell;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use envfile::EnvVars;
pub use error::VaultError;
pub use profiles::ProfileManager;
pub use provider::EncryptionProvider;
pub use store::ProfileStore;
