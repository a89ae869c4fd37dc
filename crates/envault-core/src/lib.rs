//! envault core - Shared functionality for the envault tool
//!
//! Vault layout, configuration and the process plumbing used while an
//! external encryption program or a profile subshell is running.

pub mod config;
pub mod paths;
pub mod process;

pub use config::{Config, ProviderKind};
pub use paths::VaultPaths;
