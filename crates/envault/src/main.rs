//! envault - Encrypted environment-variable profiles
//!
//! Commands:
//! - init [PROFILE]: Create the vault (and optionally an empty profile)
//! - set KEY=VALUE -p <PROFILE>: Store a variable
//! - load <PROFILE> [--shell]: Print export lines, or start a subshell
//! - sign <PROFILE>: Start a subshell with the profile loaded
//! - list: List profiles
//! - keys <PROFILE>: List variable names of a profile
//! - delete <PROFILE> [--key KEY]: Delete a variable or a whole profile

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use envault::envfile::{self, EnvVars};
use envault::shell::{self, ShellExit};
use envault::{provider, ProfileManager, ProfileStore};
use envault_core::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envault")]
#[command(about = "Secure environment variable manager - encrypted profiles of KEY=VALUE pairs")]
#[command(version)]
#[command(after_help = r#"EXAMPLES:
    # Set a secret in a profile
    envault set STRIPE_KEY=sk_test_123 --profile myproject

    # Load secrets into the current shell
    eval "$(envault load myproject)"

    # Spawn a new shell with the secrets loaded
    envault load myproject --shell

    # Delete a secret, or a whole profile
    envault delete myproject --key STRIPE_KEY
    envault delete myproject

SHELL INTEGRATION:
    Add this to your .bashrc or .zshrc:

    load_env() {
        eval "$(envault load ${1:-default})"
    }

    Then: load_env myproject

SECURITY:
    - Profiles are encrypted with gpg --symmetric (or age, see config)
    - The passphrase is asked for on every operation and never stored
    - Vault stored in ~/.apivault/profiles/ (override with ENVAULT_HOME)"#)]
struct Cli {
    /// Vault directory (overrides config and ENVAULT_HOME)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vault, optionally with an empty profile
    Init {
        /// Profile to create
        profile: Option<String>,
    },

    /// Set an environment variable in a profile
    #[command(visible_alias = "lock")]
    Set {
        /// Variable in KEY=VALUE format
        key_value: String,
        /// Profile name
        #[arg(short, long, default_value = "default")]
        profile: String,
    },

    /// Print a profile as export lines (eval "$(envault load NAME)")
    #[command(visible_alias = "unlock")]
    Load {
        /// Profile name
        profile: String,
        /// Spawn a new shell with the profile's variables instead
        #[arg(long)]
        shell: bool,
    },

    /// Spawn a new shell with a profile loaded
    Sign {
        /// Profile name
        profile: String,
    },

    /// List all profiles
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the variable names in a profile (values hidden)
    Keys {
        /// Profile name
        profile: String,
    },

    /// Delete a profile, or one variable from it
    #[command(visible_alias = "purge")]
    Delete {
        /// Profile name
        profile: String,
        /// Variable to delete (without it, the whole profile is deleted)
        #[arg(short, long)]
        key: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr: stdout carries export lines for eval
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_default()?;
    if let Some(vault) = cli.vault {
        config.vault_dir = vault;
    }

    let store = ProfileStore::new(config.vault_paths(), provider::from_config(&config));
    let manager = ProfileManager::new(store);

    match cli.command {
        Commands::Init { profile } => cmd_init(&manager, profile.as_deref()),
        Commands::Set { key_value, profile } => cmd_set(&manager, &profile, &key_value),
        Commands::Load { profile, shell } => cmd_load(&manager, &config, &profile, shell),
        Commands::Sign { profile } => cmd_load(&manager, &config, &profile, true),
        Commands::List { json } => cmd_list(&manager, json),
        Commands::Keys { profile } => cmd_keys(&manager, &profile),
        Commands::Delete { profile, key } => cmd_delete(&manager, &profile, key.as_deref()),
    }
}

/// Split `KEY=VALUE` on the first '='
fn parse_key_value(input: &str) -> Result<(String, String)> {
    let Some((key, value)) = input.split_once('=') else {
        bail!("Expected KEY=VALUE, got '{}'", input);
    };

    if !envfile::is_valid_key(key) {
        bail!(
            "Invalid variable name '{}': use letters, digits and underscores, not starting with a digit",
            key
        );
    }

    Ok((key.to_string(), value.to_string()))
}

/// Create the vault
fn cmd_init(manager: &ProfileManager, profile: Option<&str>) -> Result<ExitCode> {
    let store = manager.store();
    if !store.ensure_vault() {
        bail!("Failed to create vault at {}", store.paths().root.display());
    }
    println!("success: Vault ready at {}", store.paths().root.display());

    if let Some(name) = profile {
        if store.profile_exists(name) {
            println!("warning: Profile \"{}\" already exists", name);
        } else if manager.create_profile(name, &EnvVars::new()) {
            println!("success: Profile \"{}\" created", name);
        } else {
            bail!("Failed to create profile '{}'", name);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Store a variable
fn cmd_set(manager: &ProfileManager, profile: &str, key_value: &str) -> Result<ExitCode> {
    let (key, value) = parse_key_value(key_value)?;

    if !manager.set_variable(profile, &key, &value) {
        bail!("Failed to set variable in profile '{}'", profile);
    }

    println!("Key saved to profile \"{}\"", profile);
    Ok(ExitCode::SUCCESS)
}

/// Print or spawn a profile
fn cmd_load(
    manager: &ProfileManager,
    config: &Config,
    profile: &str,
    spawn_shell: bool,
) -> Result<ExitCode> {
    let Some(content) = manager.load_profile(profile) else {
        bail!("Profile '{}' not found or cannot be decrypted", profile);
    };

    if !spawn_shell {
        println!("{}", content.trim_end());
        return Ok(ExitCode::SUCCESS);
    }

    match shell::spawn_profile_shell(&content, &config.shell_program())? {
        ShellExit::Exited(Some(code)) => Ok(ExitCode::from(code.clamp(0, 255) as u8)),
        ShellExit::Exited(None) => Ok(ExitCode::FAILURE),
        ShellExit::Interrupted => Ok(ExitCode::SUCCESS),
    }
}

/// List all profiles
fn cmd_list(manager: &ProfileManager, json: bool) -> Result<ExitCode> {
    let profiles = manager.list_profiles();

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(ExitCode::SUCCESS);
    }

    if profiles.is_empty() {
        println!("No profiles found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Available profiles:");
    for profile in &profiles {
        println!("  - {}", profile);
    }

    Ok(ExitCode::SUCCESS)
}

/// List variable names of a profile
fn cmd_keys(manager: &ProfileManager, profile: &str) -> Result<ExitCode> {
    let Some(vars) = manager.variables(profile) else {
        bail!("Profile '{}' not found or cannot be decrypted", profile);
    };

    if vars.is_empty() {
        println!("Profile \"{}\" has no variables.", profile);
    }
    for key in vars.keys() {
        println!("{}", key);
    }

    Ok(ExitCode::SUCCESS)
}

/// Delete a variable or a profile
fn cmd_delete(manager: &ProfileManager, profile: &str, key: Option<&str>) -> Result<ExitCode> {
    match key {
        Some(key) => {
            if !manager.delete_variable(profile, key) {
                bail!("Failed to delete variable from profile '{}'", profile);
            }
            println!("Variable '{}' deleted from profile \"{}\"", key, profile);
        }
        None => {
            if !manager.delete_profile(profile) {
                bail!("Failed to delete profile '{}'", profile);
            }
            println!("Profile \"{}\" deleted", profile);
        }
    }

    Ok(ExitCode::SUCCESS)
}
