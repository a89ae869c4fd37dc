//! Profile manager - variable-level edits on top of whole-profile blobs
//!
//! Every edit is a full round trip: decrypt, parse the export lines into an
//! ordered map, change one key, encrypt the whole map again. Nothing is ever
//! patched in place, so the file on disk is always either the old blob or
//! the new one.
//!
//! Re-parsing normalizes: lines that are not `export KEY="VALUE"` do not
//! survive an edit.

use tracing::{debug, warn};

use crate::envfile::{self, EnvVars};
use crate::store::ProfileStore;

pub struct ProfileManager {
    store: ProfileStore,
}

impl ProfileManager {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Create or replace a profile with exactly `vars`
    pub fn create_profile(&self, name: &str, vars: &EnvVars) -> bool {
        self.store.encrypt_profile(name, vars)
    }

    /// Decrypted export lines, ready to be sourced by a POSIX shell
    pub fn load_profile(&self, name: &str) -> Option<String> {
        self.store.decrypt_profile(name)
    }

    /// Decrypted variables of a profile
    pub fn variables(&self, name: &str) -> Option<EnvVars> {
        self.load_profile(name).map(|content| self.parse(name, &content))
    }

    fn parse(&self, name: &str, content: &str) -> EnvVars {
        let parsed = envfile::parse(content);
        if parsed.dropped > 0 {
            warn!(
                profile = name,
                dropped = parsed.dropped,
                "ignoring lines that are not export lines"
            );
        }
        parsed.vars
    }

    /// Insert or replace one variable, keeping all others
    pub fn set_variable(&self, name: &str, key: &str, value: &str) -> bool {
        let mut vars = match self.load_profile(name) {
            Some(content) => self.parse(name, &content),
            // An existing blob we cannot read must not be replaced by a
            // one-variable profile.
            None if self.store.profile_exists(name) => return false,
            None => EnvVars::new(),
        };

        debug!(profile = name, key, replaced = vars.contains_key(key), "setting variable");
        vars.insert(key.to_string(), value.to_string());

        self.store.encrypt_profile(name, &vars)
    }

    /// Remove one variable. Removing a key that is not there still rewrites
    /// the profile and succeeds; an unreadable profile is `false`.
    pub fn delete_variable(&self, name: &str, key: &str) -> bool {
        let Some(content) = self.load_profile(name) else {
            return false;
        };

        let mut vars = self.parse(name, &content);
        if vars.shift_remove(key).is_none() {
            debug!(profile = name, key, "variable not present");
        }

        self.store.encrypt_profile(name, &vars)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        self.store.list_profiles()
    }

    pub fn delete_profile(&self, name: &str) -> bool {
        self.store.delete_profile(name)
    }
}
