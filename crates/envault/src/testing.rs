//! In-memory stand-in for an encryption provider

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::error::{Result, VaultError};
use crate::provider::EncryptionProvider;

const MAGIC: &[u8] = b"FAKE1:";

#[derive(Default)]
struct State {
    passphrase: RefCell<String>,
    fail_encrypt: Cell<bool>,
    encrypt_calls: Cell<usize>,
    decrypt_calls: Cell<usize>,
}

/// XORs the plaintext with the passphrase and tags the blob with it, so a
/// different passphrase fails like a real one would. Clones share state.
#[derive(Clone)]
pub struct FakeProvider {
    state: Rc<State>,
}

impl FakeProvider {
    pub fn new() -> Self {
        let state = State::default();
        *state.passphrase.borrow_mut() = "passphrase".to_string();
        Self {
            state: Rc::new(state),
        }
    }

    pub fn set_passphrase(&self, passphrase: &str) {
        *self.state.passphrase.borrow_mut() = passphrase.to_string();
    }

    pub fn fail_encrypt(&self, fail: bool) {
        self.state.fail_encrypt.set(fail);
    }

    pub fn encrypt_calls(&self) -> usize {
        self.state.encrypt_calls.get()
    }

    pub fn decrypt_calls(&self) -> usize {
        self.state.decrypt_calls.get()
    }

    fn tag(&self) -> Vec<u8> {
        let passphrase = self.state.passphrase.borrow();
        let mut tag = MAGIC.to_vec();
        tag.extend(passphrase.bytes().map(|b| b ^ 0xA5));
        tag.push(b'\n');
        tag
    }

    fn scramble(&self, data: &[u8]) -> Vec<u8> {
        let passphrase = self.state.passphrase.borrow();
        let key = passphrase.as_bytes();
        data.iter()
            .enumerate()
            .map(|(i, b)| b ^ key[i % key.len()] ^ 0x5A)
            .collect()
    }
}

impl EncryptionProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn encrypt_to_file(&self, plaintext: &[u8], destination: &Path) -> Result<()> {
        self.state.encrypt_calls.set(self.encrypt_calls() + 1);
        if self.state.fail_encrypt.get() {
            // Like a tool that dies halfway through its output
            fs::write(destination, b"FAKE1:trunc")?;
            return Err(VaultError::ToolFailed {
                program: "fake".to_string(),
                code: Some(2),
            });
        }

        let mut blob = self.tag();
        blob.extend(self.scramble(plaintext));
        fs::write(destination, blob)?;
        Ok(())
    }

    fn decrypt_from_file(&self, source: &Path) -> Result<Vec<u8>> {
        self.state.decrypt_calls.set(self.decrypt_calls() + 1);

        let blob = fs::read(source)?;
        let tag = self.tag();
        let body = blob
            .strip_prefix(tag.as_slice())
            .ok_or_else(|| VaultError::Decryption("bad passphrase".to_string()))?;
        Ok(self.scramble(body))
    }
}
