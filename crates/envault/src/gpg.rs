//! gpg backend
//!
//! Symmetric encryption through the external `gpg` program. gpg asks for
//! the passphrase itself on the caller's terminal, so the passphrase never
//! appears in an argument list, an environment variable or shell history.

use envault_core::process::InterruptGuard;
use std::fs::Permissions;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

use crate::error::{Result, VaultError};
use crate::provider::EncryptionProvider;

pub struct GpgProvider {
    program: String,
}

impl GpgProvider {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn spawn_error(&self, err: std::io::Error) -> VaultError {
        if err.kind() == ErrorKind::NotFound {
            VaultError::ToolMissing(self.program.clone())
        } else {
            VaultError::Io(err)
        }
    }

    fn check_status(&self, status: ExitStatus) -> Result<()> {
        if status.success() {
            Ok(())
        } else {
            Err(VaultError::ToolFailed {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}

impl EncryptionProvider for GpgProvider {
    fn name(&self) -> &str {
        "gpg"
    }

    fn encrypt_to_file(&self, plaintext: &[u8], destination: &Path) -> Result<()> {
        // Owner-only before the first byte is written; removed on drop
        let mut staged = tempfile::Builder::new()
            .prefix("envault_")
            .permissions(Permissions::from_mode(0o600))
            .tempfile()?;
        staged.write_all(plaintext)?;
        staged.flush()?;

        debug!(program = %self.program, destination = %destination.display(), "encrypting");

        let _guard = InterruptGuard::install();
        let status = Command::new(&self.program)
            .args([
                "--symmetric",
                "--pinentry-mode",
                "loopback",
                "--no-batch",
                "--yes",
                "--output",
            ])
            .arg(destination)
            .arg(staged.path())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.spawn_error(e))?;

        self.check_status(status)
    }

    fn decrypt_from_file(&self, source: &Path) -> Result<Vec<u8>> {
        if !source.exists() {
            return Err(VaultError::NotFound(source.display().to_string()));
        }

        debug!(program = %self.program, source = %source.display(), "decrypting");

        let _guard = InterruptGuard::install();
        let output = Command::new(&self.program)
            .args(["--decrypt", "--pinentry-mode", "loopback", "--quiet"])
            .arg(source)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        self.check_status(output.status)?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    /// Stand-in for gpg that rot13s its input, honouring the same arguments
    const FAKE_GPG: &str = r#"#!/bin/sh
mode=""
out=""
while [ $# -gt 1 ]; do
  case "$1" in
    --symmetric) mode=enc ;;
    --decrypt) mode=dec ;;
    --output) shift; out="$1" ;;
  esac
  shift
done
case "$mode" in
  enc) tr 'A-Za-z' 'N-ZA-Mn-za-m' < "$1" > "$out" ;;
  dec) tr 'A-Za-z' 'N-ZA-Mn-za-m' < "$1" ;;
  *) exit 2 ;;
esac
"#;

    fn install_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_encrypt_then_decrypt_with_fake_gpg() {
        let dir = tempdir().unwrap();
        let gpg = GpgProvider::new(install_script(dir.path(), "gpg", FAKE_GPG));
        let blob = dir.path().join("work.env.gpg");

        gpg.encrypt_to_file(b"export TOKEN=\"abc\"\n", &blob).unwrap();

        let on_disk = fs::read(&blob).unwrap();
        assert!(!String::from_utf8_lossy(&on_disk).contains("TOKEN"));

        let plaintext = gpg.decrypt_from_file(&blob).unwrap();
        assert_eq!(plaintext, b"export TOKEN=\"abc\"\n");
    }

    #[test]
    fn test_missing_program() {
        let dir = tempdir().unwrap();
        let gpg = GpgProvider::new("envault-test-no-such-gpg");
        let blob = dir.path().join("p.env.gpg");

        let err = gpg.encrypt_to_file(b"export A=\"1\"\n", &blob).unwrap_err();
        assert!(matches!(err, VaultError::ToolMissing(_)));

        fs::write(&blob, b"whatever").unwrap();
        let err = gpg.decrypt_from_file(&blob).unwrap_err();
        assert!(matches!(err, VaultError::ToolMissing(_)));
    }

    #[test]
    fn test_nonzero_exit() {
        let dir = tempdir().unwrap();
        let gpg = GpgProvider::new(install_script(dir.path(), "gpg", "#!/bin/sh\nexit 2\n"));
        let blob = dir.path().join("p.env.gpg");
        fs::write(&blob, b"blob").unwrap();

        let err = gpg.decrypt_from_file(&blob).unwrap_err();
        assert!(matches!(err, VaultError::ToolFailed { code: Some(2), .. }));

        let err = gpg.encrypt_to_file(b"x", &blob).unwrap_err();
        assert!(matches!(err, VaultError::ToolFailed { .. }));
    }

    #[test]
    fn test_staged_plaintext_is_private_and_removed() {
        for code in [0, 1] {
            let dir = tempdir().unwrap();
            // Records how it saw its input file, then writes the blob or fails
            let script = format!(
                "#!/bin/sh\n\
                 here=$(dirname \"$0\")\n\
                 for last; do :; done\n\
                 stat -c %a \"$last\" > \"$here/mode\"\n\
                 printf '%s' \"$last\" > \"$here/staged\"\n\
                 [ {code} -eq 0 ] && printf 'blob' > \"$here/p.env.gpg\"\n\
                 exit {code}\n"
            );
            let gpg = GpgProvider::new(install_script(dir.path(), "gpg", &script));
            let blob = dir.path().join("p.env.gpg");

            let result = gpg.encrypt_to_file(b"export TOKEN=\"abc\"\n", &blob);
            assert_eq!(result.is_ok(), code == 0, "exit {code}");

            let mode = fs::read_to_string(dir.path().join("mode")).unwrap();
            assert_eq!(mode.trim(), "600", "exit {code}");

            let staged = fs::read_to_string(dir.path().join("staged")).unwrap();
            assert!(!staged.is_empty());
            assert!(!Path::new(&staged).exists(), "exit {code}: {staged} left behind");
        }
    }

    #[test]
    fn test_decrypt_missing_file_skips_program() {
        let dir = tempdir().unwrap();
        let gpg = GpgProvider::new("envault-test-no-such-gpg");

        let err = gpg.decrypt_from_file(&dir.path().join("absent.env.gpg")).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }
}
