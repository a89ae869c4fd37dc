//! Profile subshells
//!
//! `load --shell` hands a decrypted profile to a new interactive shell. bash
//! sources it from a 0600 rc file that lives exactly as long as the shell
//! session; other shells get the variables through their environment.

use envault_core::process::{self, InterruptGuard};
use std::fs::Permissions;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::envfile;
use crate::error::{Result, VaultError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a profile shell ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// The shell exited on its own
    Exited(Option<i32>),
    /// Ctrl+C reached envault; the shell was told to terminate
    Interrupted,
}

fn accepts_rcfile(shell: &str) -> bool {
    Path::new(shell)
        .file_name()
        .map(|name| name.to_string_lossy().contains("bash"))
        .unwrap_or(false)
}

fn spawn_error(shell: &str, err: std::io::Error) -> VaultError {
    if err.kind() == ErrorKind::NotFound {
        VaultError::ToolMissing(shell.to_string())
    } else {
        VaultError::Io(err)
    }
}

/// Run `shell` with the profile's variables and wait for it
pub fn spawn_profile_shell(content: &str, shell: &str) -> Result<ShellExit> {
    if !accepts_rcfile(shell) {
        let vars = envfile::parse(content).vars;
        debug!(shell, variables = vars.len(), "starting shell with profile environment");

        let guard = InterruptGuard::install();
        let child = Command::new(shell)
            .envs(&vars)
            .spawn()
            .map_err(|e| spawn_error(shell, e))?;
        return supervise(child, &guard);
    }

    let mut rcfile = tempfile::Builder::new()
        .prefix("env_")
        .suffix(".sh")
        .permissions(Permissions::from_mode(0o600))
        .tempfile()?;
    rcfile.write_all(content.as_bytes())?;
    rcfile.flush()?;

    debug!(shell, rcfile = %rcfile.path().display(), "starting shell with profile rc file");

    let guard = InterruptGuard::install();
    let child = Command::new(shell)
        .arg("--rcfile")
        .arg(rcfile.path())
        .spawn()
        .map_err(|e| spawn_error(shell, e))?;

    // rcfile is removed when this returns, whichever way the shell ended
    supervise(child, &guard)
}

fn supervise(mut child: Child, guard: &InterruptGuard) -> Result<ShellExit> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(ShellExit::Exited(status.code()));
        }

        if guard.interrupted() {
            info!(pid = child.id(), "interrupted, terminating profile shell");
            process::terminate(child.id());
            return Ok(ShellExit::Interrupted);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn install_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_accepts_rcfile() {
        assert!(accepts_rcfile("/bin/bash"));
        assert!(accepts_rcfile("/usr/local/bin/bash5"));
        assert!(!accepts_rcfile("/bin/zsh"));
        assert!(!accepts_rcfile("fish"));
    }

    #[test]
    fn test_bash_gets_rcfile_which_is_removed() {
        let dir = tempdir().unwrap();
        let shell = install_script(
            dir.path(),
            "fakebash",
            "#!/bin/sh\n\
             here=$(dirname \"$0\")\n\
             [ \"$1\" = \"--rcfile\" ] || exit 9\n\
             cp \"$2\" \"$here/captured\"\n\
             printf '%s' \"$2\" > \"$here/rcpath\"\n\
             ls -l \"$2\" | cut -c1-10 > \"$here/mode\"\n\
             exit 3\n",
        );

        let content = "export TOKEN=\"abc\"\n";
        let exit = spawn_profile_shell(content, &shell).unwrap();
        assert_eq!(exit, ShellExit::Exited(Some(3)));

        assert_eq!(fs::read_to_string(dir.path().join("captured")).unwrap(), content);
        assert_eq!(
            fs::read_to_string(dir.path().join("mode")).unwrap().trim(),
            "-rw-------"
        );

        let rcpath = fs::read_to_string(dir.path().join("rcpath")).unwrap();
        assert!(!Path::new(&rcpath).exists());
    }

    #[test]
    fn test_other_shells_get_environment() {
        let dir = tempdir().unwrap();
        let shell = install_script(
            dir.path(),
            "fakezsh",
            "#!/bin/sh\nprintf '%s' \"$TOKEN\" > \"$(dirname \"$0\")/token\"\n",
        );

        let exit = spawn_profile_shell("export TOKEN=\"two words\"\n", &shell).unwrap();
        assert_eq!(exit, ShellExit::Exited(Some(0)));
        assert_eq!(
            fs::read_to_string(dir.path().join("token")).unwrap(),
            "two words"
        );
    }

    #[test]
    fn test_missing_shell() {
        let err = spawn_profile_shell("export A=\"1\"\n", "/nonexistent/bash").unwrap_err();
        assert!(matches!(err, VaultError::ToolMissing(_)));
    }
}
