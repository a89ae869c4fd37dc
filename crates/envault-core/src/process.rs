//! Process management utilities
//!
//! envault blocks on one child process at a time (gpg or a profile shell).
//! While it waits, Ctrl+C must reach the child without killing the parent
//! before it has removed its plaintext temp files.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn record_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Records SIGINT instead of terminating the process, until dropped.
///
/// A caught signal is reset to its default disposition by `exec`, so
/// children spawned while the guard is active still react to Ctrl+C.
///
/// Not reentrant: all guards share one process-wide flag, which `install`
/// clears, and each guard restores the handler it replaced. Nested guards
/// must be dropped in reverse order of installation, and guards must not be
/// installed from several threads at once.
pub struct InterruptGuard {
    previous: libc::sighandler_t,
}

impl InterruptGuard {
    pub fn install() -> Self {
        INTERRUPTED.store(false, Ordering::SeqCst);

        let handler = record_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: the handler only touches an atomic.
        let previous = unsafe { libc::signal(libc::SIGINT, handler) };
        let previous = if previous == libc::SIG_ERR {
            tracing::warn!("could not install SIGINT handler");
            libc::SIG_DFL
        } else {
            previous
        };

        Self { previous }
    }

    /// Whether SIGINT arrived since the guard was installed
    pub fn interrupted(&self) -> bool {
        INTERRUPTED.load(Ordering::SeqCst)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        // SAFETY: restores the disposition returned by signal(2).
        unsafe {
            libc::signal(libc::SIGINT, self.previous);
        }
    }
}

/// Ask a child process to terminate
pub fn terminate(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}
