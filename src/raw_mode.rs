//! Scoped raw mode for the controlling terminal, using rustix's safe termios API.
//!
//! Only canonical mode and echo are switched off. Output processing and signal keys
//! keep working, so `\n` still moves to the start of the next line.

use rustix::termios::{self, LocalModes, OptionalActions, Termios};
use std::io;

/// Restores the saved terminal attributes when dropped.
///
/// The guard is inactive when stdin is not a terminal (pipes, tests), in which case
/// entering and leaving raw mode are both no-ops.
#[derive(Debug)]
pub struct RawModeGuard {
    original: Option<Termios>,
}

impl RawModeGuard {
    /// A guard that changes nothing.
    pub fn inactive() -> Self {
        Self { original: None }
    }

    /// Switch stdin to non-canonical, non-echoing input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal attributes cannot be read or written.
    pub fn enable() -> io::Result<Self> {
        let stdin = io::stdin();
        if !termios::isatty(&stdin) {
            return Ok(Self::inactive());
        }

        let original = termios::tcgetattr(&stdin)?;
        let mut raw = original.clone();
        raw.local_modes.remove(LocalModes::ECHO | LocalModes::ICANON);
        termios::tcsetattr(&stdin, OptionalActions::Flush, &raw)?;
        tracing::trace!("raw mode enabled");

        Ok(Self {
            original: Some(original),
        })
    }

    /// Whether dropping this guard touches the terminal.
    pub fn is_active(&self) -> bool {
        self.original.is_some()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = termios::tcsetattr(io::stdin(), OptionalActions::Flush, &original) {
                tracing::warn!(error = %e, "failed to restore terminal attributes");
            } else {
                tracing::trace!("raw mode disabled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_guard_is_a_no_op() {
        let guard = RawModeGuard::inactive();
        assert!(!guard.is_active());
        drop(guard);
    }
}
