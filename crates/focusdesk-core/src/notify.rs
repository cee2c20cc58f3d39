//! Completion notifications.
//!
//! Delivery is best-effort: the engine logs a failed notification and moves
//! on, so implementations should report errors rather than retry.

use std::io::Write;
use tracing::info;

use crate::error::NotifyError;

pub trait Notifier: Send + Sync {
    /// Play the audible completion cue.
    fn play_sound(&self) -> Result<(), NotifyError>;

    /// Raise a user-facing alert.
    fn show_alert(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Rings the terminal bell and prints alerts to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn play_sound(&self) -> Result<(), NotifyError> {
        let mut stderr = std::io::stderr();
        stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| NotifyError::Sound(e.to_string()))
    }

    fn show_alert(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        info!(title, body, "alert");
        writeln!(std::io::stderr(), "{title}: {body}").map_err(|e| NotifyError::Alert(e.to_string()))
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn play_sound(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn show_alert(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
