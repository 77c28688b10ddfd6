//! Side-effect collaborators fired on completion.
//!
//! Failures here never affect timer correctness; the engine logs and moves on.

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    Unsupported,
}

/// System notification delivery.
pub trait Notifier: Send {
    /// Called once at startup. The result is informational only.
    fn request_permission(&mut self) -> Permission;

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Completion sound.
pub trait ChimePlayer: Send {
    fn play_completion_chime(&mut self) -> Result<(), NotifyError>;
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn request_permission(&mut self) -> Permission {
        Permission::Unsupported
    }

    fn notify(&mut self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentChime;

impl ChimePlayer for SilentChime {
    fn play_completion_chime(&mut self) -> Result<(), NotifyError> {
        Ok(())
    }
}
