//! Desktop side effects for the interactive timer.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use focusloop_core::storage::NotificationsConfig;
use focusloop_core::{ChimePlayer, Notifier, NotifyError, Permission};
use notify_rust::Notification;

const CHIME_CANDIDATES: &[&str] = &[
    "/usr/share/sounds/freedesktop/stereo/complete.oga",
    "/usr/share/sounds/freedesktop/stereo/bell.oga",
    "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga",
    "/usr/share/sounds/alsa/Front_Center.wav",
];

/// System notifications through the platform notification daemon.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(config: &NotificationsConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn request_permission(&mut self) -> Permission {
        // Notification daemons have no permission model.
        Permission::Granted
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .icon("alarm-clock");
        // Delivery blocks on the session bus; keep it off the timer task.
        std::thread::Builder::new()
            .name("focusloop-notify".into())
            .spawn(move || {
                if let Err(e) = notification.show() {
                    tracing::warn!(error = %e, "Desktop notification failed");
                }
            })
            .map(|_| ())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

/// Plays a short system sound, falling back to the terminal bell.
#[derive(Debug, Default)]
pub struct SystemChime;

impl ChimePlayer for SystemChime {
    fn play_completion_chime(&mut self) -> Result<(), NotifyError> {
        let sound = CHIME_CANDIDATES
            .iter()
            .copied()
            .find(|p| Path::new(p).exists());
        std::thread::Builder::new()
            .name("focusloop-chime".into())
            .spawn(move || {
                let played = sound.is_some_and(|sound| {
                    ["paplay", "aplay"].iter().any(|player| {
                        Command::new(player)
                            .arg(sound)
                            .stdout(Stdio::null())
                            .stderr(Stdio::null())
                            .status()
                            .is_ok_and(|status| status.success())
                    })
                });
                if !played {
                    let mut stdout = std::io::stdout();
                    let _ = stdout.write_all(b"\x07").and_then(|()| stdout.flush());
                }
            })
            .map(|_| ())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}
