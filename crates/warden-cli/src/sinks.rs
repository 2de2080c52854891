//! Terminal and desktop implementations of the core side-effect sinks.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use warden_core::{NotificationSink, NotifyError, Permission, Tone, ToneSink};

/// Desktop notifications through the platform notification server.
pub struct DesktopNotifier {
    permission: Permission,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            permission: Permission::Default,
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for DesktopNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Result<Permission, NotifyError> {
        self.permission = probe_server();
        Ok(self.permission)
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname("warden")
            .icon("alarm-clock")
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::Backend(e.to_string()))
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn probe_server() -> Permission {
    match notify_rust::get_server_information() {
        Ok(info) => {
            tracing::debug!(server = %info.name, "notification server found");
            Permission::Granted
        }
        Err(e) => {
            tracing::debug!(error = %e, "no notification server");
            Permission::Unsupported
        }
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn probe_server() -> Permission {
    Permission::Granted
}

/// Approximates the two-note cue with terminal bells, one per note.
///
/// Plays synchronously so one-shot commands do not exit mid-cue.
pub struct TerminalBell;

impl ToneSink for TerminalBell {
    fn play(&mut self, tone: &Tone) -> Result<(), NotifyError> {
        if !std::io::stderr().is_terminal() {
            return Err(NotifyError::Unsupported);
        }
        if tone.volume <= 0.0 {
            return Ok(());
        }
        let mut err = std::io::stderr();
        for note in tone.notes {
            err.write_all(b"\x07")
                .and_then(|()| err.flush())
                .map_err(|e| NotifyError::Backend(e.to_string()))?;
            std::thread::sleep(Duration::from_millis(u64::from(note.duration_ms)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Phase;

    #[test]
    fn notifier_starts_undecided() {
        assert_eq!(DesktopNotifier::default().permission(), Permission::Default);
    }

    #[test]
    fn bell_returns_after_the_cue() {
        let tone = Tone::entering(Phase::Break);
        let started = std::time::Instant::now();
        match TerminalBell.play(&tone) {
            // Under a test harness stderr is usually captured.
            Err(NotifyError::Unsupported) => {}
            Ok(()) => {
                let cue = Duration::from_millis(u64::from(tone.total_ms()));
                assert!(started.elapsed() >= cue);
            }
            Err(e) => panic!("unexpected bell failure: {e}"),
        }
    }
}
