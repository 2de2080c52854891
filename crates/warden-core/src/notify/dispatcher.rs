//! Reacts to phase changes with a tone and a notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{NotificationSink, Permission, Tone, ToneSink, Unsupported};
use crate::events::Event;
use crate::storage::NotificationsConfig;
use crate::timer::Phase;

/// Outcome of one side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectStatus {
    Delivered,
    Skipped {
        reason: String,
    },
    Failed {
        reason: String,
    },
}

/// What happened for a single phase change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLog {
    pub entered: Phase,
    pub tone: EffectStatus,
    pub notification: EffectStatus,
    pub dispatched_at: DateTime<Utc>,
}

impl DispatchLog {
    pub fn failure_count(&self) -> usize {
        [&self.tone, &self.notification]
            .iter()
            .filter(|s| matches!(s, EffectStatus::Failed { .. }))
            .count()
    }
}

/// Title and body shown when entering `phase`.
pub fn message_for(phase: Phase) -> (&'static str, &'static str) {
    match phase {
        Phase::Break => ("Break time", "Step away. The work can wait."),
        Phase::Focus => ("Back to focus", "25 minutes on the clock."),
    }
}

pub struct SideEffectDispatcher {
    tone: Box<dyn ToneSink>,
    notifier: Box<dyn NotificationSink>,
    sound_enabled: bool,
    notifications_enabled: bool,
    volume_pct: u32,
}

impl SideEffectDispatcher {
    /// A dispatcher with no capabilities; every effect is skipped.
    pub fn silent() -> Self {
        Self::new(Unsupported, Unsupported)
    }

    pub fn new(tone: impl ToneSink + 'static, notifier: impl NotificationSink + 'static) -> Self {
        Self {
            tone: Box::new(tone),
            notifier: Box::new(notifier),
            sound_enabled: true,
            notifications_enabled: true,
            volume_pct: 50,
        }
    }

    /// Apply the user's notification preferences.
    pub fn configured(mut self, config: &NotificationsConfig) -> Self {
        self.sound_enabled = config.sound;
        self.notifications_enabled = config.enabled;
        self.volume_pct = config.volume;
        self
    }

    /// Ask for notification permission if the user has not decided yet.
    pub fn prepare(&mut self) -> Permission {
        if !self.notifications_enabled {
            return self.notifier.permission();
        }
        match self.notifier.permission() {
            Permission::Default => match self.notifier.request_permission() {
                Ok(permission) => {
                    debug!(?permission, "notification permission requested");
                    permission
                }
                Err(e) => {
                    warn!(error = %e, "notification permission request failed");
                    Permission::Default
                }
            },
            other => other,
        }
    }

    /// Play the cue and notify, once per actual phase change.
    ///
    /// Returns `None` for events that are not a change of phase, including a
    /// skip issued while already focusing.
    pub fn on_phase_changed(&mut self, event: &Event) -> Option<DispatchLog> {
        let (from, to) = event.transition()?;
        if from == to {
            return None;
        }

        let tone = self.play_tone(to);
        let notification = self.send_notification(to);
        Some(DispatchLog {
            entered: to,
            tone,
            notification,
            dispatched_at: Utc::now(),
        })
    }

    fn play_tone(&mut self, entering: Phase) -> EffectStatus {
        if !self.sound_enabled {
            return EffectStatus::Skipped {
                reason: "sound disabled".into(),
            };
        }
        let tone = Tone::entering(entering).with_volume_pct(self.volume_pct);
        match self.tone.play(&tone) {
            Ok(()) => EffectStatus::Delivered,
            Err(e) => {
                warn!(error = %e, "transition tone failed");
                EffectStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn send_notification(&mut self, entering: Phase) -> EffectStatus {
        if !self.notifications_enabled {
            return EffectStatus::Skipped {
                reason: "notifications disabled".into(),
            };
        }
        let permission = self.notifier.permission();
        if permission != Permission::Granted {
            return EffectStatus::Skipped {
                reason: format!("permission {permission:?}").to_lowercase(),
            };
        }
        let (title, body) = message_for(entering);
        match self.notifier.notify(title, body) {
            Ok(()) => EffectStatus::Delivered,
            Err(e) => {
                warn!(error = %e, "phase notification failed");
                EffectStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl Default for SideEffectDispatcher {
    fn default() -> Self {
        Self::silent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::events::TransitionReason;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        tones: Rc<RefCell<Vec<Tone>>>,
        notes: Rc<RefCell<Vec<(String, String)>>>,
    }

    struct FakeTone(Recorder);

    impl ToneSink for FakeTone {
        fn play(&mut self, tone: &Tone) -> Result<(), NotifyError> {
            self.0.tones.borrow_mut().push(tone.clone());
            Ok(())
        }
    }

    struct FakeNotifier {
        rec: Recorder,
        permission: Permission,
        grant_on_request: bool,
    }

    impl NotificationSink for FakeNotifier {
        fn permission(&self) -> Permission {
            self.permission
        }

        fn request_permission(&mut self) -> Result<Permission, NotifyError> {
            self.permission = if self.grant_on_request {
                Permission::Granted
            } else {
                Permission::Denied
            };
            Ok(self.permission)
        }

        fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
            self.rec
                .notes
                .borrow_mut()
                .push((title.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct BrokenTone;

    impl ToneSink for BrokenTone {
        fn play(&mut self, _tone: &Tone) -> Result<(), NotifyError> {
            Err(NotifyError::Backend("no audio device".into()))
        }
    }

    /// Granted but every delivery fails; permission requests error out when
    /// the host reports it as undecided.
    struct BrokenNotifier(Permission);

    impl NotificationSink for BrokenNotifier {
        fn permission(&self) -> Permission {
            self.0
        }

        fn request_permission(&mut self) -> Result<Permission, NotifyError> {
            Err(NotifyError::Backend("dbus connection refused".into()))
        }

        fn notify(&mut self, _title: &str, _body: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Backend("dbus connection refused".into()))
        }
    }

    fn changed(from: Phase, to: Phase) -> Event {
        Event::PhaseChanged {
            from,
            to,
            reason: TransitionReason::Elapsed,
            deadline_ms: 0,
            remaining_secs: to.duration_secs(),
            at: Utc::now(),
        }
    }

    fn dispatcher(rec: &Recorder, permission: Permission) -> SideEffectDispatcher {
        SideEffectDispatcher::new(
            FakeTone(rec.clone()),
            FakeNotifier {
                rec: rec.clone(),
                permission,
                grant_on_request: true,
            },
        )
    }

    #[test]
    fn entering_break_rises_and_notifies() {
        let rec = Recorder::default();
        let mut d = dispatcher(&rec, Permission::Granted);
        let log = d.on_phase_changed(&changed(Phase::Focus, Phase::Break)).unwrap();
        assert_eq!(log.tone, EffectStatus::Delivered);
        assert_eq!(log.notification, EffectStatus::Delivered);
        assert!(rec.tones.borrow()[0].is_rising());
        assert_eq!(rec.notes.borrow()[0].0, "Break time");
    }

    #[test]
    fn entering_focus_falls() {
        let rec = Recorder::default();
        let mut d = dispatcher(&rec, Permission::Granted);
        d.on_phase_changed(&changed(Phase::Break, Phase::Focus));
        assert!(!rec.tones.borrow()[0].is_rising());
        assert_eq!(rec.notes.borrow()[0].0, "Back to focus");
    }

    #[test]
    fn same_phase_is_ignored() {
        let rec = Recorder::default();
        let mut d = dispatcher(&rec, Permission::Granted);
        assert!(d.on_phase_changed(&changed(Phase::Focus, Phase::Focus)).is_none());
        assert!(rec.tones.borrow().is_empty());
        assert!(rec.notes.borrow().is_empty());
    }

    #[test]
    fn denied_permission_skips_notification_only() {
        let rec = Recorder::default();
        let mut d = dispatcher(&rec, Permission::Denied);
        let log = d.on_phase_changed(&changed(Phase::Focus, Phase::Break)).unwrap();
        assert_eq!(log.tone, EffectStatus::Delivered);
        assert!(matches!(log.notification, EffectStatus::Skipped { .. }));
        assert!(rec.notes.borrow().is_empty());
    }

    #[test]
    fn prepare_requests_only_when_undecided() {
        let rec = Recorder::default();
        let mut d = dispatcher(&rec, Permission::Default);
        assert_eq!(d.prepare(), Permission::Granted);

        let mut denied = dispatcher(&rec, Permission::Denied);
        assert_eq!(denied.prepare(), Permission::Denied);
    }

    #[test]
    fn failures_are_swallowed() {
        let mut d = SideEffectDispatcher::new(BrokenTone, Unsupported);
        assert_eq!(d.prepare(), Permission::Unsupported);
        let log = d.on_phase_changed(&changed(Phase::Focus, Phase::Break)).unwrap();
        assert_eq!(log.failure_count(), 1);
        assert!(matches!(log.notification, EffectStatus::Skipped { .. }));
    }

    #[test]
    fn config_disables_effects() {
        let rec = Recorder::default();
        let config = NotificationsConfig {
            enabled: false,
            sound: false,
            volume: 80,
        };
        let mut d = dispatcher(&rec, Permission::Granted).configured(&config);
        let log = d.on_phase_changed(&changed(Phase::Focus, Phase::Break)).unwrap();
        assert!(matches!(log.tone, EffectStatus::Skipped { .. }));
        assert!(matches!(log.notification, EffectStatus::Skipped { .. }));
        assert!(rec.tones.borrow().is_empty());
    }

    #[test]
    fn volume_flows_into_tone() {
        let rec = Recorder::default();
        let config = NotificationsConfig {
            enabled: true,
            sound: true,
            volume: 80,
        };
        let mut d = dispatcher(&rec, Permission::Granted).configured(&config);
        d.on_phase_changed(&changed(Phase::Focus, Phase::Break));
        assert_eq!(rec.tones.borrow()[0].volume, 0.8);
    }

    #[test]
    fn notify_failure_is_recorded_not_raised() {
        let rec = Recorder::default();
        let mut d =
            SideEffectDispatcher::new(FakeTone(rec.clone()), BrokenNotifier(Permission::Granted));
        let log = d.on_phase_changed(&changed(Phase::Break, Phase::Focus)).unwrap();
        assert_eq!(log.tone, EffectStatus::Delivered);
        assert!(matches!(
            log.notification,
            EffectStatus::Failed { ref reason } if reason.contains("dbus")
        ));
        assert_eq!(log.failure_count(), 1);
        assert_eq!(rec.tones.borrow().len(), 1);
    }

    #[test]
    fn failed_permission_request_stays_undecided() {
        let mut d = SideEffectDispatcher::new(Unsupported, BrokenNotifier(Permission::Default));
        assert_eq!(d.prepare(), Permission::Default);
        let log = d.on_phase_changed(&changed(Phase::Focus, Phase::Break)).unwrap();
        assert!(matches!(log.notification, EffectStatus::Skipped { .. }));
    }
}
