//! Phase-change side effects: an audible cue and a system notification.
//!
//! Both are best-effort. A host plugs in whatever sinks its platform has;
//! failures are logged and recorded in the [`DispatchLog`], never returned.

mod dispatcher;
mod tone;

pub use dispatcher::{message_for, DispatchLog, EffectStatus, SideEffectDispatcher};
pub use tone::{Note, Tone};

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Notification permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet asked.
    Default,
    Unsupported,
}

/// Delivers system notifications.
pub trait NotificationSink {
    fn permission(&self) -> Permission;

    /// Ask the user. Only called while [`Permission::Default`].
    fn request_permission(&mut self) -> Result<Permission, NotifyError>;

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Plays a [`Tone`].
pub trait ToneSink {
    fn play(&mut self, tone: &Tone) -> Result<(), NotifyError>;
}

/// A sink for hosts without the capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl NotificationSink for Unsupported {
    fn permission(&self) -> Permission {
        Permission::Unsupported
    }

    fn request_permission(&mut self) -> Result<Permission, NotifyError> {
        Ok(Permission::Unsupported)
    }

    fn notify(&mut self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Unsupported)
    }
}

impl ToneSink for Unsupported {
    fn play(&mut self, _tone: &Tone) -> Result<(), NotifyError> {
        Err(NotifyError::Unsupported)
    }
}
