//! Persisted timer record.
//!
//! Phase and deadline are written together as one JSON value so a reload
//! during a break cannot be mistaken for a focus deadline. Older installs
//! stored only the deadline as a bare epoch-millisecond string; those are
//! read back as a focus deadline.

use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Key under which the record is stored.
pub const DEFAULT_RECORD_KEY: &str = "pomodoroTargetTime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub phase: Phase,
    /// End of the current phase, epoch milliseconds.
    pub deadline_ms: i64,
}

impl TimerRecord {
    pub fn new(phase: Phase, deadline_ms: i64) -> Self {
        Self { phase, deadline_ms }
    }

    pub fn encode(&self) -> String {
        // Serializing a two-field struct of a unit enum and an integer cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"phase":"{}","deadline_ms":{}}}"#,
                self.phase.as_str().to_lowercase(),
                self.deadline_ms
            )
        })
    }

    /// Parse a stored value. Returns `None` for anything unrecognised.
    pub fn decode(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(record) = serde_json::from_str::<TimerRecord>(raw) {
            return Some(record);
        }
        raw.parse::<i64>()
            .ok()
            .map(|deadline_ms| Self::new(Phase::Focus, deadline_ms))
    }
}
