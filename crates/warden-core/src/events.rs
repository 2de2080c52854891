use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Why the engine left a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionReason {
    /// The deadline passed.
    Elapsed,
    /// Emergency override back to focus.
    Skipped,
}

/// Every state change in the timer produces an Event.
/// The host renders from them; the side-effect dispatcher subscribes to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseChanged {
        from: Phase,
        to: Phase,
        reason: TransitionReason,
        /// Deadline of the new phase, epoch milliseconds.
        deadline_ms: i64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        remaining_secs: u64,
        deadline_ms: i64,
        display: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// `(from, to)` for a phase change, `None` otherwise.
    pub fn transition(&self) -> Option<(Phase, Phase)> {
        match self {
            Event::PhaseChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        }
    }
}
