//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` once a
//! second. Remaining time is always derived from the deadline, never counted
//! down, so missed ticks (suspended process, sleeping laptop) cannot make the
//! display drift from real time.
//!
//! ## State Transitions
//!
//! ```text
//! Focus --(deadline passes)--> Break
//! Break --(deadline passes)--> Focus
//! *     --(skip)-------------> Focus
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Database::open()?, SystemClock);
//! engine.initialize();
//! // Once a second:
//! let (view, event) = engine.tick(); // event is Some on a phase change
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::format::format_clock;
use super::phase::Phase;
use crate::events::{Event, TransitionReason};
use crate::storage::{KvStore, TimerRecord, DEFAULT_RECORD_KEY};

/// The authoritative timer state: which phase, and when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    /// End of the current phase, epoch milliseconds.
    pub deadline_ms: i64,
}

impl TimerState {
    /// A fresh phase starting at `now_ms`.
    pub fn starting(phase: Phase, now_ms: i64) -> Self {
        Self {
            phase,
            deadline_ms: now_ms + phase.duration_ms(),
        }
    }

    /// Whole seconds left, rounded up, never negative.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        let left = self.deadline_ms.saturating_sub(now_ms);
        if left <= 0 {
            0
        } else {
            (left as u64).div_ceil(1000)
        }
    }

    /// False when the deadline lies further ahead than the phase can last,
    /// i.e. a tampered record or a clock that moved backwards.
    pub fn is_plausible(&self, now_ms: i64) -> bool {
        self.deadline_ms.saturating_sub(now_ms) <= self.phase.duration_ms()
    }

    fn record(&self) -> TimerRecord {
        TimerRecord::new(self.phase, self.deadline_ms)
    }
}

impl From<TimerRecord> for TimerState {
    fn from(record: TimerRecord) -> Self {
        Self {
            phase: record.phase,
            deadline_ms: record.deadline_ms,
        }
    }
}

/// What the host renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerView {
    pub phase: Phase,
    pub remaining_secs: u64,
}

impl TimerView {
    /// `MM:SS` for the remaining time.
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs as i64)
    }
}

/// Core focus timer engine.
///
/// Owns its store handle and clock; one instance per application.
pub struct TimerEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    key: String,
    state: TimerState,
    /// Last record this engine read from or wrote to the store.
    observed: Option<TimerRecord>,
}

impl<S: KvStore, C: Clock> TimerEngine<S, C> {
    /// Create an engine. Nothing is read until [`TimerEngine::initialize`].
    pub fn new(store: S, clock: C) -> Self {
        let state = TimerState::starting(Phase::Focus, clock.now_ms());
        Self {
            store,
            clock,
            key: DEFAULT_RECORD_KEY.to_string(),
            state,
            observed: None,
        }
    }

    /// Use a different storage key for the persisted record.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn deadline_ms(&self) -> i64 {
        self.state.deadline_ms
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs(self.clock.now_ms())
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            phase: self.state.phase,
            remaining_secs: self.remaining_secs(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let view = self.view();
        Event::StateSnapshot {
            phase: view.phase,
            remaining_secs: view.remaining_secs,
            deadline_ms: self.state.deadline_ms,
            display: view.display(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Sync with the persisted record, creating a fresh focus phase when
    /// there is none (or it cannot be read).
    pub fn initialize(&mut self) -> TimerView {
        match self.read_record() {
            Ok(Some(record)) if !TimerState::from(record).is_plausible(self.clock.now_ms()) => {
                warn!(
                    key = %self.key,
                    phase = %record.phase,
                    deadline_ms = record.deadline_ms,
                    "persisted deadline exceeds phase length, starting focus"
                );
                self.state = TimerState::starting(Phase::Focus, self.clock.now_ms());
                self.persist();
            }
            Ok(Some(record)) => {
                self.state = record.into();
                self.observed = Some(record);
                debug!(
                    phase = %self.state.phase,
                    remaining_secs = self.remaining_secs(),
                    "resumed persisted timer"
                );
            }
            Ok(None) => {
                self.state = TimerState::starting(Phase::Focus, self.clock.now_ms());
                debug!("no persisted timer, starting focus");
                self.persist();
            }
            Err(reason) => {
                warn!(key = %self.key, %reason, "persisted timer unreadable, starting focus");
                self.state = TimerState::starting(Phase::Focus, self.clock.now_ms());
                self.persist();
            }
        }
        self.view()
    }

    /// Call once a second. Returns the view to render and, when the
    /// deadline has passed, the `PhaseChanged` event for the transition.
    pub fn tick(&mut self) -> (TimerView, Option<Event>) {
        self.adopt_external_write();

        let now = self.clock.now_ms();
        if !self.state.is_plausible(now) {
            warn!(phase = %self.state.phase, "clock moved backwards, clamping deadline");
            self.state = TimerState::starting(self.state.phase, now);
            self.persist();
        }
        if self.state.remaining_secs(now) > 0 {
            return (self.view(), None);
        }

        let from = self.state.phase;
        let to = from.next();
        // Chain from the old deadline so overshoot is charged to the new
        // phase; re-anchor if the whole new phase was also missed.
        let mut deadline_ms = self.state.deadline_ms + to.duration_ms();
        if deadline_ms <= now {
            deadline_ms = now + to.duration_ms();
        }
        self.state = TimerState {
            phase: to,
            deadline_ms,
        };
        self.persist();

        let view = self.view();
        debug!(%from, %to, remaining_secs = view.remaining_secs, "phase elapsed");
        let event = self.phase_changed(from, TransitionReason::Elapsed);
        (view, Some(event))
    }

    /// Emergency override: start a fresh focus phase now, whatever the
    /// current phase is.
    pub fn skip(&mut self) -> Event {
        let from = self.state.phase;
        self.state = TimerState::starting(Phase::Focus, self.clock.now_ms());
        self.persist();
        debug!(%from, "skipped to focus");
        self.phase_changed(from, TransitionReason::Skipped)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn phase_changed(&self, from: Phase, reason: TransitionReason) -> Event {
        Event::PhaseChanged {
            from,
            to: self.state.phase,
            reason,
            deadline_ms: self.state.deadline_ms,
            remaining_secs: self.remaining_secs(),
            at: Utc::now(),
        }
    }

    /// `Ok(None)` when nothing is stored, `Err` with a reason when the
    /// stored value is unreadable.
    fn read_record(&self) -> Result<Option<TimerRecord>, String> {
        match self.store.get(&self.key) {
            Ok(Some(raw)) => TimerRecord::decode(&raw)
                .map(Some)
                .ok_or_else(|| format!("unrecognised value {raw:?}")),
            Ok(None) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Pick up a record written by another process since we last looked.
    /// Read failures here are silent; the in-memory state stays authoritative.
    fn adopt_external_write(&mut self) {
        let Ok(Some(record)) = self.read_record() else {
            return;
        };
        if self.observed == Some(record) {
            return;
        }
        self.observed = Some(record);
        if !TimerState::from(record).is_plausible(self.clock.now_ms()) {
            warn!(phase = %record.phase, "ignoring external timer with out-of-range deadline");
            return;
        }
        debug!(phase = %record.phase, "adopting timer written elsewhere");
        self.state = record.into();
    }

    fn persist(&mut self) {
        let record = self.state.record();
        match self.store.set(&self.key, &record.encode()) {
            Ok(()) => self.observed = Some(record),
            Err(e) => warn!(key = %self.key, error = %e, "failed to persist timer"),
        }
    }
}
