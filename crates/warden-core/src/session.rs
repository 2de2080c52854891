//! Host-facing focus session.
//!
//! Pairs one [`TimerEngine`] with one [`SideEffectDispatcher`] so every
//! phase change the engine emits reaches the tone and notification sinks
//! exactly once. Construct one at startup and hand it to whatever drives
//! the once-a-second tick.

use crate::events::Event;
use crate::notify::{DispatchLog, Permission, SideEffectDispatcher};
use crate::storage::KvStore;
use crate::timer::{Clock, SystemClock, TimerEngine, TimerView};

/// Result of one tick.
#[derive(Debug, Clone)]
pub struct Tick {
    pub view: TimerView,
    pub event: Option<Event>,
    pub dispatch: Option<DispatchLog>,
}

pub struct FocusSession<S, C = SystemClock> {
    engine: TimerEngine<S, C>,
    effects: SideEffectDispatcher,
    permission: Option<Permission>,
}

impl<S: KvStore, C: Clock> FocusSession<S, C> {
    pub fn new(engine: TimerEngine<S, C>, effects: SideEffectDispatcher) -> Self {
        Self {
            engine,
            effects,
            permission: None,
        }
    }

    pub fn engine(&self) -> &TimerEngine<S, C> {
        &self.engine
    }

    pub fn view(&self) -> TimerView {
        self.engine.view()
    }

    /// Notification permission after the last [`FocusSession::initialize`].
    pub fn permission(&self) -> Option<Permission> {
        self.permission
    }

    /// Reload-sync the timer and ask for notification permission.
    pub fn initialize(&mut self) -> TimerView {
        let view = self.engine.initialize();
        self.permission = Some(self.effects.prepare());
        view
    }

    pub fn tick(&mut self) -> Tick {
        let (view, event) = self.engine.tick();
        let dispatch = event
            .as_ref()
            .and_then(|e| self.effects.on_phase_changed(e));
        Tick {
            view,
            event,
            dispatch,
        }
    }

    /// Emergency override back to focus.
    pub fn skip(&mut self) -> (Event, Option<DispatchLog>) {
        let event = self.engine.skip();
        let dispatch = self.effects.on_phase_changed(&event);
        (event, dispatch)
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timer::{ManualClock, Phase, FOCUS_SECS};

    fn session() -> (FocusSession<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let engine = TimerEngine::new(MemoryStore::new(), clock.clone());
        (FocusSession::new(engine, SideEffectDispatcher::silent()), clock)
    }

    #[test]
    fn initialize_records_permission() {
        let (mut s, _) = session();
        assert!(s.permission().is_none());
        s.initialize();
        assert_eq!(s.permission(), Some(Permission::Unsupported));
    }

    #[test]
    fn transition_is_dispatched_once() {
        let (mut s, clock) = session();
        s.initialize();
        clock.advance_secs(FOCUS_SECS as i64);
        let tick = s.tick();
        assert!(tick.event.is_some());
        assert_eq!(tick.dispatch.map(|d| d.entered), Some(Phase::Break));

        clock.advance_secs(1);
        let tick = s.tick();
        assert!(tick.event.is_none());
        assert!(tick.dispatch.is_none());
    }

    #[test]
    fn skip_while_focused_resets_without_dispatch() {
        let (mut s, clock) = session();
        s.initialize();
        clock.advance_secs(600);
        let (event, dispatch) = s.skip();
        assert_eq!(event.transition(), Some((Phase::Focus, Phase::Focus)));
        assert!(dispatch.is_none());
        assert_eq!(s.view().remaining_secs, FOCUS_SECS);
    }
}
