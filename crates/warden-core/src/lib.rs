//! # Warden Core Library
//!
//! The focus-timer engine behind the Warden operations dashboard: an
//! enforced FOCUS/BREAK cycle that survives reloads and suspended processes
//! without losing wall-clock accuracy.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A deadline-based state machine; the caller invokes
//!   `tick()` once a second and remaining time is always derived from the
//!   persisted deadline
//! - **Storage**: SQLite key-value storage for the timer record and
//!   TOML-based configuration
//! - **Notify**: Best-effort tone and notification side effects on every
//!   phase change
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`FocusSession`]: Engine plus side-effect dispatch, for hosts
//! - [`Database`]: Durable key-value persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError, StorageError};
pub use events::{Event, TransitionReason};
pub use notify::{
    DispatchLog, EffectStatus, NotificationSink, Permission, SideEffectDispatcher, Tone, ToneSink,
};
pub use session::{FocusSession, Tick};
pub use storage::{Config, Database, KvStore, MemoryStore, TimerRecord};
pub use timer::{
    format_clock, Clock, ManualClock, Phase, SystemClock, TimerEngine, TimerState, TimerView,
};
