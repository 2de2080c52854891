mod clock;
mod engine;
mod format;
mod phase;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{TimerEngine, TimerState, TimerView};
pub use format::format_clock;
pub use phase::{Phase, BREAK_SECS, FOCUS_SECS};
