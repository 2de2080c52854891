use serde::{Deserialize, Serialize};

/// Length of a focus interval in seconds (25 min).
pub const FOCUS_SECS: u64 = 25 * 60;
/// Length of a break interval in seconds (5 min).
pub const BREAK_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Focus,
    Break,
}

impl Phase {
    pub fn duration_secs(self) -> u64 {
        match self {
            Phase::Focus => FOCUS_SECS,
            Phase::Break => BREAK_SECS,
        }
    }

    pub fn duration_ms(self) -> i64 {
        (self.duration_secs() * 1000) as i64
    }

    /// The phase that follows this one when its deadline passes.
    pub fn next(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Focus => "FOCUS",
            Phase::Break => "BREAK",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
