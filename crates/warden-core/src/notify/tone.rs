use serde::{Deserialize, Serialize};

use crate::timer::Phase;

const LOW_HZ: f32 = 440.0;
const HIGH_HZ: f32 = 880.0;
const NOTE_MS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub freq_hz: f32,
    pub duration_ms: u32,
}

/// A short two-note cue played on a phase change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub notes: [Note; 2],
    /// 0.0 ..= 1.0
    pub volume: f32,
}

impl Tone {
    /// Rising for a break, falling for a return to focus.
    pub fn entering(phase: Phase) -> Self {
        let (first, second) = match phase {
            Phase::Break => (LOW_HZ, HIGH_HZ),
            Phase::Focus => (HIGH_HZ, LOW_HZ),
        };
        Self {
            notes: [
                Note {
                    freq_hz: first,
                    duration_ms: NOTE_MS,
                },
                Note {
                    freq_hz: second,
                    duration_ms: NOTE_MS,
                },
            ],
            volume: 0.5,
        }
    }

    /// Volume from a 0-100 percentage; larger values clamp.
    pub fn with_volume_pct(mut self, pct: u32) -> Self {
        self.volume = pct.min(100) as f32 / 100.0;
        self
    }

    pub fn is_rising(&self) -> bool {
        self.notes[1].freq_hz > self.notes[0].freq_hz
    }

    pub fn total_ms(&self) -> u32 {
        self.notes.iter().map(|n| n.duration_ms).sum()
    }
}
