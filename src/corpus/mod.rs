pub mod load;
pub mod roll;

use serde::{Deserialize, Serialize};

/// Velocity assumed for notes whose source carried none.
pub const DEFAULT_VELOCITY: u8 = 100;

/// Highest valid MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// Highest valid General MIDI program number.
pub const MAX_PROGRAM: u8 = 127;

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

/// A single sounded pitch with onset and release in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

impl Note {
    pub fn new(pitch: u8, start: f64, end: f64) -> Self {
        Self {
            pitch,
            start,
            end,
            velocity: DEFAULT_VELOCITY,
        }
    }

    /// `end - start`. Not clamped: a malformed note yields a negative duration.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One track of a piece: a program/name descriptor plus its notes in onset order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(default)]
    pub program: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_drum: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Instrument {
    pub fn new(program: u8, name: impl Into<String>, is_drum: bool, notes: Vec<Note>) -> Self {
        Self {
            program,
            name: name.into(),
            is_drum,
            notes,
        }
    }

    /// Latest release time among the notes, 0.0 for an empty instrument.
    pub fn end_time(&self) -> f64 {
        self.notes.iter().map(|n| n.end).fold(0.0, f64::max)
    }
}

/// All instruments of one piece.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub instruments: Vec<Instrument>,
}

impl Corpus {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }

    pub fn total_notes(&self) -> usize {
        self.instruments.iter().map(|i| i.notes.len()).sum()
    }

    pub fn end_time(&self) -> f64 {
        self.instruments
            .iter()
            .map(Instrument::end_time)
            .fold(0.0, f64::max)
    }

    /// Check the structural contract every stat function relies on.
    ///
    /// Negative durations are allowed through on purpose; they are reported
    /// as-is by the duration statistics.
    pub fn validate(&self) -> Result<(), String> {
        for (idx, inst) in self.instruments.iter().enumerate() {
            if inst.program > MAX_PROGRAM {
                return Err(format!("instrument {idx}: program {} out of range", inst.program));
            }
            let mut prev_start = f64::NEG_INFINITY;
            for (n, note) in inst.notes.iter().enumerate() {
                if note.pitch > MAX_PITCH {
                    return Err(format!(
                        "instrument {idx}, note {n}: pitch {} out of range",
                        note.pitch
                    ));
                }
                if !note.start.is_finite() || !note.end.is_finite() {
                    return Err(format!("instrument {idx}, note {n}: non-finite time"));
                }
                if note.start < prev_start {
                    return Err(format!(
                        "instrument {idx}, note {n}: notes not ordered by start time"
                    ));
                }
                prev_start = note.start;
            }
        }
        Ok(())
    }
}

/// Which instruments receive an entry in per-instrument results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentFilter {
    #[default]
    All,
    PitchedOnly,
    DrumOnly,
}

impl InstrumentFilter {
    pub fn includes(self, inst: &Instrument) -> bool {
        match self {
            Self::All => true,
            Self::PitchedOnly => !inst.is_drum,
            Self::DrumOnly => inst.is_drum,
        }
    }
}
