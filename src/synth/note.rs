use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Identity of a sounding note: pitch class plus octave, as in `C4` or `F#2`.
///
/// At most one voice exists per `NoteId`. Labels parse with sharps or flats
/// (`Db5` and `C#5` are the same note) and always display with sharps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId {
    octave: i8,
    pitch_class: u8,
}

impl NoteId {
    /// `pitch_class` is 0 for C through 11 for B.
    pub fn new(pitch_class: u8, octave: i8) -> Option<Self> {
        (pitch_class < 12).then_some(Self {
            octave,
            pitch_class,
        })
    }

    pub fn from_midi(midi: u8) -> Self {
        Self {
            octave: (midi / 12) as i8 - 1,
            pitch_class: midi % 12,
        }
    }

    pub fn pitch_class(self) -> u8 {
        self.pitch_class
    }

    pub fn octave(self) -> i8 {
        self.octave
    }

    /// MIDI note number (C4 = 60). Can fall outside 0..=127 for extreme octaves.
    pub fn midi(self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.pitch_class as i32
    }

    /// Equal-tempered frequency with A4 = 440 Hz.
    pub fn frequency(self) -> f32 {
        440.0 * 2f32.powf((self.midi() - 69) as f32 / 12.0)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NAMES[self.pitch_class as usize], self.octave)
    }
}

impl FromStr for NoteId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidNote(s.to_string());
        let mut chars = s.trim().chars();

        let base: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (shift, octave) = if let Some(o) = rest.strip_prefix('#') {
            (1, o)
        } else if let Some(o) = rest.strip_prefix('b') {
            (-1, o)
        } else {
            (0, rest)
        };

        let mut octave: i32 = octave.parse().map_err(|_| invalid())?;
        let mut pitch = base + shift;
        // Cb and B# cross the octave boundary
        if pitch < 0 {
            pitch += 12;
            octave -= 1;
        } else if pitch > 11 {
            pitch -= 12;
            octave += 1;
        }

        let octave = i8::try_from(octave).map_err(|_| invalid())?;
        NoteId::new(pitch as u8, octave).ok_or_else(invalid)
    }
}

impl TryFrom<String> for NoteId {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NoteId> for String {
    fn from(note: NoteId) -> Self {
        note.to_string()
    }
}
