// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch tables and diatonic scale construction.
//!
//! Provides note names, the seven diatonic modes, an equal-tempered
//! pitch table and the scale builder that turns (key, mode) into the
//! ordered pitch list the generators index by scale degree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Semitone offset type
pub type Semitones = i8;

/// Number of notes in the pitch table (full MIDI range)
pub const PITCH_TABLE_SIZE: usize = 128;

/// MIDI note number of A4, the reference pitch
pub const REFERENCE_NOTE: MidiNote = 69;

/// Degrees in a diatonic scale
pub const DIATONIC_DEGREES: usize = 7;

/// Semitone offsets of the major scale, which every mode rotates
const MAJOR_STEPS: [u8; DIATONIC_DEGREES] = [0, 2, 4, 5, 7, 9, 11];

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        Note::ALL
            .iter()
            .position(|&n| n == self)
            .map(|pc| pc as u8)
            .unwrap_or(0)
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Parse note from string (e.g., "C", "C#", "Db", "F#")
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        match s.as_str() {
            "C" | "B#" | "BS" => Some(Note::C),
            "C#" | "CS" | "DB" => Some(Note::Cs),
            "D" => Some(Note::D),
            "D#" | "DS" | "EB" => Some(Note::Ds),
            "E" | "FB" => Some(Note::E),
            "F" | "E#" | "ES" => Some(Note::F),
            "F#" | "FS" | "GB" => Some(Note::Fs),
            "G" => Some(Note::G),
            "G#" | "GS" | "AB" => Some(Note::Gs),
            "A" => Some(Note::A),
            "A#" | "AS" | "BB" => Some(Note::As),
            "B" | "CB" => Some(Note::B),
            _ => None,
        }
    }

    /// Transpose by semitones
    pub fn transpose(self, semitones: Semitones) -> Self {
        let new_pc = (self.pitch_class() as i8 + semitones).rem_euclid(12) as u8;
        Note::from_pitch_class(new_pc)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Note::C => "C",
            Note::Cs => "C#",
            Note::D => "D",
            Note::Ds => "D#",
            Note::E => "E",
            Note::F => "F",
            Note::Fs => "F#",
            Note::G => "G",
            Note::Gs => "G#",
            Note::A => "A",
            Note::As => "A#",
            Note::B => "B",
        };
        write!(f, "{}", name)
    }
}

/// The seven diatonic modes, indexed 0 (Ionian) through 6 (Locrian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Ionian,     // Major
    Dorian,     // Minor with raised 6th
    Phrygian,   // Minor with lowered 2nd
    Lydian,     // Major with raised 4th
    Mixolydian, // Major with lowered 7th
    Aeolian,    // Natural minor
    Locrian,    // Diminished
}

impl ScaleType {
    /// All modes in index order
    pub const ALL: [ScaleType; DIATONIC_DEGREES] = [
        ScaleType::Ionian,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::Aeolian,
        ScaleType::Locrian,
    ];

    /// Stable numeric identifier of this mode (0-6)
    pub fn index(self) -> u8 {
        ScaleType::ALL
            .iter()
            .position(|&s| s == self)
            .map(|i| i as u8)
            .unwrap_or(0)
    }

    /// Mode for a numeric identifier
    pub fn from_index(index: u8) -> Option<Self> {
        ScaleType::ALL.get(index as usize).copied()
    }

    /// Semitone offsets from the tonic, ascending
    pub fn intervals(self) -> [u8; DIATONIC_DEGREES] {
        let mode = self.index() as usize;
        let base = MAJOR_STEPS[mode];
        let mut intervals = [0u8; DIATONIC_DEGREES];
        for (i, interval) in intervals.iter_mut().enumerate() {
            *interval = (MAJOR_STEPS[(mode + i) % DIATONIC_DEGREES] + 12 - base) % 12;
        }
        intervals
    }

    /// Parse scale type from string
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace([' ', '-', '_'], "");
        match s.as_str() {
            "major" | "ionian" => Some(ScaleType::Ionian),
            "dorian" => Some(ScaleType::Dorian),
            "phrygian" => Some(ScaleType::Phrygian),
            "lydian" => Some(ScaleType::Lydian),
            "mixolydian" => Some(ScaleType::Mixolydian),
            "minor" | "naturalminor" | "aeolian" => Some(ScaleType::Aeolian),
            "locrian" => Some(ScaleType::Locrian),
            _ => None,
        }
    }

    /// Get a human-readable name for this scale type
    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Ionian => "Major",
            ScaleType::Dorian => "Dorian",
            ScaleType::Phrygian => "Phrygian",
            ScaleType::Lydian => "Lydian",
            ScaleType::Mixolydian => "Mixolydian",
            ScaleType::Aeolian => "Minor",
            ScaleType::Locrian => "Locrian",
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Frequencies for every MIDI note, indexed by note number
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTable {
    frequencies: Vec<f64>,
}

impl PitchTable {
    /// Build a 12-tone equal temperament table with A4 at `reference_pitch` Hz
    pub fn twelve_tet(reference_pitch: f64) -> Self {
        let frequencies = (0..PITCH_TABLE_SIZE)
            .map(|note| {
                let offset = note as f64 - REFERENCE_NOTE as f64;
                reference_pitch * 2f64.powf(offset / 12.0)
            })
            .collect();
        Self { frequencies }
    }

    /// Frequency of a MIDI note
    pub fn frequency(&self, note: MidiNote) -> Option<f64> {
        self.frequencies.get(note as usize).copied()
    }

    /// Number of notes in the table
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

impl Default for PitchTable {
    fn default() -> Self {
        Self::twelve_tet(440.0)
    }
}

/// One pitch of a built scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePitch {
    /// MIDI note number
    pub note: MidiNote,
    /// Frequency in Hz from the pitch table
    pub frequency: f64,
}

/// Build the ordered pitches of a diatonic scale across the pitch table.
///
/// The list starts at the lowest occurrence of `key`, so index
/// `7 * octave + degree` is `degree` of the scale in that octave.
pub fn build_scale(key: Note, scale_type: ScaleType, table: &PitchTable) -> Vec<ScalePitch> {
    let key_pc = key.pitch_class();
    let intervals = scale_type.intervals();

    (key_pc as usize..table.len())
        .filter_map(|n| {
            let note = n as MidiNote;
            let offset = (note + 12 - key_pc) % 12;
            if !intervals.contains(&offset) {
                return None;
            }
            table.frequency(note).map(|frequency| ScalePitch { note, frequency })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_pitch_class() {
        assert_eq!(Note::C.pitch_class(), 0);
        assert_eq!(Note::A.pitch_class(), 9);
        assert_eq!(Note::B.pitch_class(), 11);
        assert_eq!(Note::from_pitch_class(14), Note::D);
    }

    #[test]
    fn test_note_from_str() {
        assert_eq!(Note::from_str("C"), Some(Note::C));
        assert_eq!(Note::from_str("C#"), Some(Note::Cs));
        assert_eq!(Note::from_str("Db"), Some(Note::Cs));
        assert_eq!(Note::from_str(" bb "), Some(Note::As));
        assert_eq!(Note::from_str("X"), None);
    }

    #[test]
    fn test_note_transpose() {
        assert_eq!(Note::C.transpose(2), Note::D);
        assert_eq!(Note::C.transpose(-1), Note::B);
        assert_eq!(Note::G.transpose(5), Note::C);
    }

    #[test]
    fn test_mode_intervals() {
        assert_eq!(ScaleType::Ionian.intervals(), [0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(ScaleType::Dorian.intervals(), [0, 2, 3, 5, 7, 9, 10]);
        assert_eq!(ScaleType::Aeolian.intervals(), [0, 2, 3, 5, 7, 8, 10]);
        assert_eq!(ScaleType::Locrian.intervals(), [0, 1, 3, 5, 6, 8, 10]);
    }

    #[test]
    fn test_mode_index() {
        assert_eq!(ScaleType::Ionian.index(), 0);
        assert_eq!(ScaleType::Aeolian.index(), 5);
        assert_eq!(ScaleType::from_index(5), Some(ScaleType::Aeolian));
        assert_eq!(ScaleType::from_index(7), None);
    }

    #[test]
    fn test_scale_type_from_str() {
        assert_eq!(ScaleType::from_str("major"), Some(ScaleType::Ionian));
        assert_eq!(ScaleType::from_str("Minor"), Some(ScaleType::Aeolian));
        assert_eq!(ScaleType::from_str("natural_minor"), Some(ScaleType::Aeolian));
        assert_eq!(ScaleType::from_str("blues"), None);
    }

    #[test]
    fn test_pitch_table() {
        let table = PitchTable::twelve_tet(440.0);
        assert_eq!(table.len(), 128);
        assert!((table.frequency(69).unwrap() - 440.0).abs() < 1e-9);
        assert!((table.frequency(81).unwrap() - 880.0).abs() < 1e-9);
        // Middle C
        assert!((table.frequency(60).unwrap() - 261.6256).abs() < 0.001);
        assert_eq!(table.frequency(200), None);
    }

    #[test]
    fn test_build_c_minor() {
        let table = PitchTable::default();
        let pitches = build_scale(Note::C, ScaleType::Aeolian, &table);

        // Octave 5 (MIDI octave 4) starts at index 35: C4 D4 Eb4 F4 G4 Ab4 Bb4
        let octave: Vec<MidiNote> = pitches[35..42].iter().map(|p| p.note).collect();
        assert_eq!(octave, vec![60, 62, 63, 65, 67, 68, 70]);
        assert_eq!(pitches[0].note, 0);
    }

    #[test]
    fn test_build_scale_starts_on_key() {
        let table = PitchTable::default();
        let pitches = build_scale(Note::A, ScaleType::Ionian, &table);
        assert_eq!(pitches[0].note, 9);
        assert_eq!(pitches[7].note, 21);
        assert!(pitches.windows(2).all(|w| w[0].note < w[1].note));
    }
}
