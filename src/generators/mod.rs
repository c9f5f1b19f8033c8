// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-part event generators.
//!
//! The composer asks one generator per part for a loop's worth of notes
//! every time a pattern loop is about to end. Generators read the
//! composition state and never mutate it. The built-in generators here are
//! deliberately simple reference implementations.

pub mod arpeggio;
pub mod bass;
pub mod drums;
pub mod melody;
pub mod pad;

use std::collections::HashMap;
use std::fmt;

use crate::composer::{CompositionState, PartKind};
use crate::music::scale::MidiNote;

/// Sequencer steps per beat (sixteenth notes)
pub const STEPS_PER_BEAT: u32 = 4;

/// Sequencer steps per 4/4 bar
pub const STEPS_PER_BAR: u32 = STEPS_PER_BEAT * 4;

/// A note produced by a generator, timed in steps from the loop start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// MIDI note number (0-127)
    pub note: MidiNote,
    /// Velocity (0-127)
    pub velocity: u8,
    /// Start step within the pattern loop
    pub step: u32,
    /// Duration in steps
    pub duration: u32,
}

impl NoteEvent {
    /// Create a new note event
    pub fn new(note: MidiNote, velocity: u8, step: u32, duration: u32) -> Self {
        Self {
            note,
            velocity,
            step,
            duration,
        }
    }
}

/// Produces the next batch of events for one part
pub trait PartGenerator {
    /// Events for the next pattern loop
    fn next_events(&mut self, state: &CompositionState) -> Vec<NoteEvent>;

    /// The part this generator plays
    fn part(&self) -> PartKind;
}

/// Generators keyed by part
#[derive(Default)]
pub struct Generators {
    generators: HashMap<PartKind, Box<dyn PartGenerator>>,
}

impl Generators {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// One built-in generator for every part; each gets its own seed stream
    pub fn builtin(seed: Option<u64>) -> Self {
        let part_seed = |n: u64| seed.map(|s| s.wrapping_mul(31).wrapping_add(n));

        let mut set = Self::new();
        set.insert(Box::new(drums::DrumGenerator::new(part_seed(1))));
        set.insert(Box::new(bass::BassGenerator::new(part_seed(2))));
        set.insert(Box::new(pad::PadGenerator::new(part_seed(3))));
        set.insert(Box::new(melody::MelodyGenerator::new(part_seed(4))));
        set.insert(Box::new(arpeggio::ArpeggioGenerator::new(part_seed(5))));
        set
    }

    /// Register a generator under the part it plays
    pub fn insert(&mut self, generator: Box<dyn PartGenerator>) {
        self.generators.insert(generator.part(), generator);
    }

    /// Generator for a part
    pub fn get_mut(&mut self, part: PartKind) -> Option<&mut (dyn PartGenerator + 'static)> {
        self.generators.get_mut(&part).map(|g| g.as_mut())
    }

    /// Whether a part has a generator
    pub fn contains(&self, part: PartKind) -> bool {
        self.generators.contains_key(&part)
    }

    /// Number of generators
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Check if there are no generators
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Drop every generator
    pub fn clear(&mut self) {
        self.generators.clear();
    }
}

impl fmt::Debug for Generators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<_> = self.generators.keys().collect();
        parts.sort();
        f.debug_struct("Generators").field("parts", &parts).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::composer::SectionKind;

    struct MockGenerator {
        calls: u32,
    }

    impl PartGenerator for MockGenerator {
        fn next_events(&mut self, state: &CompositionState) -> Vec<NoteEvent> {
            self.calls += 1;
            vec![NoteEvent::new(60, 100, 0, state.pattern_length)]
        }

        fn part(&self) -> PartKind {
            PartKind::Pad
        }
    }

    #[test]
    fn test_note_event_creation() {
        let event = NoteEvent::new(60, 100, 4, 2);
        assert_eq!(event.note, 60);
        assert_eq!(event.velocity, 100);
        assert_eq!(event.step, 4);
        assert_eq!(event.duration, 2);
    }

    #[test]
    fn test_generator_set() {
        let mut set = Generators::new();
        assert!(set.is_empty());

        set.insert(Box::new(MockGenerator { calls: 0 }));
        assert!(set.contains(PartKind::Pad));
        assert!(!set.contains(PartKind::Drums));

        let state = state_in(SectionKind::Intro, vec![0; 64]);
        let events = set.get_mut(PartKind::Pad).unwrap().next_events(&state);
        assert_eq!(events, vec![NoteEvent::new(60, 100, 0, 64)]);

        set.clear();
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_builtin_covers_every_part() {
        let set = Generators::builtin(Some(1));
        assert_eq!(set.len(), PartKind::ALL.len());
        for part in PartKind::ALL {
            assert!(set.contains(part), "{}", part);
        }
    }

    #[test]
    fn test_builtin_events_stay_in_loop() {
        let mut set = Generators::builtin(Some(9));
        let state = state_in(SectionKind::Chorus, four_chords());
        for part in PartKind::ALL {
            let events = set.get_mut(part).unwrap().next_events(&state);
            assert!(!events.is_empty(), "{} produced nothing", part);
            for event in events {
                assert!(event.step < state.pattern_length, "{} {:?}", part, event);
                assert!(event.duration > 0);
                assert!(event.note < 128 && event.velocity <= 127);
            }
        }
    }
}
