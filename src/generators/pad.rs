// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pad generator.
//!
//! Holds one voicing of the current chord for each stretch of the harmony,
//! sometimes adding the seventh.

use rand::rngs::StdRng;
use rand::Rng;

use super::{NoteEvent, PartGenerator};
use crate::composer::random::seeded_rng;
use crate::composer::{CompositionState, PartKind};

/// Scale-pitch octave the pad voices start in (MIDI C3 for a C key)
const PAD_OCTAVE: usize = 4;

/// Sustained chord generator
pub struct PadGenerator {
    /// Add 7ths probability (0.0 - 1.0)
    seventh_probability: f64,
    velocity: u8,
    rng: StdRng,
}

impl PadGenerator {
    /// Create a pad generator
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seventh_probability: 0.3,
            velocity: 70,
            rng: seeded_rng(seed),
        }
    }
}

impl PartGenerator for PadGenerator {
    fn next_events(&mut self, state: &CompositionState) -> Vec<NoteEvent> {
        let changes = state.chord_changes();
        let mut events = Vec::new();

        for (i, &(start, chord)) in changes.iter().enumerate() {
            let end = changes
                .get(i + 1)
                .map(|&(next, _)| next)
                .unwrap_or(state.pattern_length);
            let duration = end - start;

            let mut voicing = state.triad(chord, PAD_OCTAVE);
            if self.rng.gen::<f64>() < self.seventh_probability {
                if let Some(seventh) = state.scale_note(chord as usize + 6, PAD_OCTAVE) {
                    voicing.push(seventh);
                }
            }

            events.extend(
                voicing
                    .into_iter()
                    .map(|note| NoteEvent::new(note, self.velocity, start, duration)),
            );
        }

        events
    }

    fn part(&self) -> PartKind {
        PartKind::Pad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SectionKind;
    use crate::generators::test_support::{four_chords, state_in};

    #[test]
    fn test_one_voicing_per_chord() {
        let mut pad = PadGenerator::new(Some(6));
        pad.seventh_probability = 0.0;
        let state = state_in(SectionKind::Intro, four_chords());

        let events = pad.next_events(&state);
        assert_eq!(events.len(), 12);
        assert!(events.iter().all(|e| e.duration == 16));

        let first: Vec<u8> = events.iter().filter(|e| e.step == 0).map(|e| e.note).collect();
        assert_eq!(first, state.triad(0, PAD_OCTAVE));
    }

    #[test]
    fn test_held_chord_spans_loop() {
        let mut pad = PadGenerator::new(Some(7));
        pad.seventh_probability = 1.0;
        let state = state_in(SectionKind::Intro, vec![0; 64]);

        let events = pad.next_events(&state);
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.step == 0 && e.duration == 64));
    }
}
