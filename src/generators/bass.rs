// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Bass generator.
//!
//! Lands the chord root on every harmony change and pulses eighth notes
//! in between, occasionally jumping to the fifth.

use rand::rngs::StdRng;
use rand::Rng;

use super::{NoteEvent, PartGenerator};
use crate::composer::random::seeded_rng;
use crate::composer::{CompositionState, PartKind};

/// Scale-pitch octave the bass plays in (MIDI C2 for a C key)
const BASS_OCTAVE: usize = 3;

/// Bass line generator
pub struct BassGenerator {
    /// Probability of an eighth-note pulse sounding
    pulse_probability: f64,
    /// Probability a pulse plays the fifth instead of the root
    fifth_probability: f64,
    velocity: u8,
    accent_velocity: u8,
    rng: StdRng,
}

impl BassGenerator {
    /// Create a bass generator
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            pulse_probability: 0.7,
            fifth_probability: 0.2,
            velocity: 90,
            accent_velocity: 115,
            rng: seeded_rng(seed),
        }
    }
}

impl PartGenerator for BassGenerator {
    fn next_events(&mut self, state: &CompositionState) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        let changes = state.chord_changes();

        for (step, chord) in (0..state.pattern_length).map(|s| (s, state.chord_at(s))) {
            let chord_root = state.scale_note(chord as usize, BASS_OCTAVE);
            let Some(root) = chord_root else { continue };

            if changes.iter().any(|&(change, _)| change == step) {
                events.push(NoteEvent::new(root, self.accent_velocity, step, 2));
                continue;
            }

            if step % 2 != 0 || self.rng.gen::<f64>() >= self.pulse_probability {
                continue;
            }

            let note = if self.rng.gen::<f64>() < self.fifth_probability {
                state
                    .scale_note(chord as usize + 4, BASS_OCTAVE)
                    .unwrap_or(root)
            } else {
                root
            };
            events.push(NoteEvent::new(note, self.velocity, step, 1));
        }

        events
    }

    fn part(&self) -> PartKind {
        PartKind::Bass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::SectionKind;
    use crate::generators::test_support::{four_chords, state_in};

    #[test]
    fn test_root_on_every_change() {
        let mut bass = BassGenerator::new(Some(4));
        let state = state_in(SectionKind::Verse, four_chords());

        let events = bass.next_events(&state);
        for (step, chord) in state.chord_changes() {
            let event = events.iter().find(|e| e.step == step).unwrap();
            assert_eq!(Some(event.note), state.scale_note(chord as usize, BASS_OCTAVE));
            assert_eq!(event.velocity, 115);
        }
    }

    #[test]
    fn test_pulses_on_even_steps() {
        let mut bass = BassGenerator::new(Some(5));
        bass.pulse_probability = 1.0;
        let state = state_in(SectionKind::S2, vec![2; 64]);

        let events = bass.next_events(&state);
        assert_eq!(events.len(), 32);
        assert!(events.iter().all(|e| e.step % 2 == 0));
    }
}
