// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arpeggiator generator for rhythmic note patterns.
//!
//! Cycles through the tones of the current chord across a span of octaves,
//! restarting the figure whenever the harmony changes.

use rand::rngs::StdRng;
use rand::Rng;

use super::{NoteEvent, PartGenerator, STEPS_PER_BEAT};
use crate::composer::random::seeded_rng;
use crate::composer::{CompositionState, PartKind};

/// Arpeggio pattern types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpPattern {
    /// Play notes ascending
    Up,
    /// Play notes descending
    Down,
    /// Play up then down
    UpDown,
    /// Random note selection
    Random,
}

/// Configuration for arpeggiator
#[derive(Debug, Clone)]
struct ArpConfig {
    /// Pattern type
    pattern: ArpPattern,
    /// Steps per arpeggio note (1 = sixteenth)
    rate: u32,
    /// Number of octaves to span
    octaves: usize,
    /// Base octave in the scale-pitch list
    base_octave: usize,
    /// Base velocity
    velocity: u8,
    /// Velocity accent on each beat
    accent_velocity: u8,
    /// Probability of playing each note (0.0 - 1.0)
    probability: f64,
}

impl Default for ArpConfig {
    fn default() -> Self {
        Self {
            pattern: ArpPattern::UpDown,
            rate: 1,
            octaves: 2,
            base_octave: 5,
            velocity: 80,
            accent_velocity: 100,
            probability: 0.9,
        }
    }
}

/// Arpeggiator generator
pub struct ArpeggioGenerator {
    config: ArpConfig,
    rng: StdRng,
}

impl ArpeggioGenerator {
    /// Create a new arpeggiator
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            config: ArpConfig::default(),
            rng: seeded_rng(seed),
        }
    }

    /// Use a different pattern
    pub fn with_pattern(mut self, pattern: ArpPattern) -> Self {
        self.config.pattern = pattern;
        self
    }

    /// Chord tones across the configured octaves, ascending
    fn chord_tones(&self, state: &CompositionState, chord: u8) -> Vec<u8> {
        (0..self.config.octaves)
            .flat_map(|octave| state.triad(chord, self.config.base_octave + octave))
            .collect()
    }

    /// Note for the n-th position of the figure
    fn note_at(&mut self, tones: &[u8], position: usize) -> u8 {
        let len = tones.len();
        match self.config.pattern {
            ArpPattern::Up => tones[position % len],
            ArpPattern::Down => tones[len - 1 - position % len],
            ArpPattern::UpDown => {
                if len < 2 {
                    return tones[0];
                }
                let cycle = 2 * (len - 1);
                let phase = position % cycle;
                if phase < len {
                    tones[phase]
                } else {
                    tones[cycle - phase]
                }
            }
            ArpPattern::Random => tones[self.rng.gen_range(0..len)],
        }
    }
}

impl PartGenerator for ArpeggioGenerator {
    fn next_events(&mut self, state: &CompositionState) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        let rate = self.config.rate.max(1);
        let mut tones = Vec::new();
        let mut current_chord = None;
        let mut position = 0;

        let mut step = 0;
        while step < state.pattern_length {
            let chord = state.chord_at(step);
            if current_chord != Some(chord) {
                tones = self.chord_tones(state, chord);
                current_chord = Some(chord);
                position = 0;
            }

            if !tones.is_empty()
                && (self.config.probability >= 1.0 || self.rng.gen::<f64>() < self.config.probability)
            {
                let note = self.note_at(&tones, position);
                let velocity = if step % STEPS_PER_BEAT == 0 {
                    self.config.accent_velocity
                } else {
                    self.config.velocity
                };
                let duration = rate.min(state.pattern_length - step);
                events.push(NoteEvent::new(note, velocity, step, duration));
            }

            position += 1;
            step += rate;
        }

        events
    }

    fn part(&self) -> PartKind {
        PartKind::Arpeggio
    }
}
