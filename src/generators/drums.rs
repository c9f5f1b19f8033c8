// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Drum generator.
//!
//! Plays a four-on-the-floor kit bar repeated across the loop, with
//! probabilistic ghost hats and a snare fill closing the last loop of a
//! section.

use rand::rngs::StdRng;
use rand::Rng;

use super::{NoteEvent, PartGenerator, STEPS_PER_BAR};
use crate::composer::random::seeded_rng;
use crate::composer::{CompositionState, PartKind};

/// Standard General MIDI drum notes
pub mod gm_drums {
    pub const KICK: u8 = 36;
    pub const SNARE: u8 = 38;
    pub const CLOSED_HAT: u8 = 42;
    pub const OPEN_HAT: u8 = 46;
}

/// One kit piece and the bar steps it hits on
#[derive(Debug, Clone)]
struct DrumVoice {
    note: u8,
    pattern: Vec<bool>,
    /// Probability of each hit playing (0.0 - 1.0)
    probability: f64,
    velocity: u8,
    accent_velocity: u8,
}

impl DrumVoice {
    fn new(note: u8, hits: impl Fn(u32) -> bool) -> Self {
        Self {
            note,
            pattern: (0..STEPS_PER_BAR).map(hits).collect(),
            probability: 1.0,
            velocity: 100,
            accent_velocity: 120,
        }
    }

    fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self.accent_velocity = velocity;
        self
    }
}

/// Four-on-the-floor drum generator
pub struct DrumGenerator {
    voices: Vec<DrumVoice>,
    /// Probability of a fill on the last loop of a section
    fill_probability: f64,
    rng: StdRng,
}

impl DrumGenerator {
    /// Create a drum generator
    pub fn new(seed: Option<u64>) -> Self {
        let voices = vec![
            DrumVoice::new(gm_drums::KICK, |i| i % 4 == 0),
            DrumVoice::new(gm_drums::SNARE, |i| i == 4 || i == 12),
            DrumVoice::new(gm_drums::CLOSED_HAT, |i| i % 2 == 0).with_velocity(80),
            DrumVoice::new(gm_drums::OPEN_HAT, |i| i == 7 || i == 15)
                .with_probability(0.4)
                .with_velocity(60),
        ];
        Self {
            voices,
            fill_probability: 0.75,
            rng: seeded_rng(seed),
        }
    }

    /// Snare roll over the final beat of the loop
    fn fill(&self, loop_start: u32) -> Vec<NoteEvent> {
        (0..4)
            .map(|i| NoteEvent::new(gm_drums::SNARE, 70 + i as u8 * 15, loop_start + 12 + i, 1))
            .collect()
    }
}

impl PartGenerator for DrumGenerator {
    fn next_events(&mut self, state: &CompositionState) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        let bars = (state.pattern_length / STEPS_PER_BAR).max(1);
        let play_fill = state.is_last_pattern() && self.rng.gen::<f64>() < self.fill_probability;

        for bar in 0..bars {
            let bar_start = bar * STEPS_PER_BAR;
            let last_bar = bar + 1 == bars;

            for voice in &self.voices {
                for (i, &hit) in voice.pattern.iter().enumerate() {
                    let step = bar_start + i as u32;
                    if !hit || step >= state.pattern_length {
                        continue;
                    }
                    // The fill replaces the snare in the last beat
                    if play_fill && last_bar && i >= 12 && voice.note == gm_drums::SNARE {
                        continue;
                    }
                    if voice.probability < 1.0 && self.rng.gen::<f64>() >= voice.probability {
                        continue;
                    }
                    let velocity = if i == 0 {
                        voice.accent_velocity
                    } else {
                        voice.velocity
                    };
                    events.push(NoteEvent::new(voice.note, velocity, step, 1));
                }
            }
        }

        if play_fill {
            let last_bar_start = (bars - 1) * STEPS_PER_BAR;
            events.extend(
                self.fill(last_bar_start)
                    .into_iter()
                    .filter(|e| e.step < state.pattern_length),
            );
        }

        events.sort_by_key(|e| e.step);
        events
    }

    fn part(&self) -> PartKind {
        PartKind::Drums
    }
}
