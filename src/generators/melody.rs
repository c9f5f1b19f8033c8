// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Melodic generator using a weighted random walk over the scale.
//!
//! The line moves mostly stepwise with occasional leaps and rests, and
//! snaps to the nearest chord tone whenever the harmony changes.

use rand::rngs::StdRng;
use rand::Rng;

use super::{NoteEvent, PartGenerator};
use crate::composer::random::seeded_rng;
use crate::composer::{CompositionState, PartKind};
use crate::music::scale::DIATONIC_DEGREES;

/// Configuration for melody generator
#[derive(Debug, Clone)]
struct MelodyConfig {
    /// Base octave in the scale-pitch list
    base_octave: usize,
    /// Octave range
    octave_range: usize,
    /// Base velocity
    velocity: u8,
    /// Velocity variation
    velocity_variation: u8,
    /// Steps per melody note
    rate: u32,
    /// Probability of step motion (vs skip)
    step_probability: f64,
    /// Probability of rest
    rest_probability: f64,
    /// Maximum interval jump (scale degrees)
    max_jump: usize,
}

impl Default for MelodyConfig {
    fn default() -> Self {
        Self {
            base_octave: 5,
            octave_range: 2,
            velocity: 100,
            velocity_variation: 15,
            rate: 2, // Eighth notes
            step_probability: 0.7,
            rest_probability: 0.15,
            max_jump: 4,
        }
    }
}

/// Melody generator
pub struct MelodyGenerator {
    config: MelodyConfig,
    /// Current index into the scale-pitch list
    position: Option<usize>,
    rng: StdRng,
}

impl MelodyGenerator {
    /// Create a melody generator
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            config: MelodyConfig::default(),
            position: None,
            rng: seeded_rng(seed),
        }
    }

    /// Lowest and highest usable scale-pitch index
    fn range(&self, state: &CompositionState) -> (usize, usize) {
        let low = self.config.base_octave * DIATONIC_DEGREES;
        let high = (low + self.config.octave_range * DIATONIC_DEGREES)
            .min(state.scale_pitches.len().saturating_sub(1));
        (low.min(high), high)
    }

    /// Closest chord tone to the current position
    fn snap_to_chord(&self, state: &CompositionState, chord: u8, from: usize) -> usize {
        let (low, high) = self.range(state);
        let chord = chord as usize % DIATONIC_DEGREES;
        let tones = [chord, (chord + 2) % DIATONIC_DEGREES, (chord + 4) % DIATONIC_DEGREES];

        (low..=high)
            .filter(|index| tones.contains(&(index % DIATONIC_DEGREES)))
            .min_by_key(|index| index.abs_diff(from))
            .unwrap_or(from)
    }

    /// Move the walk by a step or leap
    fn wander(&mut self, state: &CompositionState, from: usize) -> usize {
        let (low, high) = self.range(state);
        let distance = if self.rng.gen::<f64>() < self.config.step_probability {
            1
        } else {
            self.rng.gen_range(2..=self.config.max_jump.max(2))
        };
        let up = self.rng.gen::<bool>();

        // Turn back at the range edges
        if (up && from + distance <= high) || from < low + distance {
            (from + distance).min(high)
        } else {
            from - distance
        }
    }

    fn velocity(&mut self) -> u8 {
        let variation = self.config.velocity_variation as i16;
        let offset = self.rng.gen_range(-variation..=variation);
        (self.config.velocity as i16 + offset).clamp(1, 127) as u8
    }
}

impl PartGenerator for MelodyGenerator {
    fn next_events(&mut self, state: &CompositionState) -> Vec<NoteEvent> {
        let mut events = Vec::new();
        let changes = state.chord_changes();
        let (low, _) = self.range(state);
        let mut position = self.position.unwrap_or(low);
        let rate = self.config.rate.max(1);

        let mut step = 0;
        while step < state.pattern_length {
            let duration = rate.min(state.pattern_length - step);
            let on_change = changes
                .iter()
                .any(|&(change, _)| change >= step && change < step + rate);

            if on_change {
                position = self.snap_to_chord(state, state.chord_at(step + rate - 1), position);
            } else if self.rng.gen::<f64>() < self.config.rest_probability {
                step += rate;
                continue;
            } else {
                position = self.wander(state, position);
            }

            if let Some(pitch) = state.scale_pitches.get(position) {
                let velocity = self.velocity();
                events.push(NoteEvent::new(pitch.note, velocity, step, duration));
            }
            step += rate;
        }

        self.position = Some(position);
        events
    }

    fn part(&self) -> PartKind {
        PartKind::Melody
    }
}
