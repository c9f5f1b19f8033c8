// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The "now playing" record handed to every generator.

use super::harmony::ChordDegree;
use super::section::{PartRequest, SectionDef, SectionKind};
use crate::music::scale::{MidiNote, Note, ScalePitch, ScaleType, DIATONIC_DEGREES};

/// Current key, section, harmony and loop position of a composition
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionState {
    /// Tonic of the composition
    pub key: Note,
    /// Diatonic mode
    pub scale: ScaleType,
    /// Scale pitches, index `7 * octave + degree`
    pub scale_pitches: Vec<ScalePitch>,
    /// Section now playing
    pub section: SectionKind,
    /// Steps per pattern loop
    pub pattern_length: u32,
    /// Loops the section lasts
    pub section_length: u32,
    /// Loops completed within the section
    pub section_pattern: u32,
    /// Parts playing, in forwarding order
    pub parts: Vec<PartRequest>,
    /// One chord degree per step of the loop
    pub harmony: Vec<ChordDegree>,
}

impl CompositionState {
    /// Create a state for a key and scale; no section is loaded yet
    pub fn new(key: Note, scale: ScaleType, scale_pitches: Vec<ScalePitch>) -> Self {
        Self {
            key,
            scale,
            scale_pitches,
            section: SectionKind::Intro,
            pattern_length: 0,
            section_length: 0,
            section_pattern: 0,
            parts: Vec::new(),
            harmony: Vec::new(),
        }
    }

    /// Load a section and its expanded harmony, restarting the loop count
    pub fn enter(&mut self, def: &SectionDef, harmony: Vec<ChordDegree>) {
        self.section = def.kind;
        self.section_length = def.section_length;
        self.pattern_length = def.pattern_length;
        self.parts = def.parts.clone();
        self.harmony = harmony;
        self.section_pattern = 0;
    }

    /// Chord degree at a step of the loop
    pub fn chord_at(&self, step: u32) -> ChordDegree {
        self.harmony.get(step as usize).copied().unwrap_or(0)
    }

    /// Steps where the chord changes, with the chord that starts there
    pub fn chord_changes(&self) -> Vec<(u32, ChordDegree)> {
        let mut changes = Vec::new();
        let mut previous = None;
        for (step, &chord) in self.harmony.iter().enumerate() {
            if previous != Some(chord) {
                changes.push((step as u32, chord));
                previous = Some(chord);
            }
        }
        changes
    }

    /// MIDI note of a scale degree in an octave of the pitch list.
    ///
    /// Degrees past 6 continue into the next octave.
    pub fn scale_note(&self, degree: usize, octave: usize) -> Option<MidiNote> {
        self.scale_pitches
            .get(octave * DIATONIC_DEGREES + degree)
            .map(|p| p.note)
    }

    /// Root, third and fifth of a chord in an octave
    pub fn triad(&self, chord: ChordDegree, octave: usize) -> Vec<MidiNote> {
        [0, 2, 4]
            .iter()
            .filter_map(|offset| self.scale_note(chord as usize + offset, octave))
            .collect()
    }

    /// Whether the current loop is the last one of the section
    pub fn is_last_pattern(&self) -> bool {
        self.section_pattern + 1 >= self.section_length
    }
}
