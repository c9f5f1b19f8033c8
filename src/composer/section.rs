// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song sections and the transition policy between them.
//!
//! The catalog is a table: one [`SectionDef`] per [`SectionKind`] holding
//! how many loops the section lasts, its loop length, which parts play,
//! and the weighted choices for the section that follows.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::random::RandomSource;
use crate::error::{CompositionError, Result};

/// Steps before the end of a loop at which the next loop is generated
pub const LOOKAHEAD_STEPS: u32 = 4;

/// Steps per pattern loop for the built-in sections
pub const DEFAULT_PATTERN_LENGTH: u32 = 64;

/// Named song segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Intro,
    Verse,
    Chorus,
    Bridge,
    /// First solo section
    S1,
    /// Second solo section
    S2,
}

impl SectionKind {
    /// All sections in catalog order
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Intro,
        SectionKind::Verse,
        SectionKind::Chorus,
        SectionKind::Bridge,
        SectionKind::S1,
        SectionKind::S2,
    ];

    /// Section name as used in configuration
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Intro => "intro",
            SectionKind::Verse => "verse",
            SectionKind::Chorus => "chorus",
            SectionKind::Bridge => "bridge",
            SectionKind::S1 => "s1",
            SectionKind::S2 => "s2",
        }
    }

    /// Parse a section name
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        SectionKind::ALL.iter().copied().find(|k| k.name() == s)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Instrumental roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Drums,
    Bass,
    Pad,
    Melody,
    Arpeggio,
}

impl PartKind {
    /// All parts
    pub const ALL: [PartKind; 5] = [
        PartKind::Drums,
        PartKind::Bass,
        PartKind::Pad,
        PartKind::Melody,
        PartKind::Arpeggio,
    ];

    /// Part name as used in configuration
    pub fn name(self) -> &'static str {
        match self {
            PartKind::Drums => "drums",
            PartKind::Bass => "bass",
            PartKind::Pad => "pad",
            PartKind::Melody => "melody",
            PartKind::Arpeggio => "arpeggio",
        }
    }

    /// Parse a part name
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        PartKind::ALL.iter().copied().find(|p| p.name() == s)
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A part playing on one of its instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartRequest {
    pub part: PartKind,
    pub instrument: usize,
}

impl PartRequest {
    /// Request a part on its first instrument
    pub fn new(part: PartKind) -> Self {
        Self {
            part,
            instrument: 0,
        }
    }

    /// Request a part on a specific instrument
    pub fn with_instrument(part: PartKind, instrument: usize) -> Self {
        Self { part, instrument }
    }
}

impl From<PartKind> for PartRequest {
    fn from(part: PartKind) -> Self {
        PartRequest::new(part)
    }
}

impl fmt::Display for PartRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instrument == 0 {
            write!(f, "{}", self.part)
        } else {
            write!(f, "{}:{}", self.part, self.instrument)
        }
    }
}

/// Weighted choice of a following section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub to: SectionKind,
    pub weight: f64,
}

impl Transition {
    pub fn new(to: SectionKind, weight: f64) -> Self {
        Self { to, weight }
    }
}

/// One row of the section catalog
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDef {
    pub kind: SectionKind,
    /// Pattern loops before the section may hand over
    pub section_length: u32,
    /// Steps per pattern loop
    pub pattern_length: u32,
    /// Parts playing, in forwarding order
    pub parts: Vec<PartRequest>,
    /// Candidate successors
    pub transitions: Vec<Transition>,
}

impl SectionDef {
    /// Create a section with the default loop length and no parts
    pub fn new(kind: SectionKind, section_length: u32) -> Self {
        Self {
            kind,
            section_length,
            pattern_length: DEFAULT_PATTERN_LENGTH,
            parts: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Builder: set the parts
    pub fn with_parts(mut self, parts: Vec<PartRequest>) -> Self {
        self.parts = parts;
        self
    }

    /// Builder: add a weighted successor
    pub fn then(mut self, to: SectionKind, weight: f64) -> Self {
        self.transitions.push(Transition::new(to, weight));
        self
    }

    /// Check lengths and successor weights
    pub fn validate(&self) -> Result<()> {
        if self.pattern_length <= LOOKAHEAD_STEPS {
            return Err(CompositionError::InvalidPatternLength {
                section: self.kind,
                length: self.pattern_length,
                min: LOOKAHEAD_STEPS,
            });
        }
        if self.section_length == 0 {
            return Err(CompositionError::InvalidSectionLength {
                section: self.kind,
                length: self.section_length,
            });
        }
        if let Some(bad) = self
            .transitions
            .iter()
            .find(|t| !(t.weight > 0.0 && t.weight.is_finite()))
        {
            return Err(CompositionError::InvalidTransitionWeight {
                section: self.kind,
                to: bad.to,
                weight: bad.weight,
            });
        }
        Ok(())
    }
}

/// Table of sections and their transitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionCatalog {
    sections: BTreeMap<SectionKind, SectionDef>,
}

impl SectionCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference song form
    pub fn builtin() -> Self {
        use PartKind::*;
        use SectionKind::*;

        let mut catalog = Self::new();
        catalog.insert(
            SectionDef::new(Intro, 2)
                .with_parts(vec![Pad.into(), Arpeggio.into()])
                .then(Verse, 0.7)
                .then(Bridge, 0.3),
        );
        catalog.insert(
            SectionDef::new(Verse, 2)
                .with_parts(vec![Drums.into(), Bass.into(), Pad.into(), Melody.into()])
                .then(Chorus, 1.0),
        );
        catalog.insert(
            SectionDef::new(Chorus, 2)
                .with_parts(vec![
                    Drums.into(),
                    Bass.into(),
                    Pad.into(),
                    Arpeggio.into(),
                    PartRequest::with_instrument(Melody, 1),
                ])
                .then(Verse, 0.3)
                .then(Bridge, 0.7),
        );
        catalog.insert(
            SectionDef::new(Bridge, 1)
                .with_parts(vec![Drums.into(), Bass.into(), Pad.into(), Arpeggio.into()])
                .then(Verse, 0.5)
                .then(S1, 0.25)
                .then(S2, 0.25),
        );
        catalog.insert(
            SectionDef::new(S1, 2)
                .with_parts(vec![Drums.into(), Bass.into(), Arpeggio.into()])
                .then(Bridge, 0.5)
                .then(S2, 0.5),
        );
        catalog.insert(
            SectionDef::new(S2, 4)
                .with_parts(vec![Bass.into(), Pad.into(), Arpeggio.into()])
                .then(S1, 0.5)
                .then(Bridge, 0.5),
        );
        catalog
    }

    /// Add or replace a section
    pub fn insert(&mut self, def: SectionDef) {
        self.sections.insert(def.kind, def);
    }

    /// Look up a section
    pub fn get(&self, kind: SectionKind) -> Result<&SectionDef> {
        self.sections
            .get(&kind)
            .ok_or(CompositionError::SectionNotInCatalog(kind))
    }

    /// Look up a section for modification
    pub fn get_mut(&mut self, kind: SectionKind) -> Result<&mut SectionDef> {
        self.sections
            .get_mut(&kind)
            .ok_or(CompositionError::SectionNotInCatalog(kind))
    }

    /// Look up a section by name
    pub fn lookup(&self, name: &str) -> Result<&SectionDef> {
        let kind = SectionKind::from_str(name)
            .ok_or_else(|| CompositionError::UnknownSection(name.to_string()))?;
        self.get(kind)
    }

    /// Iterate sections in catalog order
    pub fn sections(&self) -> impl Iterator<Item = &SectionDef> {
        self.sections.values()
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Every distinct part request used by any section
    pub fn part_requests(&self) -> BTreeSet<PartRequest> {
        self.sections
            .values()
            .flat_map(|def| def.parts.iter().copied())
            .collect()
    }

    /// Check every section and that all successors exist
    pub fn validate(&self) -> Result<()> {
        for def in self.sections.values() {
            def.validate()?;
            for transition in &def.transitions {
                self.get(transition.to)?;
            }
        }
        Ok(())
    }

    /// Choose the section that follows `current`.
    ///
    /// A single successor is taken without a draw; a section without
    /// successors repeats.
    pub fn next_section(
        &self,
        current: SectionKind,
        rng: &mut dyn RandomSource,
    ) -> Result<SectionKind> {
        let def = self.get(current)?;
        match def.transitions.as_slice() {
            [] => Ok(current),
            [only] => Ok(only.to),
            transitions => {
                let total: f64 = transitions.iter().map(|t| t.weight).sum();
                let roll = rng.next_f64() * total;
                let mut acc = 0.0;
                for transition in transitions {
                    acc += transition.weight;
                    if roll < acc {
                        return Ok(transition.to);
                    }
                }
                // Rounding can leave the roll at the very top of the range
                Ok(transitions[transitions.len() - 1].to)
            }
        }
    }

    /// Sections reachable from `start` by following transitions
    pub fn reachable_from(&self, start: SectionKind) -> Vec<SectionKind> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(kind) = queue.pop_front() {
            if !seen.insert(kind) {
                continue;
            }
            if let Some(def) = self.sections.get(&kind) {
                queue.extend(def.transitions.iter().map(|t| t.to));
            }
        }
        seen.into_iter().collect()
    }
}
