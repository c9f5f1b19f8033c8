// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song structure and harmony.
//!
//! This module provides:
//! - The section catalog and its weighted transition policy
//! - Harmony generation, caching and per-step expansion
//! - The composition state handed to generators
//! - The director that runs the section state machine
//! - The composer that subscribes the director to a step clock

pub mod director;
pub mod harmony;
pub mod host;
pub mod random;
pub mod section;
pub mod state;

pub use director::{CompositionDirector, CompositionSettings, GeneratorFactory};
pub use harmony::{
    avoided_degree, expand_harmony, generate_harmony, pick_chord, ChordDegree, HarmonyCache,
    HarmonyMap, HARMONY_SEGMENTS,
};
pub use host::Composer;
pub use random::{seeded_rng, RandomSource, ScriptedRandom};
pub use section::{
    PartKind, PartRequest, SectionCatalog, SectionDef, SectionKind, Transition,
    DEFAULT_PATTERN_LENGTH, LOOKAHEAD_STEPS,
};
pub use state::CompositionState;
