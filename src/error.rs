// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the composition engine.
//!
//! Every failure here is a deterministic logic or configuration error.
//! Nothing is retried; the host is expected to stop playback.

use thiserror::Error;

use crate::composer::{PartKind, SectionKind};

/// Errors raised by the composer and its collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    /// Section name that is not one of the known sections
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    /// Section known by name but missing from the catalog in use
    #[error("section '{0}' is not defined in the catalog")]
    SectionNotInCatalog(SectionKind),

    /// Part name that is not one of the known parts
    #[error("unknown part '{0}'")]
    UnknownPart(String),

    /// Scale name that does not map to a diatonic mode
    #[error("unknown scale '{0}'")]
    UnknownScale(String),

    /// Key name that does not parse as a note
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    /// No generator registered for a requested part
    #[error("no generator for part '{0}'")]
    MissingGenerator(PartKind),

    /// No playback destination for a (part, instrument) pair
    #[error("no destination for part '{part}' instrument {instrument}")]
    MissingDestination { part: PartKind, instrument: usize },

    /// Pattern length too short to hold the loop lookahead
    #[error("section '{section}' has invalid pattern length {length} (must exceed {min})")]
    InvalidPatternLength {
        section: SectionKind,
        length: u32,
        min: u32,
    },

    /// Section must last at least one pattern loop
    #[error("section '{section}' has invalid section length {length}")]
    InvalidSectionLength { section: SectionKind, length: u32 },

    /// Successor weight that is not a positive finite number
    #[error("section '{section}' has invalid weight {weight} for successor '{to}'")]
    InvalidTransitionWeight {
        section: SectionKind,
        to: SectionKind,
        weight: f64,
    },

    /// Harmony map handed to the expander without a step 0 chord
    #[error("harmony map has no chord at step 0")]
    MissingHarmonyRoot,

    /// Dense harmony does not cover the whole pattern
    #[error("dense harmony has {actual} steps, expected {expected}")]
    HarmonyLengthMismatch { expected: usize, actual: usize },

    /// `start` called on a composer that is already running
    #[error("composition already started")]
    AlreadyStarted,

    /// Operation that needs a running composition
    #[error("composition not started")]
    NotStarted,
}

impl CompositionError {
    /// Whether this error indicates a defect rather than bad configuration
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            CompositionError::MissingHarmonyRoot | CompositionError::HarmonyLengthMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CompositionError>;
