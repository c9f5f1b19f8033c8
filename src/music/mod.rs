// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities.
//!
//! This module provides note names, the diatonic modes, pitch tables
//! and the scale builder used when a composition starts.

pub mod scale;

pub use scale::{build_scale, MidiNote, Note, PitchTable, ScalePitch, ScaleType};
