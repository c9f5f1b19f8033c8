// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! songform - procedural song-structure composer.
//!
//! Runs a section state machine (intro, verse, chorus, bridge and two solo
//! sections) over a fixed key and scale. Each section gets a cached
//! four-chord harmony, and a few steps before every pattern loop ends the
//! active parts are asked for their next loop of notes, which are queued
//! with the scheduler at the start of that loop.

pub mod composer;
pub mod config;
pub mod error;
pub mod generators;
pub mod music;
pub mod sequencer;
pub mod timing;

pub use composer::{Composer, CompositionDirector, CompositionSettings, CompositionState};
pub use error::{CompositionError, Result};
