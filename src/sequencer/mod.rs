// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer plumbing between the composer and playback.
//!
//! This module provides:
//! - The event scheduler the composer forwards pattern batches to
//! - The part pool that maps part requests to playback destinations

pub mod pool;
pub mod scheduler;

pub use pool::{Destination, DestinationId, PartPool};
pub use scheduler::{EventScheduler, MidiMessageType, ScheduledEvent, Scheduler};
