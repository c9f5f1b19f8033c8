// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the step clock that drives the composer.

pub mod clock;

pub use clock::{CallbackId, ClockState, StepCallback, StepClock, StepTime, STEPS_PER_QUARTER};
