// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Step clock implementation.
//!
//! A BPM-based step counter running at four steps per beat. Every tick
//! notifies the registered step callbacks with the step index and the
//! musical time of the step. The clock does not sleep; hosts either drive
//! it from a timer paced by [`StepClock::step_duration`] or tick it as fast
//! as they like for offline rendering.

use std::time::Duration;

use crate::error::Result;

/// Steps per quarter note (sixteenth-note resolution)
pub const STEPS_PER_QUARTER: u32 = 4;

/// Slowest accepted tempo
pub const MIN_BPM: f64 = 20.0;

/// Fastest accepted tempo
pub const MAX_BPM: f64 = 300.0;

/// Clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
}

/// What a step callback is told about the step being played
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTime {
    /// Seconds since step 0
    pub time: f64,
    /// Step index since the clock started
    pub step: u64,
}

/// Handle returned when registering a step callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Per-step notification
pub type StepCallback = Box<dyn FnMut(StepTime) -> Result<()>>;

/// Step clock generator
pub struct StepClock {
    /// Current tempo in BPM
    bpm: f64,
    /// Current clock state
    state: ClockState,
    /// Next step to be played
    step: u64,
    /// Musical time of the next step in seconds
    elapsed: f64,
    callbacks: Vec<(CallbackId, StepCallback)>,
    next_id: u64,
}

impl StepClock {
    /// Create a new clock at the specified tempo
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            state: ClockState::Stopped,
            step: 0,
            elapsed: 0.0,
            callbacks: Vec::new(),
            next_id: 0,
        }
    }

    /// Get the current tempo in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set the tempo; takes effect from the next step
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    /// Get the current clock state
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Index of the next step to be played
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Current beat count
    pub fn beat(&self) -> u64 {
        self.step / STEPS_PER_QUARTER as u64
    }

    /// Real-time interval between steps
    pub fn step_duration(&self) -> Duration {
        // interval = 60 / (BPM * steps per quarter) seconds
        Duration::from_secs_f64(60.0 / (self.bpm * STEPS_PER_QUARTER as f64))
    }

    /// Register a callback invoked on every step
    pub fn add_step_callback(&mut self, callback: StepCallback) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    /// Deregister a callback; returns false if it was not registered
    pub fn remove_step_callback(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _)| *cid != id);
        self.callbacks.len() != before
    }

    /// Number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Start from step 0
    pub fn start(&mut self) {
        self.state = ClockState::Running;
        self.step = 0;
        self.elapsed = 0.0;
    }

    /// Stop and rewind
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.step = 0;
        self.elapsed = 0.0;
    }

    /// Pause at the current step
    pub fn pause(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Paused;
        }
    }

    /// Continue from paused state
    pub fn continue_playback(&mut self) {
        if self.state == ClockState::Paused {
            self.state = ClockState::Running;
        }
    }

    /// Play one step, notifying every callback.
    ///
    /// Returns the step played, or `None` when the clock is not running.
    /// The first callback error is returned; callbacks after it are not
    /// invoked for this step.
    pub fn tick(&mut self) -> Result<Option<StepTime>> {
        if self.state != ClockState::Running {
            return Ok(None);
        }

        let now = StepTime {
            time: self.elapsed,
            step: self.step,
        };
        self.step += 1;
        self.elapsed += self.step_duration().as_secs_f64();

        for (_, callback) in self.callbacks.iter_mut() {
            callback(now)?;
        }

        Ok(Some(now))
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(120.0) // Default to 120 BPM
    }
}

impl std::fmt::Debug for StepClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepClock")
            .field("bpm", &self.bpm)
            .field("state", &self.state)
            .field("step", &self.step)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}
