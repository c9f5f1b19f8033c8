// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Event scheduler with step-precision timing.
//!
//! Provides a priority queue of note-on/note-off messages keyed by absolute
//! step. The composer hands over a loop's worth of note events at a time,
//! each batch offset to the loop start.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use tracing::debug;

use super::pool::DestinationId;
use crate::generators::NoteEvent;

/// Receives generated events for playback
pub trait EventScheduler {
    /// Queue events for a destination; event steps are relative to `time_offset`
    fn add_events(&mut self, destination: DestinationId, events: &[NoteEvent], time_offset: u64);

    /// Open a destination for events, undoing an earlier `remove_channel`
    fn add_channel(&mut self, destination: DestinationId);

    /// Drop everything pending for a destination and stop accepting more
    fn remove_channel(&mut self, destination: DestinationId);
}

/// Type of MIDI message in a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MidiMessageType {
    /// Note off message; sorts first so a repeated note retriggers cleanly
    NoteOff,
    /// Note on message
    NoteOn,
}

/// A scheduled MIDI event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Absolute step from composition start
    pub time_step: u64,
    /// Destination the event plays through
    pub destination: DestinationId,
    /// Message type
    pub message_type: MidiMessageType,
    /// Note number
    pub note: u8,
    /// Velocity (0 for note off)
    pub velocity: u8,
    /// Insertion order, keeps equal-time events stable
    seq: u64,
}

impl ScheduledEvent {
    /// Create a note on event
    pub fn note_on(time_step: u64, destination: DestinationId, note: u8, velocity: u8) -> Self {
        Self {
            time_step,
            destination,
            message_type: MidiMessageType::NoteOn,
            note,
            velocity,
            seq: 0,
        }
    }

    /// Create a note off event
    pub fn note_off(time_step: u64, destination: DestinationId, note: u8) -> Self {
        Self {
            time_step,
            destination,
            message_type: MidiMessageType::NoteOff,
            note,
            velocity: 0,
            seq: 0,
        }
    }

    /// Convert to MIDI bytes on a channel
    pub fn to_midi_bytes(&self, channel: u8) -> [u8; 3] {
        let channel = channel & 0x0F;
        match self.message_type {
            MidiMessageType::NoteOn => [0x90 | channel, self.note, self.velocity],
            MidiMessageType::NoteOff => [0x80 | channel, self.note, 0],
        }
    }

    fn sort_key(&self) -> (u64, MidiMessageType, u64) {
        (self.time_step, self.message_type, self.seq)
    }
}

// For BinaryHeap - we want minimum time first
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other.sort_key().cmp(&self.sort_key())
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Event scheduler with priority queue
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Priority queue of scheduled events
    queue: BinaryHeap<ScheduledEvent>,
    /// Destinations torn down by `remove_channel`
    removed: HashSet<DestinationId>,
    /// Steps already handed out by `poll`
    position: u64,
    next_seq: u64,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::with_capacity(1024),
            ..Self::default()
        }
    }

    /// Schedule an event
    pub fn schedule(&mut self, mut event: ScheduledEvent) {
        if self.removed.contains(&event.destination) {
            return;
        }
        event.seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(event);
    }

    /// Get events due at or before `up_to_step`, in time order
    pub fn poll(&mut self, up_to_step: u64) -> Vec<ScheduledEvent> {
        let mut events = Vec::new();

        while let Some(event) = self.queue.peek() {
            if event.time_step > up_to_step {
                break;
            }
            if let Some(event) = self.queue.pop() {
                events.push(event);
            }
        }

        self.position = self.position.max(up_to_step + 1);
        events
    }

    /// Step of the next pending event
    pub fn next_event_step(&self) -> Option<u64> {
        self.queue.peek().map(|e| e.time_step)
    }

    /// First step not yet polled
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Get number of queued events
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether a destination has been torn down
    pub fn is_removed(&self, destination: DestinationId) -> bool {
        self.removed.contains(&destination)
    }

    /// Clear all scheduled events and forget removed destinations
    pub fn clear(&mut self) {
        self.queue.clear();
        self.removed.clear();
        self.position = 0;
    }
}

impl EventScheduler for Scheduler {
    fn add_events(&mut self, destination: DestinationId, events: &[NoteEvent], time_offset: u64) {
        if self.removed.contains(&destination) {
            debug!(%destination, count = events.len(), "Dropping events for removed channel");
            return;
        }
        for event in events {
            let on = time_offset + event.step as u64;
            let off = on + event.duration.max(1) as u64;
            self.schedule(ScheduledEvent::note_on(on, destination, event.note, event.velocity));
            self.schedule(ScheduledEvent::note_off(off, destination, event.note));
        }
    }

    fn add_channel(&mut self, destination: DestinationId) {
        self.removed.remove(&destination);
    }

    fn remove_channel(&mut self, destination: DestinationId) {
        let events: Vec<ScheduledEvent> = self
            .queue
            .drain()
            .filter(|e| e.destination != destination)
            .collect();
        self.queue.extend(events);
        self.removed.insert(destination);
    }
}
