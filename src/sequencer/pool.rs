// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback destinations for each part.
//!
//! The pool maps every part to an ordered list of instruments. A part
//! request `(part, instrument)` resolves to the instrument at that index.
//! The pool is built once by the host and never changes while a
//! composition runs.

use std::collections::BTreeMap;
use std::fmt;

use crate::composer::{PartKind, PartRequest};
use crate::error::{CompositionError, Result};

/// Stable identifier of a playback destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DestinationId(pub usize);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One instrument a part can play through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: DestinationId,
    /// Display name of the instrument
    pub name: String,
    /// MIDI channel (0-15)
    pub channel: u8,
}

/// Part to ordered destinations
#[derive(Debug, Clone, Default)]
pub struct PartPool {
    parts: BTreeMap<PartKind, Vec<Destination>>,
    next_id: usize,
}

impl PartPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference ensemble: one instrument per part and two for melody
    pub fn reference() -> Self {
        let mut pool = Self::new();
        pool.add(PartKind::Drums, "drums", 9);
        pool.add(PartKind::Bass, "bass", 0);
        pool.add(PartKind::Pad, "pad", 1);
        pool.add(PartKind::Melody, "lead", 2);
        pool.add(PartKind::Melody, "counter", 3);
        pool.add(PartKind::Arpeggio, "arpeggio", 4);
        pool
    }

    /// Append an instrument to a part; returns the new destination's id
    pub fn add(&mut self, part: PartKind, name: impl Into<String>, channel: u8) -> DestinationId {
        let id = DestinationId(self.next_id);
        self.next_id += 1;
        self.parts.entry(part).or_default().push(Destination {
            id,
            name: name.into(),
            channel: channel.min(15),
        });
        id
    }

    /// Destination for an instrument of a part
    pub fn destination(&self, part: PartKind, instrument: usize) -> Option<&Destination> {
        self.parts.get(&part).and_then(|list| list.get(instrument))
    }

    /// Destination for a part request
    pub fn resolve(&self, request: PartRequest) -> Result<&Destination> {
        self.destination(request.part, request.instrument)
            .ok_or(CompositionError::MissingDestination {
                part: request.part,
                instrument: request.instrument,
            })
    }

    /// Look up a destination by id
    pub fn get(&self, id: DestinationId) -> Option<&Destination> {
        self.destinations().find(|d| d.id == id)
    }

    /// Instruments of one part
    pub fn instruments(&self, part: PartKind) -> &[Destination] {
        self.parts.get(&part).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every destination, grouped by part
    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.parts.values().flatten()
    }

    /// Total number of destinations
    pub fn len(&self) -> usize {
        self.parts.values().map(Vec::len).sum()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail on the first request the pool cannot serve
    pub fn check_covers<'a>(&self, requests: impl IntoIterator<Item = &'a PartRequest>) -> Result<()> {
        for request in requests {
            self.resolve(*request)?;
        }
        Ok(())
    }
}
