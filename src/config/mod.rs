// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for songform.
//!
//! A composition file sets the key, scale and tempo, the ensemble each part
//! plays through, and optional overrides of the built-in section table.
//! Files are YAML or TOML, chosen by extension. Names are resolved into the
//! closed section/part/scale enums when the file is turned into runtime
//! values, so a typo surfaces as a [`CompositionError`] before playback.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::composer::{
    CompositionSettings, PartKind, PartRequest, SectionCatalog, SectionKind, Transition,
};
use crate::error::{self, CompositionError};
use crate::music::scale::{Note, ScaleType};
use crate::sequencer::PartPool;

/// Root configuration for a composition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComposerFile {
    /// Key, scale, tempo and seed
    #[serde(default)]
    pub composition: CompositionConfig,
    /// Part name to the instruments it plays through
    #[serde(default = "default_ensemble")]
    pub ensemble: BTreeMap<String, Vec<InstrumentConfig>>,
    /// Per-section overrides of the built-in table
    #[serde(default)]
    pub sections: BTreeMap<String, SectionOverride>,
}

impl Default for ComposerFile {
    fn default() -> Self {
        Self {
            composition: CompositionConfig::default(),
            ensemble: default_ensemble(),
            sections: BTreeMap::new(),
        }
    }
}

impl ComposerFile {
    /// Load a composition file; `.toml` is read as TOML, anything else as YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let parsed = if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        };
        parsed.with_context(|| format!("Invalid config file: {:?}", path))
    }

    /// Parse a composition from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a composition from TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Key, scale, tempo and reference pitch
    pub fn settings(&self) -> error::Result<CompositionSettings> {
        let config = &self.composition;
        let key = Note::from_str(&config.key)
            .ok_or_else(|| CompositionError::UnknownKey(config.key.clone()))?;
        let scale = ScaleType::from_str(&config.scale)
            .ok_or_else(|| CompositionError::UnknownScale(config.scale.clone()))?;

        Ok(CompositionSettings {
            key,
            scale,
            tempo: config.tempo,
            reference_pitch: config.reference_pitch,
        })
    }

    /// The built-in section table with this file's overrides applied
    pub fn catalog(&self) -> error::Result<SectionCatalog> {
        let mut catalog = SectionCatalog::builtin();

        for (name, overrides) in &self.sections {
            let kind = parse_section(name)?;
            let def = catalog.get_mut(kind)?;

            if let Some(length) = overrides.section_length {
                def.section_length = length;
            }
            if let Some(length) = overrides.pattern_length {
                def.pattern_length = length;
            }
            if let Some(parts) = &overrides.parts {
                def.parts = parts
                    .iter()
                    .map(PartEntryConfig::to_request)
                    .collect::<error::Result<Vec<_>>>()?;
            }
            if let Some(next) = &overrides.next {
                def.transitions = next
                    .iter()
                    .map(|(to, &weight)| -> error::Result<Transition> {
                        Ok(Transition::new(parse_section(to)?, weight))
                    })
                    .collect::<error::Result<Vec<_>>>()?;
            }
        }

        catalog.validate()?;
        Ok(catalog)
    }

    /// Destinations for every part in the ensemble
    pub fn pool(&self) -> error::Result<PartPool> {
        let mut pool = PartPool::new();
        for (name, instruments) in &self.ensemble {
            let part = parse_part(name)?;
            for instrument in instruments {
                pool.add(part, instrument.name.clone(), instrument.channel);
            }
        }
        Ok(pool)
    }
}

/// Composition-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositionConfig {
    /// Musical key (e.g., "C", "D", "F#")
    #[serde(default = "default_key")]
    pub key: String,
    /// Scale type (e.g., "major", "minor", "dorian")
    #[serde(default = "default_scale")]
    pub scale: String,
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Frequency of A4 in Hz
    #[serde(default = "default_reference_pitch")]
    pub reference_pitch: f64,
    /// Seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_key() -> String {
    "C".to_string()
}
fn default_scale() -> String {
    "minor".to_string()
}
fn default_tempo() -> f64 {
    120.0
}
fn default_reference_pitch() -> f64 {
    440.0
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            scale: default_scale(),
            tempo: default_tempo(),
            reference_pitch: default_reference_pitch(),
            seed: None,
        }
    }
}

/// One instrument a part plays through
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentConfig {
    /// Display name
    pub name: String,
    /// MIDI channel (0-15)
    #[serde(default)]
    pub channel: u8,
}

impl InstrumentConfig {
    fn new(name: &str, channel: u8) -> Self {
        Self {
            name: name.to_string(),
            channel,
        }
    }
}

fn default_ensemble() -> BTreeMap<String, Vec<InstrumentConfig>> {
    BTreeMap::from([
        ("drums".to_string(), vec![InstrumentConfig::new("drums", 9)]),
        ("bass".to_string(), vec![InstrumentConfig::new("bass", 0)]),
        ("pad".to_string(), vec![InstrumentConfig::new("pad", 1)]),
        (
            "melody".to_string(),
            vec![
                InstrumentConfig::new("lead", 2),
                InstrumentConfig::new("counter", 3),
            ],
        ),
        ("arpeggio".to_string(), vec![InstrumentConfig::new("arpeggio", 4)]),
    ])
}

/// Overrides for one section; absent fields keep the built-in values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SectionOverride {
    /// Pattern loops the section lasts
    #[serde(default)]
    pub section_length: Option<u32>,
    /// Steps per pattern loop
    #[serde(default)]
    pub pattern_length: Option<u32>,
    /// Parts playing, in order
    #[serde(default)]
    pub parts: Option<Vec<PartEntryConfig>>,
    /// Successor section name to weight
    #[serde(default)]
    pub next: Option<BTreeMap<String, f64>>,
}

/// A part entry: `pad` or `[melody, 1]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PartEntryConfig {
    /// Part name; plays through instrument 0
    Bare(String),
    /// Part name and instrument index
    WithInstrument(String, usize),
}

impl PartEntryConfig {
    /// Resolve into a part request
    pub fn to_request(&self) -> error::Result<PartRequest> {
        match self {
            PartEntryConfig::Bare(name) => Ok(PartRequest::new(parse_part(name)?)),
            PartEntryConfig::WithInstrument(name, instrument) => {
                Ok(PartRequest::with_instrument(parse_part(name)?, *instrument))
            }
        }
    }
}

fn parse_section(name: &str) -> error::Result<SectionKind> {
    SectionKind::from_str(name).ok_or_else(|| CompositionError::UnknownSection(name.to_string()))
}

fn parse_part(name: &str) -> error::Result<PartKind> {
    PartKind::from_str(name).ok_or_else(|| CompositionError::UnknownPart(name.to_string()))
}
