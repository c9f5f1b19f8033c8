// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Harmony generation and expansion.
//!
//! A section's harmony starts life as a sparse [`HarmonyMap`] (chord changes
//! at a few steps), is memoized per section in a [`HarmonyCache`], and is
//! expanded to one chord degree per step before the generators see it.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::random::RandomSource;
use super::section::SectionKind;
use crate::error::{CompositionError, Result};
use crate::music::scale::{ScaleType, DIATONIC_DEGREES};

/// Scale-relative chord root (0-6)
pub type ChordDegree = u8;

/// Number of equal segments a generated harmony is split into
pub const HARMONY_SEGMENTS: u32 = 4;

/// Sparse step -> chord degree assignments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarmonyMap {
    chords: BTreeMap<u32, ChordDegree>,
}

impl HarmonyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from (step, chord) pairs
    pub fn from_pairs(pairs: &[(u32, ChordDegree)]) -> Self {
        let mut map = Self::new();
        for &(step, chord) in pairs {
            map.insert(step, chord);
        }
        map
    }

    /// Set the chord that starts at `step`
    pub fn insert(&mut self, step: u32, chord: ChordDegree) {
        self.chords.insert(step, chord % DIATONIC_DEGREES as u8);
    }

    /// Chord that starts exactly at `step`, if any
    pub fn get(&self, step: u32) -> Option<ChordDegree> {
        self.chords.get(&step).copied()
    }

    /// Iterate change points in step order
    pub fn iter(&self) -> impl Iterator<Item = (u32, ChordDegree)> + '_ {
        self.chords.iter().map(|(&step, &chord)| (step, chord))
    }

    /// Number of change points
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    /// Check if there are no change points
    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }
}

/// Expand a sparse harmony into one chord per step.
///
/// Each step holds the chord of the nearest change point at or before it.
/// Change points at or past `pattern_length` are ignored.
pub fn expand_harmony(map: &HarmonyMap, pattern_length: u32) -> Result<Vec<ChordDegree>> {
    let mut carry = map.get(0).ok_or(CompositionError::MissingHarmonyRoot)?;

    let mut slots: Vec<Option<ChordDegree>> = vec![None; pattern_length as usize];
    for (step, chord) in map.iter() {
        if let Some(slot) = slots.get_mut(step as usize) {
            *slot = Some(chord);
        }
    }

    let harmony: Vec<ChordDegree> = slots
        .into_iter()
        .map(|slot| {
            if let Some(chord) = slot {
                carry = chord;
            }
            carry
        })
        .collect();

    if harmony.len() != pattern_length as usize {
        return Err(CompositionError::HarmonyLengthMismatch {
            expected: pattern_length as usize,
            actual: harmony.len(),
        });
    }
    Ok(harmony)
}

/// Degree that should rarely anchor a harmony in the given mode.
///
/// This is where the diminished triad sits: vii in major, ii in minor.
pub fn avoided_degree(scale: ScaleType) -> ChordDegree {
    (6 + DIATONIC_DEGREES as u8 - scale.index()) % DIATONIC_DEGREES as u8
}

/// Pick a random chord degree, steering away from the avoided degree
pub fn pick_chord(scale: ScaleType, rng: &mut dyn RandomSource) -> ChordDegree {
    let degrees = DIATONIC_DEGREES as u32;
    let mut chord = rng.below(degrees);
    if chord == avoided_degree(scale) as u32 {
        chord += rng.below(3) + 1;
    }
    (chord % degrees) as ChordDegree
}

/// Generate a fresh sparse harmony for one pattern loop.
///
/// The loop always opens on the tonic; each remaining segment gets a
/// picked chord.
pub fn generate_harmony(
    scale: ScaleType,
    pattern_length: u32,
    rng: &mut dyn RandomSource,
) -> HarmonyMap {
    let mut map = HarmonyMap::new();
    map.insert(0, 0);
    for segment in 1..HARMONY_SEGMENTS {
        let step = pattern_length * segment / HARMONY_SEGMENTS;
        if step > 0 {
            map.insert(step, pick_chord(scale, rng));
        }
    }
    map
}

/// Harmony maps memoized per section for the life of a composition
#[derive(Debug, Clone, Default)]
pub struct HarmonyCache {
    maps: HashMap<SectionKind, HarmonyMap>,
}

impl HarmonyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the section's harmony, generating it on first use
    pub fn get_or_generate(
        &mut self,
        section: SectionKind,
        scale: ScaleType,
        pattern_length: u32,
        rng: &mut dyn RandomSource,
    ) -> &HarmonyMap {
        self.maps.entry(section).or_insert_with(|| {
            let map = generate_harmony(scale, pattern_length, rng);
            debug!(%section, ?map, "Generated harmony");
            map
        })
    }

    /// Cached harmony for a section
    pub fn get(&self, section: SectionKind) -> Option<&HarmonyMap> {
        self.maps.get(&section)
    }

    /// Number of sections with a cached harmony
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Forget all cached harmonies
    pub fn clear(&mut self) {
        self.maps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::random::{seeded_rng, ScriptedRandom};

    #[test]
    fn test_expand_holds_chords_between_changes() {
        let map = HarmonyMap::from_pairs(&[(0, 0), (16, 3), (32, 5)]);
        let harmony = expand_harmony(&map, 64).unwrap();

        assert_eq!(harmony.len(), 64);
        assert!(harmony[0..16].iter().all(|&c| c == 0));
        assert!(harmony[16..32].iter().all(|&c| c == 3));
        assert!(harmony[32..64].iter().all(|&c| c == 5));
    }

    #[test]
    fn test_from_pairs_wraps_degrees() {
        let map = HarmonyMap::from_pairs(&[(0, 7), (16, 10)]);
        assert_eq!(map.get(0), Some(0));
        assert_eq!(map.get(16), Some(3));
        assert!(expand_harmony(&map, 32).unwrap().iter().all(|&c| c < 7));
    }

    #[test]
    fn test_expand_single_chord() {
        let map = HarmonyMap::from_pairs(&[(0, 4)]);
        let harmony = expand_harmony(&map, 8).unwrap();
        assert_eq!(harmony, vec![4; 8]);
    }

    #[test]
    fn test_expand_matches_nearest_prior_key() {
        let map = HarmonyMap::from_pairs(&[(0, 1), (3, 2), (4, 6), (9, 0)]);
        let harmony = expand_harmony(&map, 12).unwrap();
        for (step, &chord) in harmony.iter().enumerate() {
            let expected = map
                .iter()
                .filter(|&(s, _)| s as usize <= step)
                .last()
                .map(|(_, c)| c)
                .unwrap();
            assert_eq!(chord, expected, "step {}", step);
        }
    }

    #[test]
    fn test_expand_ignores_changes_past_loop_end() {
        let map = HarmonyMap::from_pairs(&[(0, 2), (70, 5)]);
        let harmony = expand_harmony(&map, 64).unwrap();
        assert_eq!(harmony, vec![2; 64]);
    }

    #[test]
    fn test_expand_requires_step_zero() {
        let empty = HarmonyMap::new();
        assert_eq!(
            expand_harmony(&empty, 64),
            Err(CompositionError::MissingHarmonyRoot)
        );

        let no_root = HarmonyMap::from_pairs(&[(16, 3)]);
        assert_eq!(
            expand_harmony(&no_root, 64),
            Err(CompositionError::MissingHarmonyRoot)
        );
    }

    #[test]
    fn test_avoided_degree() {
        assert_eq!(avoided_degree(ScaleType::Ionian), 6);
        assert_eq!(avoided_degree(ScaleType::Aeolian), 1);
        assert_eq!(avoided_degree(ScaleType::Locrian), 0);
    }

    #[test]
    fn test_pick_chord_takes_redraw_path() {
        // First draw lands on degree 1 (avoided in minor), offset draw gives +2
        let mut rng = ScriptedRandom::new(vec![0.2, 0.5]);
        let chord = pick_chord(ScaleType::Aeolian, &mut rng);
        assert_eq!(rng.draws(), 2);
        assert_eq!(chord, 3);
    }

    #[test]
    fn test_pick_chord_keeps_other_degrees() {
        // Degree 4 is fine in minor: one draw only
        let mut rng = ScriptedRandom::new(vec![0.6]);
        let chord = pick_chord(ScaleType::Aeolian, &mut rng);
        assert_eq!(rng.draws(), 1);
        assert_eq!(chord, 4);
    }

    #[test]
    fn test_pick_chord_wraps_modulo() {
        // Degree 6 is avoided in major; offset 3 wraps to 2
        let mut rng = ScriptedRandom::new(vec![0.9, 0.9]);
        assert_eq!(pick_chord(ScaleType::Ionian, &mut rng), 2);
    }

    #[test]
    fn test_pick_chord_never_returns_avoided() {
        let mut rng = seeded_rng(Some(42));
        for scale in ScaleType::ALL {
            for _ in 0..500 {
                let chord = pick_chord(scale, &mut rng);
                assert!(chord < 7);
                assert_ne!(chord, avoided_degree(scale));
            }
        }
    }

    #[test]
    fn test_generate_harmony_layout() {
        let mut rng = ScriptedRandom::new(vec![0.0, 0.5, 0.9]);
        let map = generate_harmony(ScaleType::Aeolian, 64, &mut rng);

        let steps: Vec<u32> = map.iter().map(|(s, _)| s).collect();
        assert_eq!(steps, vec![0, 16, 32, 48]);
        assert_eq!(map.get(0), Some(0));
        assert_eq!(map.get(16), Some(0));
        assert_eq!(map.get(32), Some(3));
        assert_eq!(map.get(48), Some(6));
    }

    #[test]
    fn test_cache_reuses_section_harmony() {
        let mut cache = HarmonyCache::new();
        let mut rng = seeded_rng(Some(3));

        let first = cache
            .get_or_generate(SectionKind::Verse, ScaleType::Aeolian, 64, &mut rng)
            .clone();
        cache.get_or_generate(SectionKind::Chorus, ScaleType::Aeolian, 64, &mut rng);
        let again = cache
            .get_or_generate(SectionKind::Verse, ScaleType::Aeolian, 64, &mut rng)
            .clone();

        assert_eq!(first, again);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
