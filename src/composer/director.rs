// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The section state machine.
//!
//! The director owns the composition state. It enters sections, keeps the
//! harmony cache, and at every loop boundary asks each active part's
//! generator for the next loop and forwards the result to the scheduler,
//! offset to the start of that loop.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::harmony::{expand_harmony, HarmonyCache};
use super::random::RandomSource;
use super::section::{SectionCatalog, SectionKind, LOOKAHEAD_STEPS};
use super::state::CompositionState;
use crate::error::{CompositionError, Result};
use crate::generators::Generators;
use crate::music::scale::{build_scale, Note, PitchTable, ScaleType};
use crate::sequencer::{EventScheduler, PartPool};
use crate::timing::StepTime;

/// Builds a fresh generator set each time a composition starts
pub type GeneratorFactory = Box<dyn Fn() -> Generators>;

/// Fixed musical parameters of a composition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionSettings {
    /// Tonic
    pub key: Note,
    /// Diatonic mode
    pub scale: ScaleType,
    /// Tempo in BPM
    pub tempo: f64,
    /// Frequency of A4 in Hz
    pub reference_pitch: f64,
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            key: Note::C,
            scale: ScaleType::Aeolian,
            tempo: 120.0,
            reference_pitch: 440.0,
        }
    }
}

/// Drives sections, harmony and pattern generation
pub struct CompositionDirector {
    settings: CompositionSettings,
    catalog: SectionCatalog,
    pool: Rc<PartPool>,
    scheduler: Rc<RefCell<dyn EventScheduler>>,
    rng: Box<dyn RandomSource>,
    factory: GeneratorFactory,
    generators: Generators,
    state: Option<CompositionState>,
    harmonies: HarmonyCache,
    /// Absolute step at which the current loop starts
    pattern_step: u64,
    /// Loop start at which the current section was entered
    section_start: u64,
}

impl CompositionDirector {
    /// Create a stopped director
    pub fn new(
        settings: CompositionSettings,
        catalog: SectionCatalog,
        pool: Rc<PartPool>,
        scheduler: Rc<RefCell<dyn EventScheduler>>,
        rng: Box<dyn RandomSource>,
        factory: GeneratorFactory,
    ) -> Self {
        Self {
            settings,
            catalog,
            pool,
            scheduler,
            rng,
            factory,
            generators: Generators::new(),
            state: None,
            harmonies: HarmonyCache::new(),
            pattern_step: 0,
            section_start: 0,
        }
    }

    /// Start at step 0
    pub fn start(&mut self) -> Result<()> {
        self.start_at(0)
    }

    /// Start a composition whose first loop begins at `origin`.
    ///
    /// Checks that every part request in the catalog has a generator and a
    /// destination, then enters the intro and schedules its first loop.
    pub fn start_at(&mut self, origin: u64) -> Result<()> {
        if self.state.is_some() {
            return Err(CompositionError::AlreadyStarted);
        }

        self.catalog.validate()?;
        let requests = self.catalog.part_requests();
        self.pool.check_covers(&requests)?;

        let generators = (self.factory)();
        if let Some(missing) = requests.iter().find(|r| !generators.contains(r.part)) {
            return Err(CompositionError::MissingGenerator(missing.part));
        }

        {
            let mut scheduler = self.scheduler.borrow_mut();
            for destination in self.pool.destinations() {
                scheduler.add_channel(destination.id);
            }
        }

        self.generators = generators;
        self.pattern_step = origin;
        self.section_start = origin;
        if let Err(err) = self.init(self.settings.key, self.settings.scale) {
            self.state = None;
            self.generators.clear();
            return Err(err);
        }
        info!(
            key = %self.settings.key,
            scale = %self.settings.scale,
            tempo = self.settings.tempo,
            "Composition started"
        );
        self.generate_patterns()
    }

    /// Build the scale and enter the intro
    fn init(&mut self, key: Note, scale: ScaleType) -> Result<()> {
        let table = PitchTable::twelve_tet(self.settings.reference_pitch);
        let pitches = build_scale(key, scale, &table);
        self.state = Some(CompositionState::new(key, scale, pitches));
        self.enter_section(SectionKind::Intro)
    }

    /// Load a section and its harmony, generating the harmony on first visit
    pub fn enter_section(&mut self, kind: SectionKind) -> Result<()> {
        let state = self.state.as_mut().ok_or(CompositionError::NotStarted)?;
        let def = self.catalog.get(kind)?;

        let map = self
            .harmonies
            .get_or_generate(kind, state.scale, def.pattern_length, self.rng.as_mut());
        let harmony = expand_harmony(map, def.pattern_length)?;
        state.enter(def, harmony);
        self.section_start = self.pattern_step;

        info!(section = %kind, loops = def.section_length, "Entering section");
        Ok(())
    }

    /// Advance one loop: count it, move to the next section when this one
    /// is done, and schedule the next loop's patterns.
    pub fn on_loop_boundary(&mut self) -> Result<()> {
        let state = self.state.as_mut().ok_or(CompositionError::NotStarted)?;

        self.pattern_step += state.pattern_length as u64;
        state.section_pattern += 1;
        debug!(
            section = %state.section,
            pattern = state.section_pattern,
            loop_start = self.pattern_step,
            "Loop boundary"
        );

        if state.section_pattern == state.section_length {
            let next = self.catalog.next_section(state.section, self.rng.as_mut())?;
            self.enter_section(next)?;
        }

        self.generate_patterns()
    }

    /// Ask every active part for its next loop and forward the events
    pub fn generate_patterns(&mut self) -> Result<()> {
        let state = self.state.as_ref().ok_or(CompositionError::NotStarted)?;

        for request in &state.parts {
            let generator = self
                .generators
                .get_mut(request.part)
                .ok_or(CompositionError::MissingGenerator(request.part))?;
            let destination = self.pool.resolve(*request)?;

            let events = generator.next_events(state);
            debug!(part = %request, count = events.len(), "Pattern batch");
            self.scheduler
                .borrow_mut()
                .add_events(destination.id, &events, self.pattern_step);
        }
        Ok(())
    }

    /// Per-step notification from the clock.
    ///
    /// Fires the loop boundary when the step sits `LOOKAHEAD_STEPS` before
    /// the end of a loop, counted in loops of the current section from the
    /// step it was entered at. Only the step's position in the loop
    /// matters, so a source that restarts its count keeps driving the
    /// composition. Notifications after stop are ignored.
    pub fn on_step(&mut self, time: StepTime) -> Result<()> {
        let Some(state) = self.state.as_ref() else {
            warn!(step = time.step, "Step notification while stopped");
            return Ok(());
        };

        let length = i128::from(state.pattern_length);
        let position =
            (i128::from(time.step) - i128::from(self.section_start)).rem_euclid(length);
        if position == length - i128::from(LOOKAHEAD_STEPS) {
            self.on_loop_boundary()?;
        }
        Ok(())
    }

    /// Discard the state and generators and tear down every destination.
    ///
    /// Events already handed to the scheduler are not retracted here; the
    /// scheduler drops them as part of removing the channel.
    pub fn stop(&mut self) {
        let was_running = self.state.take().is_some();
        self.generators.clear();
        self.harmonies.clear();

        let mut scheduler = self.scheduler.borrow_mut();
        for destination in self.pool.destinations() {
            scheduler.remove_channel(destination.id);
        }

        if was_running {
            info!("Composition stopped");
        }
    }

    /// Current state, if running
    pub fn state(&self) -> Option<&CompositionState> {
        self.state.as_ref()
    }

    /// Whether a composition is running
    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    /// Absolute step of the current loop start
    pub fn pattern_step(&self) -> u64 {
        self.pattern_step
    }

    /// Harmony maps generated so far
    pub fn harmonies(&self) -> &HarmonyCache {
        &self.harmonies
    }

    /// Generators currently alive
    pub fn generators(&self) -> &Generators {
        &self.generators
    }

    /// The section table in use
    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    /// Composition settings
    pub fn settings(&self) -> &CompositionSettings {
        &self.settings
    }
}

impl std::fmt::Debug for CompositionDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionDirector")
            .field("settings", &self.settings)
            .field("running", &self.is_running())
            .field("section", &self.state.as_ref().map(|s| s.section))
            .field("pattern_step", &self.pattern_step)
            .field("generators", &self.generators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::random::ScriptedRandom;
    use crate::composer::section::{PartKind, PartRequest, SectionDef};
    use crate::composer::harmony::HarmonyMap;
    use crate::generators::{NoteEvent, PartGenerator};
    use crate::sequencer::DestinationId;

    /// Records every batch forwarded to it
    #[derive(Default)]
    struct RecordingScheduler {
        batches: Vec<(DestinationId, usize, u64)>,
        added: Vec<DestinationId>,
        removed: Vec<DestinationId>,
    }

    impl EventScheduler for RecordingScheduler {
        fn add_events(&mut self, destination: DestinationId, events: &[NoteEvent], time_offset: u64) {
            self.batches.push((destination, events.len(), time_offset));
        }

        fn add_channel(&mut self, destination: DestinationId) {
            self.added.push(destination);
        }

        fn remove_channel(&mut self, destination: DestinationId) {
            self.removed.push(destination);
        }
    }

    struct FixedGenerator(PartKind);

    impl PartGenerator for FixedGenerator {
        fn next_events(&mut self, _state: &CompositionState) -> Vec<NoteEvent> {
            vec![NoteEvent::new(60, 100, 0, 1)]
        }

        fn part(&self) -> PartKind {
            self.0
        }
    }

    fn fixed_generators() -> Generators {
        let mut set = Generators::new();
        for part in PartKind::ALL {
            set.insert(Box::new(FixedGenerator(part)));
        }
        set
    }

    fn director_with(
        catalog: SectionCatalog,
        draws: Vec<f64>,
    ) -> (CompositionDirector, Rc<RefCell<RecordingScheduler>>) {
        let scheduler = Rc::new(RefCell::new(RecordingScheduler::default()));
        let director = CompositionDirector::new(
            CompositionSettings::default(),
            catalog,
            Rc::new(PartPool::reference()),
            scheduler.clone(),
            Box::new(ScriptedRandom::new(draws)),
            Box::new(fixed_generators),
        );
        (director, scheduler)
    }

    #[test]
    fn test_start_enters_intro() {
        let (mut director, scheduler) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();

        let state = director.state().unwrap();
        assert_eq!(state.section, SectionKind::Intro);
        assert_eq!(state.section_pattern, 0);
        assert_eq!(state.harmony.len(), 64);
        assert_eq!(state.scale_pitches[35].note, 60);

        // Pad and arpeggio scheduled at the first loop start
        let batches = &scheduler.borrow().batches;
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|&(_, _, offset)| offset == 0));
    }

    #[test]
    fn test_start_twice_fails() {
        let (mut director, _) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();
        assert_eq!(director.start(), Err(CompositionError::AlreadyStarted));
    }

    #[test]
    fn test_boundary_before_start_fails() {
        let (mut director, _) = director_with(SectionCatalog::builtin(), vec![0.0]);
        assert_eq!(director.on_loop_boundary(), Err(CompositionError::NotStarted));
    }

    #[test]
    fn test_section_changes_after_its_length() {
        // 0.0 picks the first successor: intro -> verse
        let (mut director, _) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();

        director.on_loop_boundary().unwrap();
        let state = director.state().unwrap();
        assert_eq!(state.section, SectionKind::Intro);
        assert_eq!(state.section_pattern, 1);
        assert_eq!(director.pattern_step(), 64);

        director.on_loop_boundary().unwrap();
        let state = director.state().unwrap();
        assert_eq!(state.section, SectionKind::Verse);
        assert_eq!(state.section_pattern, 0);
        assert_eq!(director.pattern_step(), 128);
    }

    #[test]
    fn test_batches_offset_to_next_loop() {
        let (mut director, scheduler) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();
        director.on_loop_boundary().unwrap();
        director.on_loop_boundary().unwrap();

        let batches = &scheduler.borrow().batches;
        // intro, intro, verse (drums, bass, pad, melody)
        assert_eq!(batches.len(), 2 + 2 + 4);
        assert!(batches[4..].iter().all(|&(_, _, offset)| offset == 128));
    }

    #[test]
    fn test_on_step_fires_four_steps_early() {
        let (mut director, _) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();

        for step in 0..59 {
            director.on_step(StepTime { time: 0.0, step }).unwrap();
        }
        assert_eq!(director.state().unwrap().section_pattern, 0);

        director.on_step(StepTime { time: 0.0, step: 60 }).unwrap();
        assert_eq!(director.state().unwrap().section_pattern, 1);
        assert_eq!(director.pattern_step(), 64);

        // The next boundary is relative to the new loop start
        director.on_step(StepTime { time: 0.0, step: 61 }).unwrap();
        assert_eq!(director.state().unwrap().section_pattern, 1);
    }

    #[test]
    fn test_missing_generator() {
        let scheduler = Rc::new(RefCell::new(RecordingScheduler::default()));
        let mut director = CompositionDirector::new(
            CompositionSettings::default(),
            SectionCatalog::builtin(),
            Rc::new(PartPool::reference()),
            scheduler,
            Box::new(ScriptedRandom::new(vec![0.0])),
            Box::new(|| {
                let mut set = Generators::new();
                set.insert(Box::new(FixedGenerator(PartKind::Pad)));
                set
            }),
        );

        assert!(matches!(
            director.start(),
            Err(CompositionError::MissingGenerator(_))
        ));
        assert!(!director.is_running());
    }

    #[test]
    fn test_missing_destination() {
        let mut catalog = SectionCatalog::builtin();
        catalog.insert(
            SectionDef::new(SectionKind::Intro, 1)
                .with_parts(vec![PartRequest::with_instrument(PartKind::Pad, 3)])
                .then(SectionKind::Verse, 1.0),
        );
        let (mut director, _) = director_with(catalog, vec![0.0]);

        assert_eq!(
            director.start(),
            Err(CompositionError::MissingDestination {
                part: PartKind::Pad,
                instrument: 3
            })
        );
    }

    #[test]
    fn test_harmony_reused_on_return() {
        // intro -> verse -> chorus -> verse
        let (mut director, _) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();
        for _ in 0..2 {
            director.on_loop_boundary().unwrap();
        }
        let verse = director.state().unwrap().harmony.clone();
        let verse_map: HarmonyMap = director.harmonies().get(SectionKind::Verse).unwrap().clone();

        for _ in 0..4 {
            director.on_loop_boundary().unwrap();
        }
        let state = director.state().unwrap();
        assert_eq!(state.section, SectionKind::Verse);
        assert_eq!(state.harmony, verse);
        assert_eq!(director.harmonies().get(SectionKind::Verse), Some(&verse_map));
        assert_eq!(director.harmonies().len(), 3);
    }

    #[test]
    fn test_stop_tears_down() {
        let (mut director, scheduler) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();
        director.stop();

        assert!(!director.is_running());
        assert!(director.generators().is_empty());
        assert!(director.harmonies().is_empty());
        assert_eq!(scheduler.borrow().removed.len(), 6);

        // Stray notifications change nothing
        let batches = scheduler.borrow().batches.len();
        director.on_step(StepTime { time: 0.0, step: 60 }).unwrap();
        assert!(director.state().is_none());
        assert_eq!(scheduler.borrow().batches.len(), batches);

        // A stopped director can start again and reopens its destinations
        director.start().unwrap();
        assert_eq!(director.state().unwrap().section, SectionKind::Intro);
        assert_eq!(scheduler.borrow().added.len(), 12);
        assert_eq!(scheduler.borrow().batches.len(), batches + 2);
    }

    #[test]
    fn test_on_step_follows_loop_position_after_rewind() {
        let (mut director, _) = director_with(SectionCatalog::builtin(), vec![0.0]);
        director.start().unwrap();

        for step in 0..100 {
            director.on_step(StepTime { time: 0.0, step }).unwrap();
        }
        assert_eq!(director.state().unwrap().section_pattern, 1);

        // The source restarts its count; step 60 is again a boundary
        for step in 0..100 {
            director.on_step(StepTime { time: 0.0, step }).unwrap();
        }
        let state = director.state().unwrap();
        assert_eq!(state.section, SectionKind::Verse);
        assert_eq!(state.section_pattern, 0);
        assert_eq!(director.pattern_step(), 128);
    }

    #[test]
    fn test_on_step_uses_section_loop_length() {
        let mut catalog = SectionCatalog::builtin();
        let mut intro = SectionDef::new(SectionKind::Intro, 1)
            .with_parts(vec![PartRequest::new(PartKind::Pad)])
            .then(SectionKind::Verse, 1.0);
        intro.pattern_length = 32;
        catalog.insert(intro);
        let (mut director, _) = director_with(catalog, vec![0.0]);
        director.start().unwrap();

        director.on_step(StepTime { time: 0.0, step: 28 }).unwrap();
        assert_eq!(director.state().unwrap().section, SectionKind::Verse);
        assert_eq!(director.pattern_step(), 32);

        // The verse loop runs 32..96, so its boundary is at 92
        director.on_step(StepTime { time: 0.0, step: 60 }).unwrap();
        assert_eq!(director.state().unwrap().section_pattern, 0);
        director.on_step(StepTime { time: 0.0, step: 92 }).unwrap();
        assert_eq!(director.state().unwrap().section_pattern, 1);
        assert_eq!(director.pattern_step(), 96);
    }
}
