// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Start/stop surface that wires a director to a step clock.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use super::director::CompositionDirector;
use crate::error::{CompositionError, Result};
use crate::timing::{CallbackId, StepClock, StepTime};

/// A director subscribed to a clock while running
pub struct Composer {
    director: Rc<RefCell<CompositionDirector>>,
    callback: Option<CallbackId>,
}

impl Composer {
    /// Wrap a stopped director
    pub fn new(director: CompositionDirector) -> Self {
        Self {
            director: Rc::new(RefCell::new(director)),
            callback: None,
        }
    }

    /// Set the clock tempo, start the composition at the clock's next step
    /// and subscribe to step notifications.
    pub fn start(&mut self, clock: &mut StepClock) -> Result<()> {
        if self.callback.is_some() {
            return Err(CompositionError::AlreadyStarted);
        }

        {
            let mut director = self.director.borrow_mut();
            clock.set_bpm(director.settings().tempo);
            director.start_at(clock.step())?;
        }

        let director = Rc::clone(&self.director);
        let id = clock.add_step_callback(Box::new(move |time: StepTime| {
            director.borrow_mut().on_step(time)
        }));
        self.callback = Some(id);
        Ok(())
    }

    /// Unsubscribe from the clock and tear the composition down
    pub fn stop(&mut self, clock: &mut StepClock) {
        if let Some(id) = self.callback.take() {
            clock.remove_step_callback(id);
        }
        self.director.borrow_mut().stop();
    }

    /// Whether the composer is subscribed to a clock
    pub fn is_running(&self) -> bool {
        self.callback.is_some()
    }

    /// Borrow the director
    pub fn director(&self) -> Ref<'_, CompositionDirector> {
        self.director.borrow()
    }

    /// Shared handle to the director
    pub fn director_handle(&self) -> Rc<RefCell<CompositionDirector>> {
        Rc::clone(&self.director)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::director::CompositionSettings;
    use crate::composer::random::ScriptedRandom;
    use crate::composer::{SectionCatalog, SectionKind};
    use crate::generators::Generators;
    use crate::sequencer::{PartPool, Scheduler};

    fn composer(scheduler: Rc<RefCell<Scheduler>>) -> Composer {
        let director = CompositionDirector::new(
            CompositionSettings {
                tempo: 96.0,
                ..CompositionSettings::default()
            },
            SectionCatalog::builtin(),
            Rc::new(PartPool::reference()),
            scheduler,
            Box::new(ScriptedRandom::new(vec![0.0])),
            Box::new(|| Generators::builtin(Some(7))),
        );
        Composer::new(director)
    }

    #[test]
    fn test_start_subscribes() {
        let scheduler = Rc::new(RefCell::new(Scheduler::new()));
        let mut composer = composer(scheduler.clone());
        let mut clock = StepClock::default();

        composer.start(&mut clock).unwrap();
        assert!(composer.is_running());
        assert_eq!(clock.callback_count(), 1);
        assert_eq!(clock.bpm(), 96.0);
        assert!(scheduler.borrow().queue_len() > 0);

        assert_eq!(composer.start(&mut clock), Err(CompositionError::AlreadyStarted));
    }

    #[test]
    fn test_clock_drives_sections() {
        let scheduler = Rc::new(RefCell::new(Scheduler::new()));
        let mut composer = composer(scheduler);
        let mut clock = StepClock::default();
        clock.start();
        composer.start(&mut clock).unwrap();

        // The second intro boundary fires at step 124
        for _ in 0..124 {
            clock.tick().unwrap();
        }
        assert_eq!(composer.director().state().unwrap().section, SectionKind::Intro);

        clock.tick().unwrap();
        assert_eq!(composer.director().state().unwrap().section, SectionKind::Verse);
        assert_eq!(composer.director().pattern_step(), 128);
    }

    #[test]
    fn test_stop_unsubscribes() {
        let scheduler = Rc::new(RefCell::new(Scheduler::new()));
        let mut composer = composer(scheduler.clone());
        let mut clock = StepClock::default();
        clock.start();
        composer.start(&mut clock).unwrap();

        composer.stop(&mut clock);
        assert!(!composer.is_running());
        assert_eq!(clock.callback_count(), 0);
        assert!(composer.director().state().is_none());
        assert!(scheduler.borrow().is_empty());

        clock.tick().unwrap();
        assert!(composer.director().state().is_none());
    }
}
