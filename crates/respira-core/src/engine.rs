//! Engine facade.
//!
//! `BreathingEngine` owns the program catalog, the session timer and the
//! session history, shares one injected key-value store and clock between
//! them, and routes session records from the timer into the history.
//! Everything runs on the caller's thread.
//!
//! While Idle the timer is always armed with the catalog's active program.
//! Edits and deletions of the active program made during a session reach
//! the timer once it is back to Idle, or when a new session starts from
//! Completed.

use std::rc::Rc;
use std::sync::mpsc::Receiver;

use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::history::{HistoryStats, SessionRecord, SessionRecorder};
use crate::program::{Program, ProgramStore};
use crate::storage::{Config, Database, KvStore};
use crate::timer::{SessionTimer, TimerSnapshot, TimerState};

pub struct BreathingEngine {
    programs: ProgramStore,
    timer: SessionTimer,
    recorder: SessionRecorder,
    clock: Rc<dyn Clock>,
    /// The engine's own subscription to the timer, drained after every
    /// command to forward records into the history.
    inbox: Receiver<Event>,
}

impl BreathingEngine {
    /// Load the catalog and history from `store` and arm the timer with the
    /// restored active program, if any.
    pub fn new(store: Rc<dyn KvStore>, clock: Rc<dyn Clock>, config: &Config) -> Self {
        let programs = ProgramStore::load(store.clone());
        let recorder = SessionRecorder::load(store);
        let mut timer = SessionTimer::new(clock.clone(), config.session.clone());
        let inbox = timer.subscribe();

        if let Some(active) = programs.active() {
            timer.set_program(active.clone());
        }

        let mut engine = Self {
            programs,
            timer,
            recorder,
            clock,
            inbox,
        };
        engine.route();
        engine
    }

    /// Open the SQLite store named in `config` under the data directory,
    /// using the wall clock.
    pub fn open(config: &Config) -> Result<Self, CoreError> {
        let db = Database::open(&config.storage.database)?;
        Ok(Self::new(Rc::new(db), Rc::new(SystemClock), config))
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn programs(&self) -> &ProgramStore {
        &self.programs
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn history(&self) -> &SessionRecorder {
        &self.recorder
    }

    pub fn current_state(&self) -> TimerSnapshot {
        self.timer.current_state()
    }

    pub fn stats(&self) -> HistoryStats {
        self.recorder.stats(self.clock.now())
    }

    pub fn subscribe(&mut self) -> Receiver<Event> {
        self.timer.subscribe()
    }

    // ── Catalog ──────────────────────────────────────────────────────

    pub fn add_program(&mut self, program: Program) -> Result<(), ValidationError> {
        self.programs.add(program)
    }

    /// A session in flight keeps the copy it was armed with.
    pub fn update_program(&mut self, program: Program) -> bool {
        let updated = self.programs.update(program);
        if updated {
            self.route();
        }
        updated
    }

    /// Deleting the active program disarms the timer once it is Idle.
    pub fn delete_program(&mut self, program: &Program) -> bool {
        let deleted = self.programs.delete(program);
        if deleted {
            self.route();
        }
        deleted
    }

    /// Make the catalog program `id` active and arm the timer with it.
    pub fn select_program(&mut self, id: Uuid) -> Option<Event> {
        let program = self.programs.get(id)?.clone();
        if !self.programs.set_active(&program) {
            return None;
        }
        let event = self.timer.set_program(program);
        self.route();
        event
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Starting from Completed picks up catalog edits made since the
    /// session began.
    pub fn start(&mut self) -> Option<Event> {
        if self.timer.state() == TimerState::Completed {
            self.rearm();
        }
        let event = self.timer.start();
        self.route();
        event
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.timer.pause();
        self.route();
        event
    }

    pub fn reset(&mut self) -> Option<Event> {
        let event = self.timer.reset();
        self.route();
        event
    }

    pub fn tick(&mut self) -> Option<Event> {
        let event = self.timer.tick();
        self.route();
        event
    }

    pub fn suspend(&mut self) {
        self.timer.suspend();
    }

    pub fn resume(&mut self) -> Option<Event> {
        let event = self.timer.resume();
        self.route();
        event
    }

    // ── History ──────────────────────────────────────────────────────

    pub fn delete_record(&mut self, record: &SessionRecord) -> bool {
        self.recorder.delete(record)
    }

    fn route(&mut self) {
        self.sync_armed();
        while let Ok(event) = self.inbox.try_recv() {
            if let Event::SessionCompleted { record, .. } | Event::SessionAbandoned { record, .. } =
                event
            {
                self.recorder.add(record);
            }
        }
    }

    /// Keep an Idle timer armed with the active program.
    fn sync_armed(&mut self) {
        if self.timer.state() == TimerState::Idle {
            self.rearm();
        }
    }

    fn rearm(&mut self) {
        match self.programs.active().cloned() {
            Some(active) if self.timer.program() != Some(&active) => {
                self.timer.set_program(active);
            }
            None if self.timer.program().is_some() => {
                self.timer.disarm();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;

    fn engine_on(store: Rc<MemoryStore>, clock: &ManualClock) -> BreathingEngine {
        BreathingEngine::new(store, Rc::new(clock.clone()), &Config::default())
    }

    fn run_ticks(engine: &mut BreathingEngine, clock: &ManualClock, n: u32) {
        for _ in 0..n {
            clock.advance_secs(1);
            engine.tick();
        }
    }

    #[test]
    fn completion_lands_in_history() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        let mine = Program::custom("Short", 1, 0, 1, 2).unwrap();
        engine.add_program(mine.clone()).unwrap();
        assert!(engine.select_program(mine.id).is_some());
        engine.start();
        run_ticks(&mut engine, &clock, 4);

        assert_eq!(engine.timer().state(), TimerState::Completed);
        assert_eq!(engine.history().len(), 1);
        let record = &engine.history().records()[0];
        assert_eq!(record.program_name, "Short");
        assert!(record.is_complete());
        assert_eq!(engine.stats().completed_sessions, 1);
    }

    #[test]
    fn reset_mid_session_records_nothing() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        let id = engine.programs().programs()[0].id;
        engine.select_program(id);
        engine.start();
        run_ticks(&mut engine, &clock, 5);
        engine.reset();
        assert!(engine.history().is_empty());
    }

    #[test]
    fn restart_rearms_active_program() {
        let clock = ManualClock::default();
        let store = Rc::new(MemoryStore::new());
        let chosen = {
            let mut engine = engine_on(store.clone(), &clock);
            let chosen = engine.programs().programs()[2].clone();
            engine.select_program(chosen.id);
            chosen
        };

        let engine = engine_on(store, &clock);
        assert_eq!(engine.programs().active(), Some(&chosen));
        assert_eq!(engine.timer().program(), Some(&chosen));
        assert_eq!(engine.current_state().time_remaining_seconds, chosen.inhale_seconds);
    }

    #[test]
    fn editing_idle_active_program_rearms_timer() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        let mine = Program::custom("Short", 3, 0, 3, 2).unwrap();
        engine.add_program(mine.clone()).unwrap();
        engine.select_program(mine.id);

        let mut slower = mine.clone();
        slower.inhale_seconds = 9;
        assert!(engine.update_program(slower.clone()));
        assert_eq!(engine.timer().program(), Some(&slower));

        engine.start();
        assert_eq!(engine.current_state().time_remaining_seconds, 9);
    }

    #[test]
    fn edit_during_session_applies_after_it_ends() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        let mine = Program::custom("Short", 1, 0, 1, 1).unwrap();
        engine.add_program(mine.clone()).unwrap();
        engine.select_program(mine.id);
        engine.start();

        let mut longer = mine.clone();
        longer.exhale_seconds = 5;
        assert!(engine.update_program(longer.clone()));
        assert_eq!(engine.timer().program(), Some(&mine));

        run_ticks(&mut engine, &clock, 2);
        assert_eq!(engine.timer().state(), TimerState::Completed);
        assert_eq!(engine.timer().program(), Some(&mine));
        assert_eq!(engine.history().records()[0].program_phase_description, "Inhale 1s · Exhale 1s");

        // completion cooldown hands back to Idle
        run_ticks(&mut engine, &clock, 2);
        assert_eq!(engine.timer().state(), TimerState::Idle);
        assert_eq!(engine.timer().program(), Some(&longer));
    }

    #[test]
    fn start_from_completed_uses_edited_program() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        let mine = Program::custom("Short", 1, 0, 1, 1).unwrap();
        engine.add_program(mine.clone()).unwrap();
        engine.select_program(mine.id);
        engine.start();

        let mut longer = mine.clone();
        longer.inhale_seconds = 6;
        engine.update_program(longer.clone());
        run_ticks(&mut engine, &clock, 2);
        assert_eq!(engine.timer().state(), TimerState::Completed);

        assert!(matches!(engine.start(), Some(Event::TimerStarted { .. })));
        assert_eq!(engine.timer().program(), Some(&longer));
        assert_eq!(engine.current_state().time_remaining_seconds, 6);
    }

    #[test]
    fn deleting_idle_active_program_disarms_timer() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        let mine = Program::custom("Short", 3, 0, 3, 2).unwrap();
        engine.add_program(mine.clone()).unwrap();
        engine.select_program(mine.id);

        assert!(engine.delete_program(&mine));
        assert!(engine.programs().active().is_none());
        assert!(engine.timer().program().is_none());
        assert!(engine.start().is_none());
    }

    #[test]
    fn deleting_active_program_mid_session_disarms_after_reset() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        let mine = Program::custom("Short", 3, 0, 3, 2).unwrap();
        engine.add_program(mine.clone()).unwrap();
        engine.select_program(mine.id);
        engine.start();
        run_ticks(&mut engine, &clock, 1);

        assert!(engine.delete_program(&mine));
        assert_eq!(engine.timer().state(), TimerState::Running);
        assert_eq!(engine.timer().program(), Some(&mine));

        engine.reset();
        assert!(engine.timer().program().is_none());
        assert!(engine.start().is_none());
    }

    #[test]
    fn select_unknown_program_is_noop() {
        let clock = ManualClock::default();
        let mut engine = engine_on(Rc::new(MemoryStore::new()), &clock);
        assert!(engine.select_program(Uuid::new_v4()).is_none());
        assert!(engine.timer().program().is_none());
    }
}
