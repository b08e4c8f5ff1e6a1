//! Session timer implementation.
//!
//! The session timer is a tick-driven state machine. It does not use
//! internal threads - the host calls `tick()` once per elapsed second while
//! a session runs, and feeds lifecycle signals (start/pause/reset,
//! suspend/resume) in between.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed -> Idle   (after the completion display delay)
//! any -> Idle                    (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new(clock, SessionConfig::default());
//! timer.set_program(program);
//! timer.start();
//! // Once per second:
//! timer.tick(); // Returns Some(Event) on phase change or completion
//! ```
//!
//! Every command returns the event that best describes its outcome. A
//! command can emit more than one event; subscribers see all of them in
//! order.

use std::rc::Rc;
use std::sync::mpsc::Receiver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::{Crossing, Phase, PhaseCursor};
use super::resync::reconcile;
use crate::clock::{saturating_secs, whole_seconds_between, Clock};
use crate::events::{Event, EventBus};
use crate::history::SessionRecord;
use crate::program::Program;
use crate::storage::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Session finished; shown briefly before returning to Idle.
    Completed,
}

/// Read-only view of the timer for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub program: Option<Program>,
    pub timer_state: TimerState,
    pub phase: Phase,
    pub current_cycle: u32,
    pub time_remaining_seconds: u32,
    pub phase_duration_seconds: u32,
    /// 0.0 .. 1.0 within the current phase.
    pub phase_progress: f64,
    /// `mm:ss`
    pub formatted_time_remaining: String,
    /// 0.0 .. 1.0 across the whole program.
    pub session_progress: f64,
    pub started_at: Option<DateTime<Utc>>,
}

/// Phase/cycle state machine for one breathing session.
///
/// Holds its own copy of the armed program, so edits to the catalog never
/// reach a session in flight.
pub struct SessionTimer {
    program: Option<Program>,
    state: TimerState,
    cursor: PhaseCursor,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    /// Set between a host suspend and the matching resume.
    suspended_at: Option<DateTime<Utc>>,
    clock: Rc<dyn Clock>,
    config: SessionConfig,
    bus: EventBus,
}

impl SessionTimer {
    /// Create an unarmed timer in the `Idle` state.
    pub fn new(clock: Rc<dyn Clock>, config: SessionConfig) -> Self {
        Self {
            program: None,
            state: TimerState::Idle,
            cursor: PhaseCursor {
                phase: Phase::Inhale,
                cycle: 1,
                remaining_secs: 0,
            },
            started_at: None,
            completed_at: None,
            suspended_at: None,
            clock,
            config,
            bus: EventBus::new(),
        }
    }

    /// Receive a copy of every event this timer emits from now on.
    pub fn subscribe(&mut self) -> Receiver<Event> {
        self.bus.subscribe()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.cursor.phase
    }

    pub fn current_cycle(&self) -> u32 {
        self.cursor.cycle
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.cursor.remaining_secs
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    pub fn phase_duration_secs(&self) -> u32 {
        self.program
            .as_ref()
            .map(|p| p.phase_duration(self.cursor.phase))
            .unwrap_or(0)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let total = self.phase_duration_secs();
        if total == 0 {
            return 0.0;
        }
        let done = total.saturating_sub(self.cursor.remaining_secs);
        (f64::from(done) / f64::from(total)).clamp(0.0, 1.0)
    }

    /// 0.0 .. 1.0 progress across the whole program.
    pub fn session_progress(&self) -> f64 {
        let Some(program) = &self.program else {
            return 0.0;
        };
        if self.state == TimerState::Completed {
            return 1.0;
        }
        let total = program.total_duration();
        if total == 0 {
            return 0.0;
        }
        (self.cursor.elapsed_secs(program) as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn formatted_time_remaining(&self) -> String {
        format_mm_ss(self.cursor.remaining_secs)
    }

    pub fn current_state(&self) -> TimerSnapshot {
        TimerSnapshot {
            program: self.program.clone(),
            timer_state: self.state,
            phase: self.cursor.phase,
            current_cycle: self.cursor.cycle,
            time_remaining_seconds: self.cursor.remaining_secs,
            phase_duration_seconds: self.phase_duration_secs(),
            phase_progress: self.phase_progress(),
            formatted_time_remaining: self.formatted_time_remaining(),
            session_progress: self.session_progress(),
            started_at: self.started_at,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the timer with `program`. Arming while a session is in flight
    /// resets it first; arming the same program again while Idle is a no-op.
    pub fn set_program(&mut self, program: Program) -> Option<Event> {
        if let Err(e) = program.validate() {
            tracing::warn!(id = %program.id, error = %e, "refusing to arm invalid program");
            return None;
        }
        if self.state == TimerState::Idle && self.program.as_ref() == Some(&program) {
            return None;
        }
        if self.state != TimerState::Idle {
            self.reset();
        }

        self.cursor = PhaseCursor::start(&program);
        let event = Event::ProgramArmed {
            program_id: program.id,
            program_name: program.name.clone(),
            at: self.clock.now(),
        };
        tracing::debug!(program = %program.name, "program armed");
        self.program = Some(program);
        self.emit(event)
    }

    /// Idle|Completed -> Running starts a fresh session; Paused -> Running
    /// resumes exactly where the pause left off.
    pub fn start(&mut self) -> Option<Event> {
        let program = self.program.as_ref()?;
        match self.state {
            TimerState::Idle | TimerState::Completed => {
                let now = self.clock.now();
                self.cursor = PhaseCursor::start(program);
                self.started_at = Some(now);
                self.completed_at = None;
                self.suspended_at = None;
                self.state = TimerState::Running;
                tracing::debug!(program = %program.name, "session started");
                let event = Event::TimerStarted {
                    program_id: program.id,
                    phase: self.cursor.phase,
                    cycle: self.cursor.cycle,
                    remaining_secs: self.cursor.remaining_secs,
                    at: now,
                };
                self.emit(event)
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                let event = Event::TimerResumed {
                    phase: self.cursor.phase,
                    cycle: self.cursor.cycle,
                    remaining_secs: self.cursor.remaining_secs,
                    at: self.clock.now(),
                };
                self.emit(event)
            }
            TimerState::Running => None, // Already running.
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        self.suspended_at = None;
        let event = Event::TimerPaused {
            phase: self.cursor.phase,
            cycle: self.cursor.cycle,
            remaining_secs: self.cursor.remaining_secs,
            at: self.clock.now(),
        };
        self.emit(event)
    }

    /// Back to Idle at the start of the first Inhale, from any state.
    ///
    /// A reset never counts as completion. With `record_partial_sessions`
    /// enabled, resetting a started session first publishes
    /// `SessionAbandoned`; it reaches subscribers only, the return value is
    /// always `TimerReset`.
    pub fn reset(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let in_flight = matches!(self.state, TimerState::Running | TimerState::Paused);
        if in_flight && self.config.record_partial_sessions {
            if let (Some(program), Some(started_at)) = (&self.program, self.started_at) {
                let record = SessionRecord::new(
                    program,
                    started_at,
                    now,
                    self.cursor.cycle.saturating_sub(1),
                );
                self.emit(Event::SessionAbandoned { record, at: now });
            }
        }

        self.rewind();
        self.emit(Event::TimerReset { at: now })
    }

    /// One elapsed second. Only does work while Running (and not suspended),
    /// plus the Completed -> Idle hand-back once the display delay is over.
    pub fn tick(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running if self.suspended_at.is_none() => {
                if self.cursor.remaining_secs > 0 {
                    self.cursor.remaining_secs -= 1;
                    if self.cursor.remaining_secs > 0 {
                        return None;
                    }
                }
                let now = self.clock.now();
                self.cross_boundary(now)
            }
            TimerState::Completed => {
                let completed_at = self.completed_at?;
                let delay = saturating_secs(self.config.completion_display_secs);
                let now = self.clock.now();
                if now - completed_at < delay {
                    return None;
                }
                self.rewind();
                self.emit(Event::TimerIdle { at: now })
            }
            _ => None,
        }
    }

    /// Host is about to be suspended. Only recorded while Running.
    pub fn suspend(&mut self) {
        if self.state == TimerState::Running && self.suspended_at.is_none() {
            self.suspended_at = Some(self.clock.now());
        }
    }

    /// Host came back. Folds the suspended whole seconds into the session
    /// according to the configured [`ResyncPolicy`](super::ResyncPolicy).
    /// No-op unless Running with a recorded suspend.
    ///
    /// Returns `Resynced`, or `SessionCompleted` when the session ran out
    /// while suspended (`Resynced` is still published first).
    pub fn resume(&mut self) -> Option<Event> {
        let suspended_at = self.suspended_at.take()?;
        if self.state != TimerState::Running {
            return None;
        }
        let program = self.program.as_ref()?;
        let now = self.clock.now();
        let elapsed_secs = whole_seconds_between(suspended_at, now);
        let outcome = reconcile(program, self.cursor, elapsed_secs, self.config.resync);
        self.cursor = outcome.cursor;

        tracing::debug!(
            elapsed_secs,
            crossings = outcome.crossings,
            policy = ?self.config.resync,
            "resynced after suspend"
        );
        let event = self.emit(Event::Resynced {
            elapsed_secs,
            crossings: outcome.crossings,
            phase: self.cursor.phase,
            cycle: self.cursor.cycle,
            remaining_secs: self.cursor.remaining_secs,
            at: now,
        });

        match outcome.finished_after_secs {
            Some(after) => {
                let ended_at = suspended_at
                    .checked_add_signed(saturating_secs(after))
                    .map_or(now, |at| at.min(now));
                self.complete(ended_at)
            }
            None => event,
        }
    }

    /// Drop the armed program and return to an unarmed Idle. A session in
    /// flight is reset first.
    pub fn disarm(&mut self) -> Option<Event> {
        if self.state != TimerState::Idle {
            self.reset();
        }
        let program = self.program.take()?;
        self.rewind();
        tracing::debug!(program = %program.name, "program disarmed");
        let event = Event::ProgramDisarmed {
            program_id: program.id,
            at: self.clock.now(),
        };
        self.emit(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cross_boundary(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let program = self.program.as_ref()?;
        match self.cursor.cross(program) {
            Crossing::Next(next) => {
                self.cursor = next;
                let event = Event::PhaseChanged {
                    phase: next.phase,
                    cycle: next.cycle,
                    duration_secs: next.remaining_secs,
                    at: now,
                };
                self.emit(event)
            }
            Crossing::Finished => self.complete(now),
        }
    }

    fn complete(&mut self, ended_at: DateTime<Utc>) -> Option<Event> {
        let program = self.program.as_ref()?;
        let now = self.clock.now();
        let started_at = self.started_at.unwrap_or(ended_at);
        let record = SessionRecord::new(program, started_at, ended_at, program.cycle_count);
        tracing::info!(
            program = %program.name,
            cycles = program.cycle_count,
            secs = record.duration_secs(),
            "session completed"
        );
        self.cursor.remaining_secs = 0;
        self.state = TimerState::Completed;
        self.completed_at = Some(now);
        self.suspended_at = None;
        self.emit(Event::SessionCompleted { record, at: now })
    }

    fn rewind(&mut self) {
        self.state = TimerState::Idle;
        self.started_at = None;
        self.completed_at = None;
        self.suspended_at = None;
        self.cursor = match &self.program {
            Some(program) => PhaseCursor::start(program),
            None => PhaseCursor {
                phase: Phase::Inhale,
                cycle: 1,
                remaining_secs: 0,
            },
        };
    }

    fn emit(&mut self, event: Event) -> Option<Event> {
        self.bus.publish(&event);
        Some(event)
    }
}

/// `mm:ss`; minutes are not wrapped at 60.
pub fn format_mm_ss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
