//! # Respira Core Library
//!
//! This library provides the engine behind the Respira guided-breathing app:
//! a catalog of breathing programs, a session timer that walks the user
//! through inhale / pause / exhale cycles, and a history of finished
//! sessions. Rendering, onboarding and settings screens live in the host
//! application and talk to the engine through snapshots and events.
//!
//! ## Architecture
//!
//! - **Program Store**: Built-in and user-authored programs plus the active
//!   program, persisted through a key-value store
//! - **Session Timer**: A tick-driven state machine; the host calls `tick()`
//!   once per elapsed second and signals suspend/resume around backgrounding
//! - **Background Resync**: Folds suspended wall-clock time back into the
//!   running session
//! - **Session Recorder**: Most-recent-first history of finished sessions
//!
//! ## Key Components
//!
//! - [`BreathingEngine`]: Facade wiring the pieces together
//! - [`SessionTimer`]: Core phase/cycle state machine
//! - [`ProgramStore`]: Program catalog
//! - [`SessionRecorder`]: Session history
//! - [`KvStore`]: Persistence seam, backed by [`Database`] or [`MemoryStore`]

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod program;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock, Ticker};
pub use engine::BreathingEngine;
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{Event, EventBus};
pub use history::{HistoryStats, SessionRecord, SessionRecorder};
pub use program::{builtin_programs, Program, ProgramStore};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use timer::{Phase, ResyncPolicy, SessionTimer, TimerSnapshot, TimerState};
