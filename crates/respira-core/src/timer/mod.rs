mod engine;
mod phase;
pub mod resync;

pub use engine::{format_mm_ss, SessionTimer, TimerSnapshot, TimerState};
pub use phase::{Crossing, Phase, PhaseCursor};
pub use resync::{reconcile, ResyncOutcome, ResyncPolicy};
