//! Background time reconciliation.
//!
//! When the host is suspended while a session runs, no ticks arrive. On
//! resume the timer folds the elapsed wall-clock seconds back into its
//! phase cursor with [`reconcile`].

use serde::{Deserialize, Serialize};

use super::phase::{Crossing, PhaseCursor};
use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// Walk through every phase and cycle the elapsed time covers,
    /// completing the session retroactively if it ran out.
    #[default]
    Cascade,
    /// Clamp the current phase at zero and cross at most one boundary.
    SingleStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResyncOutcome {
    pub cursor: PhaseCursor,
    /// Phase boundaries crossed, including the one that ended the session.
    pub crossings: u32,
    /// Set when the session ran out: seconds after the suspend at which
    /// the final phase ended.
    pub finished_after_secs: Option<u64>,
}

/// Fold `elapsed_secs` into `cursor`. Pure; the caller applies the result.
pub fn reconcile(
    program: &Program,
    cursor: PhaseCursor,
    elapsed_secs: u64,
    policy: ResyncPolicy,
) -> ResyncOutcome {
    let unchanged = ResyncOutcome {
        cursor,
        crossings: 0,
        finished_after_secs: None,
    };
    if elapsed_secs == 0 {
        return unchanged;
    }

    match policy {
        ResyncPolicy::SingleStep => single_step(program, cursor, elapsed_secs),
        ResyncPolicy::Cascade => cascade(program, cursor, elapsed_secs),
    }
}

fn single_step(program: &Program, mut cursor: PhaseCursor, elapsed_secs: u64) -> ResyncOutcome {
    let remaining = u64::from(cursor.remaining_secs);
    if elapsed_secs < remaining {
        cursor.remaining_secs -= elapsed_secs as u32;
        return ResyncOutcome {
            cursor,
            crossings: 0,
            finished_after_secs: None,
        };
    }
    cursor.remaining_secs = 0;
    match cursor.cross(program) {
        Crossing::Next(next) => ResyncOutcome {
            cursor: next,
            crossings: 1,
            finished_after_secs: None,
        },
        Crossing::Finished => ResyncOutcome {
            cursor,
            crossings: 1,
            finished_after_secs: Some(remaining),
        },
    }
}

fn cascade(program: &Program, mut cursor: PhaseCursor, elapsed_secs: u64) -> ResyncOutcome {
    let mut left = elapsed_secs;
    let mut consumed = 0u64;
    let mut crossings = 0u32;

    loop {
        let remaining = u64::from(cursor.remaining_secs);
        if left < remaining {
            cursor.remaining_secs -= left as u32;
            return ResyncOutcome {
                cursor,
                crossings,
                finished_after_secs: None,
            };
        }
        left -= remaining;
        consumed += remaining;
        cursor.remaining_secs = 0;
        match cursor.cross(program) {
            Crossing::Next(next) => {
                cursor = next;
                crossings += 1;
            }
            Crossing::Finished => {
                return ResyncOutcome {
                    cursor,
                    crossings: crossings + 1,
                    finished_after_secs: Some(consumed),
                }
            }
        }
    }
}
