use serde::{Deserialize, Serialize};

use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Pause,
    Exhale,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Pause => "Pause",
            Phase::Exhale => "Exhale",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Position inside a session: which phase of which cycle, and how many
/// seconds of that phase are left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCursor {
    pub phase: Phase,
    /// 1-indexed.
    pub cycle: u32,
    pub remaining_secs: u32,
}

/// Result of crossing a phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Next(PhaseCursor),
    /// The last Exhale of the last cycle ran out.
    Finished,
}

impl PhaseCursor {
    /// Start of the first Inhale.
    pub fn start(program: &Program) -> Self {
        Self {
            phase: Phase::Inhale,
            cycle: 1,
            remaining_secs: program.inhale_seconds,
        }
    }

    /// Where the session goes after the current phase ends.
    ///
    /// Inhale -> (Pause iff pause > 0) -> Exhale, then the next cycle's
    /// Inhale, or `Finished` after the last cycle.
    pub fn cross(&self, program: &Program) -> Crossing {
        let next = |phase: Phase, cycle: u32| {
            Crossing::Next(Self {
                phase,
                cycle,
                remaining_secs: program.phase_duration(phase),
            })
        };
        match self.phase {
            Phase::Inhale if program.has_pause() => next(Phase::Pause, self.cycle),
            Phase::Inhale | Phase::Pause => next(Phase::Exhale, self.cycle),
            Phase::Exhale if self.cycle < program.cycle_count => next(Phase::Inhale, self.cycle + 1),
            Phase::Exhale => Crossing::Finished,
        }
    }

    /// Seconds of the session already breathed through.
    pub fn elapsed_secs(&self, program: &Program) -> u64 {
        let finished_cycles = u64::from(self.cycle.saturating_sub(1)) * program.cycle_duration();
        let earlier_phases: u64 = match self.phase {
            Phase::Inhale => 0,
            Phase::Pause => u64::from(program.inhale_seconds),
            Phase::Exhale => u64::from(program.inhale_seconds) + u64::from(program.pause_seconds),
        };
        let in_phase = program
            .phase_duration(self.phase)
            .saturating_sub(self.remaining_secs);
        finished_cycles + earlier_phases + u64::from(in_phase)
    }
}
