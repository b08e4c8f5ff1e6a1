use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::program::Program;

/// Persisted summary of one session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    pub program_name: String,
    /// Denormalized copy of [`Program::phase_description`] at record time.
    pub program_phase_description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub completed_cycles: u32,
    pub total_cycles: u32,
}

impl SessionRecord {
    /// `completed_cycles` is clamped to the program's cycle count.
    pub fn new(
        program: &Program,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        completed_cycles: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            program_name: program.name.clone(),
            program_phase_description: program.phase_description(),
            start_time,
            end_time,
            completed_cycles: completed_cycles.min(program.cycle_count),
            total_cycles: program.cycle_count,
        }
    }

    /// True when every cycle was breathed through.
    pub fn is_complete(&self) -> bool {
        self.completed_cycles == self.total_cycles
    }

    pub fn duration_secs(&self) -> u64 {
        u64::try_from((self.end_time - self.start_time).num_seconds()).unwrap_or(0)
    }
}
