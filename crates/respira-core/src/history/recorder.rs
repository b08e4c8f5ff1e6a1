//! Append-only session history.
//!
//! Records are kept most-recent-first and the full list is rewritten to the
//! key-value store on every change.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SessionRecord;
use crate::storage::{load_json, save_json, KvStore, SESSION_HISTORY_KEY};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_breathing_secs: u64,
    pub today_sessions: u64,
}

pub struct SessionRecorder {
    store: Rc<dyn KvStore>,
    records: Vec<SessionRecord>,
}

impl SessionRecorder {
    /// Decode the persisted history. An undecodable list starts empty.
    pub fn load(store: Rc<dyn KvStore>) -> Self {
        let records = load_json(store.as_ref(), SESSION_HISTORY_KEY).unwrap_or_default();
        Self { store, records }
    }

    /// Most recent first.
    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn get(&self, id: Uuid) -> Option<&SessionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn add(&mut self, record: SessionRecord) {
        tracing::debug!(
            id = %record.id,
            program = %record.program_name,
            completed = record.completed_cycles,
            total = record.total_cycles,
            "recording session"
        );
        self.records.insert(0, record);
        self.persist();
    }

    /// Remove by id. Returns false if no such record exists.
    pub fn delete(&mut self, record: &SessionRecord) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != record.id);
        if self.records.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn stats(&self, now: DateTime<Utc>) -> HistoryStats {
        let today = now.date_naive();
        self.records
            .iter()
            .fold(HistoryStats::default(), |mut stats, record| {
                stats.total_sessions += 1;
                if record.is_complete() {
                    stats.completed_sessions += 1;
                }
                stats.total_breathing_secs += record.duration_secs();
                if record.end_time.date_naive() == today {
                    stats.today_sessions += 1;
                }
                stats
            })
    }

    fn persist(&self) {
        save_json(self.store.as_ref(), SESSION_HISTORY_KEY, &self.records);
    }
}
