use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::SessionRecord;
use crate::timer::Phase;

/// Every state change of the session timer produces an Event.
/// Commands return it directly; subscribers receive a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ProgramArmed {
        program_id: Uuid,
        program_name: String,
        at: DateTime<Utc>,
    },
    /// The armed program was removed; nothing can start until re-armed.
    ProgramDisarmed {
        program_id: Uuid,
        at: DateTime<Utc>,
    },
    TimerStarted {
        program_id: Uuid,
        phase: Phase,
        cycle: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        cycle: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        cycle: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: Phase,
        cycle: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// The last phase of the last cycle ran out.
    SessionCompleted {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    /// A running session was reset while partial recording is enabled.
    SessionAbandoned {
        record: SessionRecord,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// The post-completion display delay elapsed; back to Idle.
    TimerIdle {
        at: DateTime<Utc>,
    },
    /// Suspended time was folded back in on resume.
    Resynced {
        elapsed_secs: u64,
        crossings: u32,
        phase: Phase,
        cycle: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::ProgramArmed { at, .. }
            | Event::ProgramDisarmed { at, .. }
            | Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::PhaseChanged { at, .. }
            | Event::SessionCompleted { at, .. }
            | Event::SessionAbandoned { at, .. }
            | Event::TimerReset { at }
            | Event::TimerIdle { at }
            | Event::Resynced { at, .. } => *at,
        }
    }

    /// The session record carried by this event, if any.
    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            Event::SessionCompleted { record, .. } | Event::SessionAbandoned { record, .. } => {
                Some(record)
            }
            _ => None,
        }
    }
}

/// Fan-out of events to any number of subscribers.
///
/// Subscribers whose receiver has been dropped are pruned on the next
/// publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<Event> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: &Event) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
