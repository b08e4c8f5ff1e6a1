mod record;
mod recorder;

pub use record::SessionRecord;
pub use recorder::{HistoryStats, SessionRecorder};
