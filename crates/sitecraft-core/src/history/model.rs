use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prompt that produced a first-time generation, replayable into a new project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Unique identifier (`hist_<uuid>`)
    pub id: String,
    /// Name of the originating project at the time of recording
    pub name: String,
    pub prompt: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl HistoryItem {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: format!("hist_{}", Uuid::new_v4()),
            name: name.into(),
            prompt: prompt.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
