//! Persisted state keys.

/// The three independent blobs that make up persisted application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// JSON object of projects keyed by id. Absent means "no projects ever created".
    Projects,
    /// Raw id of the active project.
    ActiveProjectId,
    /// JSON array of history items, newest first.
    History,
}

impl StateKey {
    pub const ALL: [StateKey; 3] = [StateKey::Projects, StateKey::ActiveProjectId, StateKey::History];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Projects => "sitecraft_projects",
            StateKey::ActiveProjectId => "sitecraft_active_project_id",
            StateKey::History => "sitecraft_history",
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
