//! In-memory project collection with an active-project pointer.

use super::message::ChatMessage;
use super::model::{Project, ProjectPatch};
use std::collections::HashMap;
use uuid::Uuid;

/// Greeting seeded into every new project's transcript.
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm Sitecraft. What kind of website would you like to build today?";

/// The set of open projects plus the active selection.
///
/// `ProjectStore` is the single writer for project state: every mutation of a
/// project goes through one of its operations so the following hold:
///
/// - ids are unique and never reused for the lifetime of the store
/// - once a project has existed, the store is never left empty
/// - whenever the store is non-empty, exactly one project is active
///
/// None of the operations fail. Unknown ids are silently ignored, which keeps
/// late updates (e.g. a generation finishing after its project was closed)
/// harmless.
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    projects: HashMap<String, Project>,
    active_id: Option<String>,
    /// Last handed-out creation timestamp; keeps creation order strict.
    last_created_at: i64,
}

impl ProjectStore {
    /// Creates an empty store with no active project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted projects.
    ///
    /// The persisted active id is honoured when it names one of the restored
    /// projects; otherwise the oldest project becomes active. An empty input
    /// yields a store that gets its first project from `create_project`.
    pub fn restore(projects: impl IntoIterator<Item = Project>, active_id: Option<&str>) -> Self {
        let mut store = Self::new();
        for project in projects {
            store.last_created_at = store.last_created_at.max(project.created_at);
            store.projects.insert(project.id.clone(), project);
        }

        store.active_id = match active_id {
            Some(id) if store.projects.contains_key(id) => Some(id.to_string()),
            _ => store.list_sorted_by_creation().first().map(|p| p.id.clone()),
        };
        store
    }

    /// Creates a new project, inserts it, and makes it active.
    ///
    /// The display name is numbered by the current project count, so closing
    /// projects can lead to repeated names; ids stay unique regardless.
    pub fn create_project(&mut self) -> Project {
        let project = Project {
            id: format!("proj_{}", Uuid::new_v4()),
            name: format!("Project {}", self.projects.len() + 1),
            chat_history: vec![ChatMessage::system(WELCOME_MESSAGE)],
            generated_code: String::new(),
            created_at: self.next_created_at(),
        };

        self.projects.insert(project.id.clone(), project.clone());
        self.active_id = Some(project.id.clone());
        project
    }

    /// Removes a project and repairs the active selection.
    ///
    /// When the removed project was active, its predecessor in creation order
    /// becomes active, or the first remaining project if it was the oldest.
    /// Removing the last project immediately creates a fresh one.
    ///
    /// Returns the removed project, or `None` if the id was unknown.
    pub fn close_project(&mut self, id: &str) -> Option<Project> {
        let position = self
            .list_sorted_by_creation()
            .iter()
            .position(|p| p.id == id)?;
        let removed = self.projects.remove(id)?;

        if self.active_id.as_deref() == Some(id) {
            let remaining = self.list_sorted_by_creation();
            if remaining.is_empty() {
                self.active_id = None;
                self.create_project();
            } else {
                let index = position.saturating_sub(1).min(remaining.len() - 1);
                self.active_id = Some(remaining[index].id.clone());
            }
        }

        Some(removed)
    }

    /// Merges `patch` into the project with `id`.
    ///
    /// Returns `false` (and changes nothing) when the project does not exist.
    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> bool {
        match self.projects.get_mut(id) {
            Some(project) => {
                project.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Renames a project. Same no-op semantics as `update_project`.
    pub fn rename_project(&mut self, id: &str, name: impl Into<String>) -> bool {
        self.update_project(id, ProjectPatch::name(name))
    }

    /// Appends a message to a project's transcript.
    pub fn append_message(&mut self, id: &str, message: ChatMessage) -> bool {
        match self.projects.get_mut(id) {
            Some(project) => {
                project.chat_history.push(message);
                true
            }
            None => false,
        }
    }

    /// Points the active selection at `id`. Unknown ids are ignored.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.projects.contains_key(id) {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Projects in ascending creation order (tab display order).
    pub fn list_sorted_by_creation(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        projects
    }

    /// Owned copy of all projects in creation order.
    pub fn snapshot(&self) -> Vec<Project> {
        self.list_sorted_by_creation().into_iter().cloned().collect()
    }

    pub fn active(&self) -> Option<&Project> {
        self.active_id.as_deref().and_then(|id| self.projects.get(id))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.projects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    fn next_created_at(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_created_at = now.max(self.last_created_at + 1);
        self.last_created_at
    }
}
