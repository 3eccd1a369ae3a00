//! Studio - the application state container.
//!
//! Owns the project store, the history log, the editor buffer and the
//! transient UI state (chat input, error slot, in-flight generations). Every
//! mutation goes through a `ProjectStore` operation while holding the state
//! lock, and the affected parts are persisted before the lock is released so
//! writes land in mutation order.

use crate::editor::{DocumentCommit, DocumentSink, EditorBuffer};
use async_trait::async_trait;
use sitecraft_core::config::RootConfig;
use sitecraft_core::history::{HistoryItem, HistoryLog};
use sitecraft_core::project::{Project, ProjectPatch, ProjectStore};
use sitecraft_core::state::StateRepository;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Tunables taken from `config.toml`.
#[derive(Debug, Clone, Copy)]
pub struct StudioSettings {
    pub debounce: Duration,
    pub history_limit: usize,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self::from_config(&RootConfig::default())
    }
}

impl StudioSettings {
    pub fn from_config(config: &RootConfig) -> Self {
        Self {
            debounce: config.editor.debounce(),
            history_limit: config.history.limit,
        }
    }
}

/// Which actions the active project currently allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionAvailability {
    pub can_send: bool,
    pub can_regenerate: bool,
    pub can_download: bool,
    pub can_deploy: bool,
}

pub(crate) struct StudioState {
    pub(crate) projects: ProjectStore,
    pub(crate) history: HistoryLog,
    pub(crate) chat_input: String,
    pub(crate) error: Option<String>,
    /// Project ids with a generation in flight.
    pub(crate) loading: HashSet<String>,
}

struct StudioCore {
    state: Mutex<StudioState>,
    repository: Arc<dyn StateRepository>,
}

pub struct Studio {
    core: Arc<StudioCore>,
    editor: EditorBuffer,
}

impl Studio {
    /// Loads persisted state, falling back to a single fresh project.
    ///
    /// Load failures are logged and never surfaced: unreadable projects yield
    /// a fresh project, unreadable history yields an empty log.
    pub async fn restore(repository: Arc<dyn StateRepository>, settings: StudioSettings) -> Self {
        let projects = match repository.load_projects().await {
            Ok(Some(projects)) => projects,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to load projects, starting fresh: {}", e);
                Vec::new()
            }
        };

        let active_id = repository.load_active_project_id().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load active project id: {}", e);
            None
        });

        let history = match repository.load_history().await {
            Ok(items) => HistoryLog::restore(items, settings.history_limit),
            Err(e) => {
                tracing::warn!("Failed to load history, starting empty: {}", e);
                HistoryLog::with_limit(settings.history_limit)
            }
        };

        let mut store = ProjectStore::restore(projects, active_id.as_deref());
        let fresh = store.is_empty();
        if fresh {
            store.create_project();
        }
        tracing::info!(projects = store.len(), history = history.len(), "Studio restored");

        let core = Arc::new(StudioCore {
            state: Mutex::new(StudioState {
                projects: store,
                history,
                chat_input: String::new(),
                error: None,
                loading: HashSet::new(),
            }),
            repository,
        });
        let editor = EditorBuffer::new(core.clone(), settings.debounce);
        let studio = Self { core, editor };

        let state = studio.lock_state().await;
        if fresh {
            studio.persist_projects(&state).await;
        }
        studio.persist_active(&state).await;
        studio.sync_editor(&state);
        drop(state);

        studio
    }

    /// Creates a project, makes it active and clears the chat input.
    pub async fn new_project(&self) -> Project {
        let mut state = self.lock_state().await;
        let project = state.projects.create_project();
        state.chat_input.clear();
        tracing::info!(project_id = %project.id, name = %project.name, "Project created");

        self.persist_projects(&state).await;
        self.persist_active(&state).await;
        self.sync_editor(&state);
        project
    }

    /// Closes a project. Unknown ids are ignored and return `None`.
    pub async fn close_project(&self, id: &str) -> Option<Project> {
        let mut state = self.lock_state().await;
        let previous_active = state.projects.active_id().map(str::to_string);
        let removed = state.projects.close_project(id)?;
        tracing::info!(project_id = %id, "Project closed");

        self.persist_projects(&state).await;
        if state.projects.active_id() != previous_active.as_deref() {
            self.persist_active(&state).await;
            self.sync_editor(&state);
        }
        Some(removed)
    }

    /// Switches the active project. Unknown ids are ignored.
    pub async fn set_active(&self, id: &str) -> bool {
        let mut state = self.lock_state().await;
        if state.projects.active_id() == Some(id) {
            return true;
        }
        if !state.projects.set_active(id) {
            return false;
        }
        tracing::debug!(project_id = %id, "Active project changed");

        self.persist_active(&state).await;
        self.sync_editor(&state);
        true
    }

    /// Stores `name` verbatim; an empty name is allowed while the user types.
    pub async fn rename_project(&self, id: &str, name: &str) -> bool {
        let mut state = self.lock_state().await;
        if !state.projects.rename_project(id, name) {
            return false;
        }
        self.persist_projects(&state).await;
        true
    }

    pub async fn rename_active(&self, name: &str) -> bool {
        match self.active_project_id().await {
            Some(id) => self.rename_project(&id, name).await,
            None => false,
        }
    }

    /// Merges `patch` into a project. Missing projects are ignored.
    pub async fn update_project(&self, id: &str, patch: ProjectPatch) -> bool {
        let mut state = self.lock_state().await;
        let touches_document = patch.generated_code.is_some();
        if !state.projects.update_project(id, patch) {
            return false;
        }
        self.persist_projects(&state).await;
        if touches_document && state.projects.active_id() == Some(id) {
            self.sync_editor(&state);
        }
        true
    }

    /// Opens a history entry as a new project with its prompt pre-filled in
    /// the chat input. The prompt is not sent.
    pub async fn replay_history(&self, index: usize) -> Option<Project> {
        let mut state = self.lock_state().await;
        let prompt = state.history.get(index)?.prompt.clone();
        let project = state.projects.create_project();
        state.chat_input = prompt;
        tracing::info!(project_id = %project.id, "Replaying history entry {}", index);

        self.persist_projects(&state).await;
        self.persist_active(&state).await;
        self.sync_editor(&state);
        Some(project)
    }

    pub async fn chat_input(&self) -> String {
        self.lock_state().await.chat_input.clone()
    }

    pub async fn set_chat_input(&self, text: impl Into<String>) {
        self.lock_state().await.chat_input = text.into();
    }

    /// Projects in creation (tab) order.
    pub async fn projects(&self) -> Vec<Project> {
        self.lock_state().await.projects.snapshot()
    }

    pub async fn project(&self, id: &str) -> Option<Project> {
        self.lock_state().await.projects.get(id).cloned()
    }

    pub async fn active_project(&self) -> Option<Project> {
        self.lock_state().await.projects.active().cloned()
    }

    pub async fn active_project_id(&self) -> Option<String> {
        self.lock_state()
            .await
            .projects
            .active_id()
            .map(str::to_string)
    }

    /// History entries, newest first.
    pub async fn history(&self) -> Vec<HistoryItem> {
        self.lock_state().await.history.all().to_vec()
    }

    pub async fn error(&self) -> Option<String> {
        self.lock_state().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.lock_state().await.error = None;
    }

    pub async fn is_loading(&self, id: &str) -> bool {
        self.lock_state().await.loading.contains(id)
    }

    pub async fn available_actions(&self) -> ActionAvailability {
        let state = self.lock_state().await;
        let Some(project) = state.projects.active() else {
            return ActionAvailability::default();
        };
        let loading = state.loading.contains(&project.id);
        let has_buffer = !self.editor.content().is_empty();

        ActionAvailability {
            can_send: !loading,
            can_regenerate: !loading && project.first_user_message().is_some(),
            can_download: has_buffer,
            can_deploy: has_buffer,
        }
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    /// Applies a user edit to the active project's buffer.
    pub fn edit_document(&self, text: impl Into<String>) {
        self.editor.edit(text);
    }

    /// Commits any pending buffer edit right away.
    pub async fn flush_editor(&self) {
        self.editor.flush().await;
    }

    pub(crate) async fn lock_state(&self) -> MutexGuard<'_, StudioState> {
        self.core.state.lock().await
    }

    /// Stores a generated document and, when `id` is still active, loads it
    /// into the editor buffer.
    pub(crate) fn apply_document(&self, state: &mut StudioState, id: &str, document: String) -> bool {
        if !state.projects.update_project(id, ProjectPatch::document(document)) {
            tracing::debug!(project_id = %id, "Dropping document for a closed project");
            return false;
        }
        if state.projects.active_id() == Some(id) {
            self.sync_editor(state);
        }
        true
    }

    pub(crate) async fn persist_projects(&self, state: &StudioState) {
        self.core.persist_projects(state).await;
    }

    pub(crate) async fn persist_history(&self, state: &StudioState) {
        if let Err(e) = self
            .core
            .repository
            .save_history(state.history.all())
            .await
        {
            tracing::warn!("Failed to persist history: {}", e);
        }
    }

    async fn persist_active(&self, state: &StudioState) {
        let Some(id) = state.projects.active_id() else {
            return;
        };
        if let Err(e) = self.core.repository.save_active_project_id(id).await {
            tracing::warn!("Failed to persist active project id: {}", e);
        }
    }

    fn sync_editor(&self, state: &StudioState) {
        match state.projects.active() {
            Some(project) => self
                .editor
                .reset(Some(&project.id), &project.generated_code),
            None => self.editor.reset(None, ""),
        }
    }
}

impl StudioCore {
    async fn persist_projects(&self, state: &StudioState) {
        let projects = state.projects.snapshot();
        if let Err(e) = self.repository.save_projects(&projects).await {
            tracing::warn!("Failed to persist projects: {}", e);
        }
    }
}

#[async_trait]
impl DocumentSink for StudioCore {
    async fn commit_document(&self, commit: DocumentCommit) {
        let mut state = self.state.lock().await;
        // A reset while this commit waited for the lock means the store already
        // holds something newer, typically a generation result.
        if !commit.is_current() {
            tracing::debug!(project_id = %commit.project_id(), "Stale editor commit dropped");
            return;
        }
        let project_id = commit.project_id().to_string();
        let unchanged = match state.projects.get(&project_id) {
            Some(project) => project.generated_code == commit.document(),
            None => return,
        };
        commit.mark_synced();
        if unchanged {
            return;
        }
        state
            .projects
            .update_project(&project_id, ProjectPatch::document(commit.into_document()));
        tracing::debug!(project_id = %project_id, "Editor changes committed");
        self.persist_projects(&state).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecraft_core::state::KeyValueStore;
    use sitecraft_infrastructure::{KeyValueStateRepository, MemoryKeyValueStore};

    async fn studio_with(store: Arc<MemoryKeyValueStore>) -> Studio {
        let repository = Arc::new(KeyValueStateRepository::new(store));
        Studio::restore(repository, StudioSettings::default()).await
    }

    #[tokio::test]
    async fn test_restore_empty_creates_and_persists_fresh_project() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let studio = studio_with(store.clone()).await;

        let projects = studio.projects().await;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Project 1");
        assert!(store.contains_key("sitecraft_projects").await);
        assert_eq!(
            store.get("sitecraft_active_project_id").await.unwrap(),
            Some(projects[0].id.clone())
        );
    }

    #[tokio::test]
    async fn test_restore_corrupt_projects_falls_back_silently() {
        let store = Arc::new(MemoryKeyValueStore::with_entries([
            ("sitecraft_projects", "[[[not json"),
            ("sitecraft_history", "also not json"),
        ]));
        let studio = studio_with(store).await;

        assert_eq!(studio.projects().await.len(), 1);
        assert!(studio.history().await.is_empty());
        assert!(studio.error().await.is_none());
    }

    #[tokio::test]
    async fn test_restore_round_trip_keeps_active_and_buffer() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let first_id = {
            let studio = studio_with(store.clone()).await;
            let first = studio.active_project_id().await.unwrap();
            studio
                .update_project(&first, ProjectPatch::document("<p>one</p>"))
                .await;
            studio.new_project().await;
            studio.set_active(&first).await;
            first
        };

        let studio = studio_with(store).await;
        assert_eq!(studio.projects().await.len(), 2);
        assert_eq!(studio.active_project_id().await, Some(first_id));
        assert_eq!(studio.editor().content(), "<p>one</p>");
    }

    #[tokio::test]
    async fn test_new_project_clears_chat_input_and_resets_buffer() {
        let studio = studio_with(Arc::new(MemoryKeyValueStore::new())).await;
        let first = studio.active_project_id().await.unwrap();
        studio
            .update_project(&first, ProjectPatch::document("<p>first</p>"))
            .await;
        studio.set_chat_input("half typed").await;

        let second = studio.new_project().await;

        assert_eq!(studio.chat_input().await, "");
        assert_eq!(studio.active_project_id().await, Some(second.id.clone()));
        assert_eq!(studio.editor().content(), "");
        assert_eq!(studio.editor().project_id(), Some(second.id));
    }

    #[tokio::test]
    async fn test_close_active_switches_buffer_to_predecessor() {
        let studio = studio_with(Arc::new(MemoryKeyValueStore::new())).await;
        let first = studio.active_project_id().await.unwrap();
        studio
            .update_project(&first, ProjectPatch::document("<p>first</p>"))
            .await;
        let second = studio.new_project().await;

        studio.close_project(&second.id).await;

        assert_eq!(studio.active_project_id().await, Some(first));
        assert_eq!(studio.editor().content(), "<p>first</p>");
    }

    #[tokio::test]
    async fn test_close_last_project_persists_replacement() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let studio = studio_with(store.clone()).await;
        let only = studio.active_project_id().await.unwrap();

        studio.close_project(&only).await;

        let projects = studio.projects().await;
        assert_eq!(projects.len(), 1);
        assert_ne!(projects[0].id, only);
        let raw = store.get("sitecraft_projects").await.unwrap().unwrap();
        assert!(raw.contains(&projects[0].id));
        assert!(!raw.contains(&only));
    }

    #[tokio::test]
    async fn test_replay_history_prefills_without_sending() {
        let store = Arc::new(MemoryKeyValueStore::with_entries([(
            "sitecraft_history",
            r#"[{"id":"hist_1","name":"Project 1","prompt":"build a todo app","timestamp":1}]"#,
        )]));
        let studio = studio_with(store).await;
        let before = studio.projects().await.len();

        let project = studio.replay_history(0).await.unwrap();

        assert_eq!(studio.projects().await.len(), before + 1);
        assert_eq!(studio.active_project_id().await, Some(project.id.clone()));
        assert_eq!(studio.chat_input().await, "build a todo app");
        assert_eq!(project.chat_history.len(), 1);
        assert!(studio.replay_history(5).await.is_none());
    }

    #[tokio::test]
    async fn test_rename_and_unknown_ids_are_noops() {
        let studio = studio_with(Arc::new(MemoryKeyValueStore::new())).await;

        assert!(studio.rename_active("Landing page").await);
        assert_eq!(studio.active_project().await.unwrap().name, "Landing page");
        assert!(studio.rename_active("").await);
        assert_eq!(studio.active_project().await.unwrap().name, "");
        assert!(!studio.rename_project("proj_missing", "Ghost").await);
        assert!(!studio.set_active("proj_missing").await);
        assert!(studio.close_project("proj_missing").await.is_none());
        assert!(
            !studio
                .update_project("proj_missing", ProjectPatch::document("x"))
                .await
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_edit_is_committed_and_persisted() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let studio = studio_with(store.clone()).await;
        let id = studio.active_project_id().await.unwrap();

        studio.edit_document("<p>typed</p>");
        assert_eq!(studio.project(&id).await.unwrap().generated_code, "");

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(studio.project(&id).await.unwrap().generated_code, "<p>typed</p>");
        let raw = store.get("sitecraft_projects").await.unwrap().unwrap();
        assert!(raw.contains("<p>typed</p>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_discards_pending_edit() {
        let studio = studio_with(Arc::new(MemoryKeyValueStore::new())).await;
        let first = studio.active_project_id().await.unwrap();
        studio
            .update_project(&first, ProjectPatch::document("<p>kept</p>"))
            .await;
        let second = studio.new_project().await;
        studio.set_active(&first).await;

        studio.edit_document("<p>never saved</p>");
        studio.set_active(&second.id).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(studio.project(&first).await.unwrap().generated_code, "<p>kept</p>");
        assert_eq!(studio.editor().content(), "");
    }

    #[tokio::test]
    async fn test_available_actions_follow_buffer_and_transcript() {
        let studio = studio_with(Arc::new(MemoryKeyValueStore::new())).await;

        let actions = studio.available_actions().await;
        assert!(actions.can_send);
        assert!(!actions.can_regenerate);
        assert!(!actions.can_download);
        assert!(!actions.can_deploy);

        let id = studio.active_project_id().await.unwrap();
        studio
            .update_project(&id, ProjectPatch::document("<p>doc</p>"))
            .await;
        let actions = studio.available_actions().await;
        assert!(actions.can_download);
        assert!(actions.can_deploy);
    }
}
