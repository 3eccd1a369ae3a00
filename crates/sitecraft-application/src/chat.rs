//! Chat use case: turns prompts into generated documents.

use crate::studio::Studio;
use sitecraft_core::generation::GenerationClient;
use sitecraft_core::project::ChatMessage;
use std::sync::Arc;

pub const SUCCESS_MESSAGE: &str = "Website updated successfully.";
pub const NO_PROMPT_TO_REGENERATE: &str = "No initial prompt to regenerate from.";

/// Characters of the first prompt quoted in the regeneration notice.
const REGENERATE_EXCERPT_CHARS: usize = 40;

/// What a chat operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Empty prompt or no active project; nothing changed.
    Ignored,
    /// A generation for the project is already in flight; nothing changed.
    Busy,
    /// The project received a new document.
    Updated,
    /// Generation failed with this message; the document is unchanged.
    Failed(String),
    /// Regeneration was requested but the project has no user prompt.
    NothingToRegenerate,
}

/// Orchestrates generation and refinement for the active project.
///
/// At most one operation runs per project; others are rejected with
/// [`ChatOutcome::Busy`]. Different projects generate concurrently.
pub struct ChatUseCase {
    studio: Arc<Studio>,
    client: Arc<dyn GenerationClient>,
}

impl ChatUseCase {
    pub fn new(studio: Arc<Studio>, client: Arc<dyn GenerationClient>) -> Self {
        Self { studio, client }
    }

    /// Sends whatever is in the studio's chat input.
    pub async fn send_chat_input(&self) -> ChatOutcome {
        let prompt = self.studio.chat_input().await;
        self.send_message(&prompt).await
    }

    /// Sends a prompt for the active project.
    ///
    /// An empty document is generated from scratch (and the prompt recorded in
    /// history); otherwise the current document is refined.
    pub async fn send_message(&self, prompt: &str) -> ChatOutcome {
        match self.studio.active_project_id().await {
            Some(project_id) => self.send_message_to(&project_id, prompt).await,
            None => ChatOutcome::Ignored,
        }
    }

    /// Like [`Self::send_message`] but for a specific project, which need not
    /// be active by the time the call runs. Unknown ids are ignored.
    pub async fn send_message_to(&self, project_id: &str, prompt: &str) -> ChatOutcome {
        if prompt.trim().is_empty() {
            return ChatOutcome::Ignored;
        }
        // Pending buffer edits belong to the document being refined.
        self.studio.flush_editor().await;

        let (project_id, project_name, document) = {
            let mut state = self.studio.lock_state().await;
            let Some(project) = state.projects.get(project_id) else {
                return ChatOutcome::Ignored;
            };
            let project_id = project.id.clone();
            let project_name = project.name.clone();
            let document = project.generated_code.clone();
            let is_active = state.projects.active_id() == Some(project_id.as_str());

            if state.loading.contains(&project_id) {
                tracing::debug!(project_id = %project_id, "Generation already in flight");
                return ChatOutcome::Busy;
            }

            state
                .projects
                .append_message(&project_id, ChatMessage::user(prompt));
            if is_active {
                state.chat_input.clear();
            }
            state.error = None;
            state.loading.insert(project_id.clone());
            self.studio.persist_projects(&state).await;

            (project_id, project_name, document)
        };

        let is_first_generation = document.is_empty();
        tracing::info!(
            project_id = %project_id,
            mode = if is_first_generation { "generate" } else { "refine" },
            "Generation started"
        );
        let result = if is_first_generation {
            self.client.generate(prompt).await
        } else {
            self.client.refine(&document, prompt).await
        };

        let mut state = self.studio.lock_state().await;
        state.loading.remove(&project_id);

        let outcome = match result {
            Ok(new_document) => {
                if is_first_generation {
                    state.history.record(prompt, project_name);
                    self.studio.persist_history(&state).await;
                }
                self.studio
                    .apply_document(&mut state, &project_id, new_document);
                state
                    .projects
                    .append_message(&project_id, ChatMessage::system(SUCCESS_MESSAGE));
                tracing::info!(project_id = %project_id, "Generation succeeded");
                ChatOutcome::Updated
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(project_id = %project_id, retryable = e.is_retryable(), "Generation failed: {}", message);
                state.error = Some(message.clone());
                state
                    .projects
                    .append_message(&project_id, ChatMessage::system(format!("Error: {message}")));
                ChatOutcome::Failed(message)
            }
        };
        self.studio.persist_projects(&state).await;
        outcome
    }

    /// Regenerates the active project from its first user prompt, ignoring
    /// later refinements. Does not touch history.
    pub async fn regenerate(&self) -> ChatOutcome {
        match self.studio.active_project_id().await {
            Some(project_id) => self.regenerate_project(&project_id).await,
            None => ChatOutcome::Ignored,
        }
    }

    /// Regenerates a specific project. Unknown ids are ignored.
    pub async fn regenerate_project(&self, project_id: &str) -> ChatOutcome {
        let (project_id, prompt) = {
            let mut state = self.studio.lock_state().await;
            let Some(project) = state.projects.get(project_id) else {
                return ChatOutcome::Ignored;
            };
            let project_id = project.id.clone();
            let first_prompt = project.first_user_message().map(|m| m.text.clone());

            if state.loading.contains(&project_id) {
                return ChatOutcome::Busy;
            }
            let Some(prompt) = first_prompt else {
                state.error = Some(NO_PROMPT_TO_REGENERATE.to_string());
                return ChatOutcome::NothingToRegenerate;
            };

            let excerpt: String = prompt.chars().take(REGENERATE_EXCERPT_CHARS).collect();
            state.projects.append_message(
                &project_id,
                ChatMessage::system(format!("Regenerating from: \"{excerpt}...\"")),
            );
            state.error = None;
            state.loading.insert(project_id.clone());
            self.studio.persist_projects(&state).await;

            (project_id, prompt)
        };

        tracing::info!(project_id = %project_id, "Regeneration started");
        let result = self.client.generate(&prompt).await;

        let mut state = self.studio.lock_state().await;
        state.loading.remove(&project_id);
        match result {
            Ok(document) => {
                if self.studio.apply_document(&mut state, &project_id, document) {
                    self.studio.persist_projects(&state).await;
                }
                ChatOutcome::Updated
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(project_id = %project_id, "Regeneration failed: {}", message);
                state.error = Some(message.clone());
                ChatOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::StudioSettings;
    use async_trait::async_trait;
    use sitecraft_core::generation::GenerationError;
    use sitecraft_core::project::{MessageRole, ProjectPatch};
    use sitecraft_core::state::{KeyValueStore, StateKey};
    use sitecraft_infrastructure::{KeyValueStateRepository, MemoryKeyValueStore};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Generate(String),
        Refine(String, String),
    }

    /// Replays scripted results and records every call.
    #[derive(Default)]
    struct ScriptedClient {
        results: Mutex<VecDeque<Result<String, GenerationError>>>,
        calls: Mutex<Vec<Call>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedClient {
        fn new(results: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn next(&self, call: Call) -> Result<String, GenerationError> {
            self.calls.lock().unwrap().push(call);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("<p>default</p>".to_string()))
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.next(Call::Generate(prompt.to_string())).await
        }

        async fn refine(&self, document: &str, prompt: &str) -> Result<String, GenerationError> {
            self.next(Call::Refine(document.to_string(), prompt.to_string()))
                .await
        }
    }

    async fn setup(client: ScriptedClient) -> (Arc<Studio>, Arc<ScriptedClient>, ChatUseCase) {
        let repository = Arc::new(KeyValueStateRepository::new(Arc::new(
            MemoryKeyValueStore::new(),
        )));
        let studio = Arc::new(Studio::restore(repository, StudioSettings::default()).await);
        let client = Arc::new(client);
        let chat = ChatUseCase::new(studio.clone(), client.clone());
        (studio, client, chat)
    }

    fn http_error() -> GenerationError {
        GenerationError::Http {
            status: 500,
            message: "INTERNAL: boom".into(),
            retryable: true,
        }
    }

    #[tokio::test]
    async fn test_empty_prompt_is_ignored() {
        let (studio, client, chat) = setup(ScriptedClient::default()).await;

        assert_eq!(chat.send_message("   \n").await, ChatOutcome::Ignored);

        assert!(client.calls().is_empty());
        assert_eq!(studio.active_project().await.unwrap().chat_history.len(), 1);
    }

    #[tokio::test]
    async fn test_first_send_generates_and_records_history() {
        let (studio, client, chat) =
            setup(ScriptedClient::new(vec![Ok("<h1>Todo</h1>".into())])).await;
        studio.set_chat_input("build a todo app").await;

        assert_eq!(chat.send_chat_input().await, ChatOutcome::Updated);

        assert_eq!(client.calls(), vec![Call::Generate("build a todo app".into())]);
        let project = studio.active_project().await.unwrap();
        assert_eq!(project.generated_code, "<h1>Todo</h1>");
        assert_eq!(studio.editor().content(), "<h1>Todo</h1>");
        assert_eq!(studio.chat_input().await, "");
        let texts: Vec<&str> = project.chat_history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts[1..], ["build a todo app", SUCCESS_MESSAGE]);

        let history = studio.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prompt, "build a todo app");
        assert_eq!(history[0].name, "Project 1");
    }

    #[tokio::test]
    async fn test_failure_keeps_document_and_reports_once() {
        let (studio, _client, chat) = setup(ScriptedClient::new(vec![Err(http_error())])).await;
        let id = studio.active_project_id().await.unwrap();
        studio
            .update_project(&id, ProjectPatch::document("<p>old</p>"))
            .await;

        let outcome = chat.send_message("make it blue").await;

        assert_eq!(outcome, ChatOutcome::Failed("INTERNAL: boom (HTTP 500)".into()));
        let project = studio.active_project().await.unwrap();
        assert_eq!(project.generated_code, "<p>old</p>");
        assert_eq!(studio.editor().content(), "<p>old</p>");
        let system_errors: Vec<&str> = project
            .chat_history
            .iter()
            .filter(|m| m.role == MessageRole::System && m.text.starts_with("Error: "))
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(system_errors, vec!["Error: INTERNAL: boom (HTTP 500)"]);
        assert_eq!(studio.error().await.as_deref(), Some("INTERNAL: boom (HTTP 500)"));
        assert!(!studio.is_loading(&id).await);
        assert!(studio.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_next_attempt_clears_error_slot() {
        let (studio, _client, chat) =
            setup(ScriptedClient::new(vec![Err(http_error()), Ok("<p>ok</p>".into())])).await;

        chat.send_message("first").await;
        assert!(studio.error().await.is_some());

        assert_eq!(chat.send_message("second").await, ChatOutcome::Updated);
        assert!(studio.error().await.is_none());
    }

    #[tokio::test]
    async fn test_regenerate_uses_first_prompt_without_history() {
        let (studio, client, chat) = setup(ScriptedClient::new(vec![
            Ok("<p>v1</p>".into()),
            Ok("<p>v2</p>".into()),
            Ok("<p>fresh</p>".into()),
        ]))
        .await;
        chat.send_message("build a calculator").await;
        chat.send_message("add a dark theme").await;

        assert_eq!(chat.regenerate().await, ChatOutcome::Updated);

        let calls = client.calls();
        assert_eq!(calls[2], Call::Generate("build a calculator".into()));
        assert_eq!(studio.history().await.len(), 1);
        let project = studio.active_project().await.unwrap();
        assert_eq!(project.generated_code, "<p>fresh</p>");
        assert_eq!(
            project.chat_history.last().map(|m| m.text.as_str()),
            Some("Regenerating from: \"build a calculator...\"")
        );
    }

    #[tokio::test]
    async fn test_regenerate_without_prompt_sets_error() {
        let (studio, client, chat) = setup(ScriptedClient::default()).await;

        assert_eq!(chat.regenerate().await, ChatOutcome::NothingToRegenerate);

        assert!(client.calls().is_empty());
        assert_eq!(studio.error().await.as_deref(), Some(NO_PROMPT_TO_REGENERATE));
    }

    #[tokio::test]
    async fn test_regenerate_excerpt_is_truncated() {
        let (studio, _client, chat) = setup(ScriptedClient::default()).await;
        let long = "a".repeat(60);
        chat.send_message(&long).await;

        chat.regenerate().await;

        let project = studio.active_project().await.unwrap();
        let notice = &project.chat_history[project.chat_history.len() - 1].text;
        assert_eq!(notice, &format!("Regenerating from: \"{}...\"", "a".repeat(40)));
    }

    #[tokio::test]
    async fn test_concurrent_send_on_same_project_is_busy() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient {
            gate: Some(gate.clone()),
            ..ScriptedClient::new(vec![Ok("<p>done</p>".into())])
        };
        let (studio, client, chat) = setup(client).await;
        let chat = Arc::new(chat);
        let id = studio.active_project_id().await.unwrap();

        let first = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send_message("first").await }
        });
        while client.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(studio.is_loading(&id).await);
        assert!(!studio.available_actions().await.can_send);

        assert_eq!(chat.send_message("second").await, ChatOutcome::Busy);
        assert_eq!(chat.regenerate().await, ChatOutcome::Busy);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), ChatOutcome::Updated);
        assert_eq!(client.calls().len(), 1);
        assert!(!studio.is_loading(&id).await);
    }

    #[tokio::test]
    async fn test_result_for_background_project_leaves_buffer_alone() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient {
            gate: Some(gate.clone()),
            ..ScriptedClient::new(vec![Ok("<p>background</p>".into())])
        };
        let (studio, client, chat) = setup(client).await;
        let chat = Arc::new(chat);
        let first = studio.active_project_id().await.unwrap();

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send_message("build it").await }
        });
        while client.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        studio.new_project().await;
        gate.notify_one();
        pending.await.unwrap();

        assert_eq!(studio.project(&first).await.unwrap().generated_code, "<p>background</p>");
        assert_eq!(studio.editor().content(), "");
    }

    #[tokio::test]
    async fn test_targeted_send_stays_on_its_project_after_switch() {
        let (studio, client, chat) = setup(ScriptedClient::new(vec![
            Ok("<p>first</p>".into()),
            Ok("<p>again</p>".into()),
        ]))
        .await;
        let first = studio.active_project_id().await.unwrap();
        let second = studio.new_project().await.id;
        studio.set_chat_input("half typed").await;

        assert_eq!(chat.send_message_to(&first, "build it").await, ChatOutcome::Updated);
        assert_eq!(chat.regenerate_project(&first).await, ChatOutcome::Updated);

        assert_eq!(client.calls().len(), 2);
        assert_eq!(studio.project(&first).await.unwrap().generated_code, "<p>again</p>");
        assert_eq!(studio.project(&second).await.unwrap().generated_code, "");
        assert_eq!(studio.active_project_id().await.as_deref(), Some(second.as_str()));
        assert_eq!(studio.chat_input().await, "half typed");
        assert_eq!(
            chat.send_message_to("proj_missing", "hello").await,
            ChatOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_result_for_closed_project_is_dropped() {
        let gate = Arc::new(Notify::new());
        let client = ScriptedClient {
            gate: Some(gate.clone()),
            ..ScriptedClient::new(vec![Ok("<p>late</p>".into())])
        };
        let (studio, client, chat) = setup(client).await;
        let chat = Arc::new(chat);
        let first = studio.active_project_id().await.unwrap();
        studio.new_project().await;
        studio.set_active(&first).await;

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send_message("build it").await }
        });
        while client.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        studio.close_project(&first).await;
        gate.notify_one();
        pending.await.unwrap();

        assert!(studio.project(&first).await.is_none());
        assert_eq!(studio.projects().await.len(), 1);
    }

    /// Delays history writes so a generation holds the studio lock for a while.
    #[derive(Default)]
    struct SlowHistoryStore {
        inner: MemoryKeyValueStore,
    }

    #[async_trait]
    impl KeyValueStore for SlowHistoryStore {
        async fn get(&self, key: &str) -> sitecraft_core::error::Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> sitecraft_core::error::Result<()> {
            if key == StateKey::History.as_str() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> sitecraft_core::error::Result<()> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_draft_does_not_overwrite_generation_result() {
        let repository = Arc::new(KeyValueStateRepository::new(Arc::new(
            SlowHistoryStore::default(),
        )));
        let studio = Arc::new(Studio::restore(repository, StudioSettings::default()).await);
        let gate = Arc::new(Notify::new());
        let client = Arc::new(ScriptedClient {
            gate: Some(gate.clone()),
            ..ScriptedClient::new(vec![Ok("<p>generated</p>".into())])
        });
        let chat = Arc::new(ChatUseCase::new(studio.clone(), client.clone()));

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send_message("a landing page").await }
        });
        while client.calls().is_empty() {
            tokio::task::yield_now().await;
        }

        // The debounce timer fires while the result is being persisted.
        studio.edit_document("<p>draft</p>");
        tokio::time::sleep(Duration::from_millis(450)).await;
        gate.notify_one();
        assert_eq!(pending.await.unwrap(), ChatOutcome::Updated);
        tokio::time::sleep(Duration::from_secs(1)).await;

        let stored = studio.active_project().await.unwrap().generated_code;
        assert_eq!(stored, "<p>generated</p>");
        assert_eq!(studio.editor().content(), stored);
        assert!(!studio.editor().is_dirty());
    }
}
