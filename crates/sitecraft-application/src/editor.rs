//! Editor buffer with debounced write-back.
//!
//! The buffer holds the text the user sees for the active project. Edits are
//! written back to the project store only after a quiet period; any further
//! edit rearms the timer, so a burst of keystrokes produces one commit.
//!
//! ```text
//! Idle ──edit (differs)──▶ DirtyPending ──timer──▶ Idle (commit)
//!   ▲                        │  │
//!   └─edit (== synced)───────┘  └─edit──▶ DirtyPending (rearmed)
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Receives debounced document commits.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Stores the commit's document as the project's current document.
    ///
    /// Implementations must check [`DocumentCommit::is_current`] under the
    /// same lock that guards their store, skip the write when the stored value
    /// is already equal, and call [`DocumentCommit::mark_synced`] after writing.
    async fn commit_document(&self, commit: DocumentCommit);
}

/// A buffer snapshot on its way to the store.
///
/// The snapshot goes stale as soon as the buffer is reset or edited again; a
/// stale commit must not be written, since the store may already hold a newer
/// document (e.g. a generation result).
pub struct DocumentCommit {
    project_id: String,
    document: String,
    generation: u64,
    editor: Weak<EditorInner>,
}

impl DocumentCommit {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn into_document(self) -> String {
        self.document
    }

    /// Whether the buffer is unchanged since this snapshot was taken.
    pub fn is_current(&self) -> bool {
        match self.editor.upgrade() {
            Some(inner) => {
                let state = inner.lock_state();
                state.generation == self.generation
            }
            None => false,
        }
    }

    /// Records that the store now holds this document.
    pub fn mark_synced(&self) {
        if let Some(inner) = self.editor.upgrade() {
            let mut state = inner.lock_state();
            if state.project_id.as_deref() == Some(self.project_id.as_str()) {
                state.synced = self.document.clone();
            }
        }
    }
}

pub struct EditorBuffer {
    inner: Arc<EditorInner>,
}

struct EditorInner {
    sink: Arc<dyn DocumentSink>,
    debounce: Duration,
    content: watch::Sender<String>,
    state: Mutex<EditorState>,
}

#[derive(Default)]
struct EditorState {
    project_id: Option<String>,
    /// Last value known to match the store.
    synced: String,
    /// Bumped whenever a pending timer is invalidated.
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl EditorState {
    fn cancel_pending(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl EditorBuffer {
    pub fn new(sink: Arc<dyn DocumentSink>, debounce: Duration) -> Self {
        let (content, _) = watch::channel(String::new());
        Self {
            inner: Arc::new(EditorInner {
                sink,
                debounce,
                content,
                state: Mutex::new(EditorState::default()),
            }),
        }
    }

    /// Points the buffer at a project and replaces its content, discarding any
    /// pending write-back.
    pub fn reset(&self, project_id: Option<&str>, document: &str) {
        let mut state = self.inner.lock_state();
        state.cancel_pending();
        state.project_id = project_id.map(str::to_string);
        state.synced = document.to_string();
        self.inner.content.send_replace(document.to_string());
        tracing::debug!(project_id = ?state.project_id, "Editor buffer reset");
    }

    /// Replaces the buffer content as the user would by typing.
    ///
    /// Must be called from within a tokio runtime: a diverging edit spawns the
    /// write-back timer.
    pub fn edit(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.inner.lock_state();
        state.cancel_pending();
        let dirty = text != state.synced;
        self.inner.content.send_replace(text);

        if !dirty || state.project_id.is_none() {
            return;
        }

        let generation = state.generation;
        let debounce = self.inner.debounce;
        let weak: Weak<EditorInner> = Arc::downgrade(&self.inner);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(inner) = weak.upgrade() {
                EditorInner::fire(inner, generation).await;
            }
        }));
    }

    /// Commits a pending edit immediately instead of waiting for the timer.
    pub async fn flush(&self) {
        let commit = {
            let mut state = self.inner.lock_state();
            if state.pending.is_none() {
                None
            } else {
                state.cancel_pending();
                self.inner.take_commit(&state)
            }
        };
        if let Some(commit) = commit {
            self.inner.sink.commit_document(commit).await;
        }
    }

    pub fn content(&self) -> String {
        self.inner.content.borrow().clone()
    }

    /// Observes every content change (edits and resets).
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.inner.content.subscribe()
    }

    pub fn project_id(&self) -> Option<String> {
        self.inner.lock_state().project_id.clone()
    }

    /// Whether a write-back is pending.
    pub fn is_dirty(&self) -> bool {
        self.inner.lock_state().pending.is_some()
    }
}

impl EditorInner {
    fn lock_state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshots the buffer; `state.synced` moves only once the sink has written.
    fn take_commit(self: &Arc<Self>, state: &EditorState) -> Option<DocumentCommit> {
        let project_id = state.project_id.clone()?;
        Some(DocumentCommit {
            project_id,
            document: self.content.borrow().clone(),
            generation: state.generation,
            editor: Arc::downgrade(self),
        })
    }

    async fn fire(self: Arc<Self>, generation: u64) {
        let commit = {
            let mut state = self.lock_state();
            if state.generation != generation {
                return;
            }
            state.pending = None;
            self.take_commit(&state)
        };
        if let Some(commit) = commit {
            tracing::debug!(project_id = %commit.project_id, bytes = commit.document.len(), "Debounced commit");
            self.sink.commit_document(commit).await;
        }
    }
}

impl Drop for EditorInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct RecordingSink {
        commits: AsyncMutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DocumentSink for RecordingSink {
        async fn commit_document(&self, commit: DocumentCommit) {
            if !commit.is_current() {
                return;
            }
            commit.mark_synced();
            let project_id = commit.project_id().to_string();
            self.commits
                .lock()
                .await
                .push((project_id, commit.into_document()));
        }
    }

    fn buffer() -> (Arc<RecordingSink>, EditorBuffer) {
        let sink = Arc::new(RecordingSink::default());
        let buffer = EditorBuffer::new(sink.clone(), Duration::from_millis(500));
        buffer.reset(Some("proj_a"), "<p>a</p>");
        (sink, buffer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_commits_once_with_final_value() {
        let (sink, buffer) = buffer();

        for i in 0..10 {
            buffer.edit(format!("<p>edit {i}</p>"));
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        assert!(sink.commits.lock().await.is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;

        let commits = sink.commits.lock().await;
        assert_eq!(
            *commits,
            vec![("proj_a".to_string(), "<p>edit 9</p>".to_string())]
        );
        assert!(!buffer.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_back_to_synced_cancels_timer() {
        let (sink, buffer) = buffer();

        buffer.edit("<p>changed</p>");
        assert!(buffer.is_dirty());
        buffer.edit("<p>a</p>");
        assert!(!buffer.is_dirty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sink.commits.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_pending_commit() {
        let (sink, buffer) = buffer();

        buffer.edit("<p>unsaved</p>");
        buffer.reset(Some("proj_b"), "<p>b</p>");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sink.commits.lock().await.is_empty());
        assert_eq!(buffer.content(), "<p>b</p>");
        assert_eq!(buffer.project_id().as_deref(), Some("proj_b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_commits_immediately() {
        let (sink, buffer) = buffer();

        buffer.edit("<p>now</p>");
        buffer.flush().await;

        assert_eq!(sink.commits.lock().await.len(), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sink.commits.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_commit() {
        let (sink, buffer) = buffer();

        buffer.edit("<p>lost</p>");
        drop(buffer);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(sink.commits.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_every_change() {
        let (_sink, buffer) = buffer();
        let mut rx = buffer.subscribe();

        buffer.edit("<p>x</p>");
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "<p>x</p>");
    }

    /// Holds every commit until released, like a store whose lock is busy.
    struct GatedSink {
        gate: tokio::sync::Notify,
        inner: RecordingSink,
    }

    #[async_trait]
    impl DocumentSink for GatedSink {
        async fn commit_document(&self, commit: DocumentCommit) {
            self.gate.notified().await;
            self.inner.commit_document(commit).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_invalidates_commit_waiting_on_sink() {
        let sink = Arc::new(GatedSink {
            gate: tokio::sync::Notify::new(),
            inner: RecordingSink::default(),
        });
        let buffer = EditorBuffer::new(sink.clone(), Duration::from_millis(500));
        buffer.reset(Some("proj_a"), "<p>a</p>");

        buffer.edit("<p>draft</p>");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!buffer.is_dirty(), "timer should have fired and be waiting on the sink");

        buffer.reset(Some("proj_a"), "<p>generated</p>");
        sink.gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(sink.inner.commits.lock().await.is_empty());
        assert_eq!(buffer.content(), "<p>generated</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_matching_uncommitted_snapshot_is_still_dirty() {
        let sink = Arc::new(GatedSink {
            gate: tokio::sync::Notify::new(),
            inner: RecordingSink::default(),
        });
        let buffer = EditorBuffer::new(sink.clone(), Duration::from_millis(500));
        buffer.reset(Some("proj_a"), "<p>a</p>");

        buffer.edit("<p>draft</p>");
        tokio::time::sleep(Duration::from_millis(600)).await;
        // A newer edit makes the waiting snapshot stale; the store still holds
        // the original, so typing the draft again must schedule a commit.
        buffer.edit("<p>other</p>");
        buffer.edit("<p>draft</p>");
        assert!(buffer.is_dirty());

        sink.gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sink.inner.commits.lock().await.is_empty());

        sink.gate.notify_one();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            *sink.inner.commits.lock().await,
            vec![("proj_a".to_string(), "<p>draft</p>".to_string())]
        );
    }
}
