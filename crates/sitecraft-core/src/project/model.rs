//! Project domain model.
//!
//! A project is one website-generation session: its chat transcript and the
//! current generated document.

use super::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// One user-managed website-generation session.
///
/// Field names are serialized in camelCase so persisted collections stay
/// readable by the browser client that shares the same key/value layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project identifier (`proj_<uuid>`), immutable once created
    pub id: String,
    /// User-editable display name
    pub name: String,
    /// Ordered, append-only chat transcript
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    /// Current generated HTML document (may be empty)
    #[serde(default)]
    pub generated_code: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
}

impl Project {
    /// Whether the project has any document content.
    ///
    /// Download, deploy and regenerate-from-document are only available when
    /// this returns `true`.
    pub fn has_document(&self) -> bool {
        !self.generated_code.is_empty()
    }

    /// Returns the first message the user sent in this project, if any.
    pub fn first_user_message(&self) -> Option<&ChatMessage> {
        self.chat_history.iter().find(|m| m.is_user())
    }

    /// Applies a partial update.
    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(chat_history) = patch.chat_history {
            self.chat_history = chat_history;
        }
        if let Some(generated_code) = patch.generated_code {
            self.generated_code = generated_code;
        }
    }
}

/// Partial fields merged into an existing project by `ProjectStore::update_project`.
///
/// `id` and `created_at` are deliberately absent: they never change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub chat_history: Option<Vec<ChatMessage>>,
    pub generated_code: Option<String>,
}

impl ProjectPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn document(generated_code: impl Into<String>) -> Self {
        Self {
            generated_code: Some(generated_code.into()),
            ..Self::default()
        }
    }

    pub fn chat_history(chat_history: Vec<ChatMessage>) -> Self {
        Self {
            chat_history: Some(chat_history),
            ..Self::default()
        }
    }
}
