//! Chat message types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Message produced by the application (welcome, status, errors).
    System,
}

/// A single entry in a project's chat transcript.
///
/// Messages are append-only: once pushed onto a transcript they are never
/// edited or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier (`msg_<uuid>`)
    pub id: String,
    pub role: MessageRole,
    pub text: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4()),
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}
