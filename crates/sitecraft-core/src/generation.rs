//! Contract for the external website-generation service.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::SitecraftError;

/// Distinguishable failures of a generation or refinement call.
///
/// Clients raise these instead of synthesizing an error-page document, so the
/// caller can keep the previous document and show a real error state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// No API key could be found for the service
    #[error("API key is not configured: {0}")]
    MissingApiKey(String),

    /// The prompt template could not be rendered
    #[error("Failed to build prompt: {0}")]
    Prompt(String),

    /// The request never produced an HTTP response (connect, timeout, TLS)
    #[error("Request failed: {message}")]
    Request { message: String, retryable: bool },

    /// The service answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Http {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// The service answered, but not with a usable document
    #[error("Invalid response format from API: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { retryable, .. } | Self::Http { retryable, .. } => *retryable,
            Self::MissingApiKey(_) | Self::Prompt(_) | Self::MalformedResponse(_) => false,
        }
    }
}

impl From<GenerationError> for SitecraftError {
    fn from(err: GenerationError) -> Self {
        Self::Generation(err.to_string())
    }
}

/// Maps a prompt (and, for refinement, the existing document) to a complete
/// self-contained HTML document.
///
/// The returned document is opaque to callers: no well-formedness checks are
/// applied. Timeouts are the implementation's responsibility.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generates a new document from scratch.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Returns `document` modified according to `prompt`.
    async fn refine(&self, document: &str, prompt: &str) -> Result<String, GenerationError>;
}
