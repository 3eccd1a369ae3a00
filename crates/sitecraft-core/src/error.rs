//! Error types for the Sitecraft application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error shared by every sitecraft crate.
///
/// Variants carry rendered strings rather than source errors so the type stays
/// `Clone` and can be stored in the studio's error slot as-is.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SitecraftError {
    #[error("IO error: {message}")]
    Io { message: String },

    /// Encoding or decoding failed; `format` names the codec (`JSON`, `TOML`)
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Generation service error, already rendered for display
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Archive error: {0}")]
    Archive(String),

    /// The requested action is not available in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Anything that escaped a collaborator without a better category
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SitecraftError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    fn serialization(format: &str, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            format: format.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SitecraftError {
    fn from(err: std::io::Error) -> Self {
        Self::io(format!("{err} (kind: {:?})", err.kind()))
    }
}

impl From<serde_json::Error> for SitecraftError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON", err)
    }
}

impl From<toml::de::Error> for SitecraftError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization("TOML", err)
    }
}

impl From<toml::ser::Error> for SitecraftError {
    fn from(err: toml::ser::Error) -> Self {
        Self::serialization("TOML", err)
    }
}

impl From<anyhow::Error> for SitecraftError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// A type alias for `Result<T, SitecraftError>`.
pub type Result<T> = std::result::Result<T, SitecraftError>;
