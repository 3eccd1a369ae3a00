//! Secret service for API keys stored in `secret.json`.

use crate::paths::SitecraftPaths;
use sitecraft_core::config::{GeminiConfig, SecretConfig};
use sitecraft_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Environment variable that overrides the Gemini key from `secret.json`.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone)]
pub struct SecretService {
    path: PathBuf,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretService {
    pub fn new(paths: &SitecraftPaths) -> Result<Self> {
        Ok(Self::with_path(paths.secret_file()?))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    pub fn secret_file_exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the secrets, caching them after the first successful read.
    /// A missing file yields empty secrets.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        {
            let read_lock = self.secrets.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            if content.trim().is_empty() {
                SecretConfig::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            SecretConfig::default()
        };

        let mut write_lock = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Resolves Gemini credentials, preferring `GEMINI_API_KEY` over the file.
    pub fn gemini(&self) -> Result<Option<GeminiConfig>> {
        let secrets = self.load_secrets()?;
        Ok(resolve_gemini(
            secrets.gemini,
            std::env::var(GEMINI_API_KEY_ENV).ok(),
        ))
    }
}

/// Merges file credentials with an environment override. Blank keys count as
/// absent.
pub fn resolve_gemini(file: Option<GeminiConfig>, env_key: Option<String>) -> Option<GeminiConfig> {
    let env_key = env_key.filter(|k| !k.trim().is_empty());
    match (file, env_key) {
        (Some(mut config), Some(key)) => {
            config.api_key = key;
            Some(config)
        }
        (None, Some(key)) => Some(GeminiConfig {
            api_key: key,
            model_name: None,
        }),
        (Some(config), None) if !config.api_key.trim().is_empty() => Some(config),
        _ => None,
    }
}
