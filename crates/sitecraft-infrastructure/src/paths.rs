//! Unified path management for sitecraft files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/sitecraft/         # Config directory
//! ├── config.toml              # Application configuration
//! ├── secret.json              # API keys
//! └── logs/                    # Application logs
//!     └── sitecraft.log.YYYY-MM-DD
//!
//! ~/.local/share/sitecraft/    # Data directory
//! ├── state/                   # Persisted projects, active id, history
//! ├── preview/                 # Rendered preview pages
//! └── downloads/               # Packaged archives
//! ```

use sitecraft_core::config::{GeminiConfig, SecretConfig};
use sitecraft_core::error::{Result, SitecraftError};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "sitecraft";

/// Resolves every on-disk location used by sitecraft.
///
/// With a base path, both the config and data directories live directly under
/// it, which keeps tests and portable installs self-contained.
#[derive(Debug, Clone, Default)]
pub struct SitecraftPaths {
    base: Option<PathBuf>,
}

impl SitecraftPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the sitecraft configuration directory (e.g. `~/.config/sitecraft/`).
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| SitecraftError::config("Cannot find config directory")),
        }
    }

    /// Returns the sitecraft data directory (e.g. `~/.local/share/sitecraft/`).
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| SitecraftError::config("Cannot find data directory")),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// Keep this file at mode 600; [`Self::ensure_secret_file`] creates it so.
    pub fn secret_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("logs"))
    }

    /// Directory for the persisted key/value state, unless overridden by
    /// `[storage] state_dir`.
    pub fn state_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("state"))
    }

    pub fn preview_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("preview"))
    }

    pub fn downloads_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("downloads"))
    }

    /// Ensures the secret file exists, writing an empty template if it doesn't.
    pub fn ensure_secret_file(&self) -> Result<PathBuf> {
        let secret_path = self.secret_file()?;
        if secret_path.exists() {
            return Ok(secret_path);
        }

        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: None,
            }),
        };
        std::fs::write(&secret_path, serde_json::to_string_pretty(&template)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&secret_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!("Created secret template at {}", secret_path.display());
        Ok(secret_path)
    }
}
