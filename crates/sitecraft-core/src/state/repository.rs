//! Persistence traits for application state.

use async_trait::async_trait;

use crate::error::Result;
use crate::history::HistoryItem;
use crate::project::Project;

/// Durable string-valued key/value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Repository for the persisted project collection, active id and history.
///
/// Each part is read and written independently so a corrupt history blob
/// never costs the user their projects, and vice versa.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Loads persisted projects.
    ///
    /// - `Ok(None)`: nothing was ever persisted
    /// - `Err(_)`: the record exists but cannot be read or parsed
    async fn load_projects(&self) -> Result<Option<Vec<Project>>>;

    /// Persists the whole collection. An empty slice removes the record.
    async fn save_projects(&self, projects: &[Project]) -> Result<()>;

    async fn load_active_project_id(&self) -> Result<Option<String>>;

    async fn save_active_project_id(&self, project_id: &str) -> Result<()>;

    async fn load_history(&self) -> Result<Vec<HistoryItem>>;

    async fn save_history(&self, items: &[HistoryItem]) -> Result<()>;
}
