//! `StateRepository` over a generic key/value store.
//!
//! Layout:
//! - `sitecraft_projects`: JSON object of projects keyed by id
//! - `sitecraft_active_project_id`: the raw id
//! - `sitecraft_history`: JSON array, newest first

use async_trait::async_trait;
use sitecraft_core::error::Result;
use sitecraft_core::history::HistoryItem;
use sitecraft_core::project::Project;
use sitecraft_core::state::{KeyValueStore, StateKey, StateRepository};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Clone)]
pub struct KeyValueStateRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KeyValueStateRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn get(&self, key: StateKey) -> Result<Option<String>> {
        let value = self.store.get(key.as_str()).await?;
        Ok(value.filter(|v| !v.trim().is_empty()))
    }
}

#[async_trait]
impl StateRepository for KeyValueStateRepository {
    async fn load_projects(&self) -> Result<Option<Vec<Project>>> {
        let Some(raw) = self.get(StateKey::Projects).await? else {
            return Ok(None);
        };

        let by_id: HashMap<String, Project> = serde_json::from_str(&raw)?;
        let projects = by_id
            .into_iter()
            .map(|(key, mut project)| {
                // The map key is authoritative when a record disagrees with it.
                if project.id != key {
                    tracing::warn!(key = %key, id = %project.id, "Project id does not match its key");
                    project.id = key;
                }
                project
            })
            .collect();
        Ok(Some(projects))
    }

    async fn save_projects(&self, projects: &[Project]) -> Result<()> {
        if projects.is_empty() {
            return self.store.remove(StateKey::Projects.as_str()).await;
        }

        let by_id: BTreeMap<&str, &Project> =
            projects.iter().map(|p| (p.id.as_str(), p)).collect();
        let json = serde_json::to_string(&by_id)?;
        self.store.set(StateKey::Projects.as_str(), &json).await
    }

    async fn load_active_project_id(&self) -> Result<Option<String>> {
        self.get(StateKey::ActiveProjectId).await
    }

    async fn save_active_project_id(&self, project_id: &str) -> Result<()> {
        self.store
            .set(StateKey::ActiveProjectId.as_str(), project_id)
            .await
    }

    async fn load_history(&self) -> Result<Vec<HistoryItem>> {
        match self.get(StateKey::History).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_history(&self, items: &[HistoryItem]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        self.store.set(StateKey::History.as_str(), &json).await
    }
}
