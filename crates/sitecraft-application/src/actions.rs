//! Download and deploy actions for the active project.

use crate::studio::Studio;
use sitecraft_core::archive::{ArchivePackager, archive_file_name};
use sitecraft_core::deploy::UrlOpener;
use sitecraft_core::error::{Result, SitecraftError};
use std::sync::Arc;

/// A packaged project ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Acts on the editor buffer of the active project. Neither action mutates
/// studio state.
pub struct ProjectActions {
    studio: Arc<Studio>,
    packager: Arc<dyn ArchivePackager>,
    opener: Arc<dyn UrlOpener>,
    deploy_url: String,
}

impl ProjectActions {
    pub fn new(
        studio: Arc<Studio>,
        packager: Arc<dyn ArchivePackager>,
        opener: Arc<dyn UrlOpener>,
        deploy_url: impl Into<String>,
    ) -> Self {
        Self {
            studio,
            packager,
            opener,
            deploy_url: deploy_url.into(),
        }
    }

    /// Packages the current buffer as `<sanitized name>.zip`.
    pub async fn download(&self) -> Result<DownloadArtifact> {
        let project = self
            .studio
            .active_project()
            .await
            .ok_or_else(|| SitecraftError::invalid_state("No active project"))?;
        let document = self.studio.editor().content();
        if document.is_empty() {
            return Err(SitecraftError::invalid_state("Nothing to download yet"));
        }

        let bytes = self.packager.package(&project.name, &document)?;
        let file_name = archive_file_name(&project.name);
        tracing::info!(project_id = %project.id, file_name = %file_name, "Project packaged");
        Ok(DownloadArtifact { file_name, bytes })
    }

    /// Opens the hosting provider's drop page. Nothing is uploaded.
    pub async fn deploy(&self) -> Result<()> {
        if self.studio.editor().content().is_empty() {
            return Err(SitecraftError::invalid_state("Nothing to deploy yet"));
        }
        self.opener.open(&self.deploy_url)?;
        tracing::info!(url = %self.deploy_url, "Opened deploy page");
        Ok(())
    }

    pub fn deploy_url(&self) -> &str {
        &self.deploy_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::StudioSettings;
    use sitecraft_core::project::ProjectPatch;
    use sitecraft_infrastructure::{KeyValueStateRepository, MemoryKeyValueStore};
    use std::sync::Mutex;

    struct FakePackager {
        fail: bool,
    }

    impl ArchivePackager for FakePackager {
        fn package(&self, project_name: &str, document: &str) -> Result<Vec<u8>> {
            if self.fail {
                return Err(SitecraftError::archive("zip support unavailable"));
            }
            Ok(format!("{project_name}|{document}").into_bytes())
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    async fn setup(fail: bool) -> (Arc<Studio>, Arc<RecordingOpener>, ProjectActions) {
        let repository = Arc::new(KeyValueStateRepository::new(Arc::new(
            MemoryKeyValueStore::new(),
        )));
        let studio = Arc::new(Studio::restore(repository, StudioSettings::default()).await);
        let opener = Arc::new(RecordingOpener::default());
        let actions = ProjectActions::new(
            studio.clone(),
            Arc::new(FakePackager { fail }),
            opener.clone(),
            "https://app.netlify.com/drop",
        );
        (studio, opener, actions)
    }

    async fn with_document(studio: &Studio, name: &str, document: &str) {
        let id = studio.active_project_id().await.unwrap();
        studio.rename_project(&id, name).await;
        studio
            .update_project(&id, ProjectPatch::document(document))
            .await;
    }

    #[tokio::test]
    async fn test_download_names_archive_after_project() {
        let (studio, _, actions) = setup(false).await;
        with_document(&studio, "My Site!", "<p>hi</p>").await;

        let artifact = actions.download().await.unwrap();

        assert_eq!(artifact.file_name, "my_site_.zip");
        assert_eq!(artifact.bytes, b"My Site!|<p>hi</p>".to_vec());
    }

    #[tokio::test]
    async fn test_actions_reject_empty_buffer() {
        let (_studio, opener, actions) = setup(false).await;

        assert!(actions.download().await.unwrap_err().is_invalid_state());
        assert!(actions.deploy().await.unwrap_err().is_invalid_state());
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_packaging_failure_is_reported_without_mutation() {
        let (studio, _, actions) = setup(true).await;
        with_document(&studio, "Site", "<p>hi</p>").await;
        let before = studio.projects().await;

        let err = actions.download().await.unwrap_err();

        assert!(err.to_string().contains("zip support unavailable"));
        assert_eq!(studio.projects().await, before);
    }

    #[tokio::test]
    async fn test_deploy_opens_drop_page() {
        let (studio, opener, actions) = setup(false).await;
        with_document(&studio, "Site", "<p>hi</p>").await;

        actions.deploy().await.unwrap();

        assert_eq!(
            *opener.opened.lock().unwrap(),
            vec!["https://app.netlify.com/drop".to_string()]
        );
    }
}
