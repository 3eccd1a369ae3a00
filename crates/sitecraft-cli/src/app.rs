//! Wires the infrastructure into a running studio.

use crate::opener::SystemUrlOpener;
use sitecraft_application::{
    ChatUseCase, FilePreviewRenderer, PreviewBroadcaster, PreviewChannel, PreviewSurface,
    ProjectActions, Studio, StudioSettings,
};
use sitecraft_core::config::RootConfig;
use sitecraft_core::preview::PREVIEW_CHANNEL_NAME;
use sitecraft_core::state::KeyValueStore;
use sitecraft_infrastructure::{
    ConfigService, FileKeyValueStore, KeyValueStateRepository, MemoryKeyValueStore,
    SecretService, SitecraftPaths, ZipArchivePackager,
};
use sitecraft_interaction::GeminiClient;
use std::sync::Arc;

/// Everything the REPL talks to.
pub struct App {
    pub paths: SitecraftPaths,
    pub studio: Arc<Studio>,
    pub chat: Arc<ChatUseCase>,
    pub actions: Arc<ProjectActions>,
    pub renderer: Arc<FilePreviewRenderer>,
    pub opener: Arc<SystemUrlOpener>,
    /// Model name and whether a key is configured, for the banner.
    pub model: String,
    pub has_api_key: bool,
    _broadcaster: PreviewBroadcaster,
    _surface: PreviewSurface,
}

impl App {
    pub async fn build(paths: SitecraftPaths, ephemeral: bool) -> anyhow::Result<Self> {
        let config = ConfigService::new(&paths)?.get_config();
        let studio = open_studio(&paths, &config, ephemeral).await?;

        let credentials = match SecretService::new(&paths)?.gemini() {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!("Failed to load secrets: {}", e);
                None
            }
        };
        let client = Arc::new(GeminiClient::from_settings(&config.generation, credentials)?);
        let model = client.model().to_string();
        let has_api_key = client.has_api_key();
        let chat = Arc::new(ChatUseCase::new(studio.clone(), client));

        let opener = Arc::new(SystemUrlOpener);
        let actions = Arc::new(ProjectActions::new(
            studio.clone(),
            Arc::new(ZipArchivePackager::new()),
            opener.clone(),
            config.deploy.url.clone(),
        ));

        let channel = PreviewChannel::new(PREVIEW_CHANNEL_NAME);
        let renderer = Arc::new(FilePreviewRenderer::new(paths.preview_dir()?.join("index.html")));
        // The broadcaster must be listening before the surface announces itself.
        let broadcaster = PreviewBroadcaster::spawn(channel.clone(), studio.editor().subscribe());
        let surface = PreviewSurface::spawn(channel, renderer.clone());

        Ok(Self {
            paths,
            studio,
            chat,
            actions,
            renderer,
            opener,
            model,
            has_api_key,
            _broadcaster: broadcaster,
            _surface: surface,
        })
    }
}

/// Restores the studio from the configured state directory, or from an
/// empty in-memory store when `ephemeral` is set.
pub async fn open_studio(
    paths: &SitecraftPaths,
    config: &RootConfig,
    ephemeral: bool,
) -> anyhow::Result<Arc<Studio>> {
    let store: Arc<dyn KeyValueStore> = if ephemeral {
        Arc::new(MemoryKeyValueStore::new())
    } else {
        let dir = match &config.storage.state_dir {
            Some(dir) => dir.clone(),
            None => paths.state_dir()?,
        };
        tracing::debug!("Using state directory {}", dir.display());
        Arc::new(FileKeyValueStore::new(dir))
    };
    let repository = Arc::new(KeyValueStateRepository::new(store));
    Ok(Arc::new(
        Studio::restore(repository, StudioSettings::from_config(config)).await,
    ))
}
