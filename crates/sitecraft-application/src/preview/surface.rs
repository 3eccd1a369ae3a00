//! Preview surfaces: channel subscribers that render each received document.

use super::channel::PreviewChannel;
use async_trait::async_trait;
use sitecraft_core::error::Result;
use sitecraft_core::preview::{PreviewDevice, PreviewMessage, Zoom, isolated_document};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Draws a document. Each call replaces the previous rendering wholesale.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn render(&self, document: &str) -> Result<()>;
}

/// A subscribed surface. Announces itself with `Ready` on start and renders
/// every document that follows until dropped.
pub struct PreviewSurface {
    handle: JoinHandle<()>,
}

impl PreviewSurface {
    pub fn spawn(channel: PreviewChannel, renderer: Arc<dyn PreviewRenderer>) -> Self {
        let mut subscription = channel.subscribe();
        channel.publish(PreviewMessage::Ready);

        let handle = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                let PreviewMessage::Document(document) = message else {
                    continue;
                };
                if let Err(e) = renderer.render(&document).await {
                    tracing::warn!(topic = %channel.topic(), "Preview render failed: {}", e);
                }
            }
        });

        Self { handle }
    }
}

impl Drop for PreviewSurface {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct View {
    device: PreviewDevice,
    zoom: Zoom,
}

/// Renders into a standalone HTML file that frames the document in a
/// sandboxed iframe sized for the selected device.
pub struct FilePreviewRenderer {
    path: PathBuf,
    view: Mutex<View>,
    last_document: Mutex<String>,
}

impl FilePreviewRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            view: Mutex::new(View::default()),
            last_document: Mutex::new(String::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn device(&self) -> PreviewDevice {
        self.current_view().device
    }

    pub fn zoom(&self) -> Zoom {
        self.current_view().zoom
    }

    /// Switches the device frame and re-renders the last document.
    pub async fn set_device(&self, device: PreviewDevice) -> Result<()> {
        self.update_view(|view| view.device = device);
        self.rerender().await
    }

    /// Applies a zoom change and re-renders the last document.
    pub async fn set_zoom(&self, zoom: Zoom) -> Result<()> {
        self.update_view(|view| view.zoom = zoom);
        self.rerender().await
    }

    async fn rerender(&self) -> Result<()> {
        let document = self
            .last_document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        self.write(&document).await
    }

    fn current_view(&self) -> View {
        *self.view.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update_view(&self, f: impl FnOnce(&mut View)) {
        let mut view = self.view.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut view);
    }

    async fn write(&self, document: &str) -> Result<()> {
        let view = self.current_view();
        let page = isolated_document(document, view.device, view.zoom);
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, page).await?;
        Ok(())
    }
}

#[async_trait]
impl PreviewRenderer for FilePreviewRenderer {
    async fn render(&self, document: &str) -> Result<()> {
        *self.last_document.lock().unwrap_or_else(|e| e.into_inner()) = document.to_string();
        self.write(document).await
    }
}
