//! Application layer for Sitecraft.
//!
//! Coordinates the domain (`sitecraft-core`) with whichever persistence,
//! generation and packaging implementations the caller wires in.

pub mod actions;
pub mod chat;
pub mod editor;
pub mod preview;
pub mod studio;

pub use actions::{DownloadArtifact, ProjectActions};
pub use chat::{ChatOutcome, ChatUseCase};
pub use editor::{DocumentCommit, DocumentSink, EditorBuffer};
pub use preview::{
    FilePreviewRenderer, PreviewBroadcaster, PreviewChannel, PreviewRenderer, PreviewSubscription,
    PreviewSurface,
};
pub use studio::{ActionAvailability, Studio, StudioSettings};
