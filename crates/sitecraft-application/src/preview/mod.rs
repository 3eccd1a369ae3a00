//! Live preview: the channel, the editor-side broadcaster and subscribing
//! surfaces.

mod broadcaster;
mod channel;
mod surface;

pub use broadcaster::PreviewBroadcaster;
pub use channel::{PreviewChannel, PreviewSubscription};
pub use surface::{FilePreviewRenderer, PreviewRenderer, PreviewSurface};
