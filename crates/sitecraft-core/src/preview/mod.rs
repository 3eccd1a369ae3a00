//! Preview channel messages, device frames and preview page builders.

mod device;
mod document;
mod message;

pub use device::{PreviewDevice, Zoom};
pub use document::{PREVIEW_SANDBOX, escape_attribute, isolated_document};
pub use message::{PREVIEW_CHANNEL_NAME, PreviewMessage};
