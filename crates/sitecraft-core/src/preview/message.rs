/// Name of the topic preview surfaces subscribe to.
pub const PREVIEW_CHANNEL_NAME: &str = "sitecraft_preview_channel";

/// A message on the preview channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewMessage {
    /// Full document content; replaces whatever a surface showed before.
    Document(String),
    /// A surface has started and wants the current content.
    Ready,
}
