//! Publishes editor buffer changes to preview surfaces.

use super::channel::PreviewChannel;
use sitecraft_core::preview::PreviewMessage;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Background task mirroring the editor buffer onto a [`PreviewChannel`].
///
/// Publishes the current content once at start, again on every change, and
/// in answer to every `Ready`. Changes that land while a publish is pending
/// coalesce; the latest content always goes out. The task stops when the
/// broadcaster is dropped.
pub struct PreviewBroadcaster {
    handle: JoinHandle<()>,
}

impl PreviewBroadcaster {
    pub fn spawn(channel: PreviewChannel, mut content: watch::Receiver<String>) -> Self {
        // Subscribe before spawning so a surface started right after this call
        // cannot have its ready message missed.
        let mut subscription = channel.subscribe();

        let handle = tokio::spawn(async move {
            let current = content.borrow_and_update().clone();
            channel.publish(PreviewMessage::Document(current));

            loop {
                tokio::select! {
                    changed = content.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let document = content.borrow_and_update().clone();
                        channel.publish(PreviewMessage::Document(document));
                    }
                    message = subscription.recv() => match message {
                        Some(PreviewMessage::Ready) => {
                            let document = content.borrow().clone();
                            tracing::debug!(topic = %channel.topic(), "Surface ready, republishing");
                            channel.publish(PreviewMessage::Document(document));
                        }
                        Some(PreviewMessage::Document(_)) => {}
                        None => break,
                    },
                }
            }
            tracing::debug!(topic = %channel.topic(), "Preview broadcaster stopped");
        });

        Self { handle }
    }
}

impl Drop for PreviewBroadcaster {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
