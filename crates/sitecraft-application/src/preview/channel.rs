//! Named publish/subscribe channel between the editor and preview surfaces.

use sitecraft_core::preview::PreviewMessage;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const CHANNEL_CAPACITY: usize = 32;

/// Topic-scoped broadcast channel carrying [`PreviewMessage`]s.
///
/// Every subscriber receives every message published after it subscribed,
/// including its own. Publishing with no subscribers is a no-op.
#[derive(Clone)]
pub struct PreviewChannel {
    topic: String,
    sender: broadcast::Sender<PreviewMessage>,
}

impl PreviewChannel {
    pub fn new(topic: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            topic: topic.into(),
            sender,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the number of subscribers the message reached.
    pub fn publish(&self, message: PreviewMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> PreviewSubscription {
        PreviewSubscription {
            topic: self.topic.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A registered listener. Dropping it unregisters it.
pub struct PreviewSubscription {
    topic: String,
    receiver: broadcast::Receiver<PreviewMessage>,
}

impl PreviewSubscription {
    /// Waits for the next message; `None` once the channel is gone.
    ///
    /// A subscriber that fell behind skips to the oldest retained message.
    /// Documents supersede each other, so nothing of value is lost.
    pub async fn recv(&mut self) -> Option<PreviewMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(topic = %self.topic, skipped, "Preview subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
