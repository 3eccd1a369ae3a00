//! Tracing layer that surfaces warnings in the REPL.
//!
//! Log output goes to a file; events at `WARN` and above are additionally
//! forwarded over a channel so the REPL can print them inline.

use std::fmt::Write as _;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// A forwarded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub target: String,
    pub message: String,
    /// Remaining structured fields as `name=value` pairs.
    pub fields: Vec<(String, String)>,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for (name, value) in &self.fields {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

pub struct NoticeLayer {
    sender: mpsc::UnboundedSender<Notice>,
}

impl NoticeLayer {
    pub fn new(sender: mpsc::UnboundedSender<Notice>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for NoticeLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > Level::WARN {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        // Receiver gone means the REPL has exited; nothing to do.
        let _ = self.sender.send(Notice {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut rendered = String::new();
        let _ = write!(rendered, "{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_string(), rendered));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_forwards_only_warnings_and_errors() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(NoticeLayer::new(tx));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("routine");
            tracing::warn!(project_id = "proj_1", "Failed to persist projects: {}", "disk full");
            tracing::error!("broken");
        });

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, Level::WARN);
        assert_eq!(first.message, "Failed to persist projects: disk full");
        assert_eq!(first.fields, vec![("project_id".to_string(), "proj_1".to_string())]);
        assert_eq!(first.to_string(), "Failed to persist projects: disk full project_id=proj_1");

        assert_eq!(rx.try_recv().unwrap().level, Level::ERROR);
        assert!(rx.try_recv().is_err());
    }
}
