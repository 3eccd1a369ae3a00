//! Tracing setup: daily log file plus REPL notices.

use crate::notice_layer::{Notice, NoticeLayer};
use std::path::Path;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "warn,sitecraft=info";

/// Keeps the file writer alive; dropping it flushes pending log lines.
pub struct LoggingGuard {
    _file: WorkerGuard,
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(logs_dir: &Path) -> anyhow::Result<(LoggingGuard, mpsc::UnboundedReceiver<Notice>)> {
    std::fs::create_dir_all(logs_dir)?;
    let file_appender = tracing_appender::rolling::daily(logs_dir, "sitecraft.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(NoticeLayer::new(notice_tx))
        .try_init()?;

    Ok((LoggingGuard { _file: guard }, notice_rx))
}
