//! Prompt history: records of first-time generations.

mod log;
mod model;

pub use log::{DEFAULT_HISTORY_LIMIT, HistoryLog};
pub use model::HistoryItem;
