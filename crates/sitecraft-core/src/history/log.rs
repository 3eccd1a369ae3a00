use super::model::HistoryItem;

/// Maximum number of history entries retained.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Bounded, prompt-deduplicated list of first-time generation prompts.
///
/// Entries are kept newest-first purely by insertion order; timestamps are
/// informational and never compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLog {
    items: Vec<HistoryItem>,
    limit: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero limit is treated as one so a recorded prompt is always visible.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Rebuilds a log from persisted items, trusting their order and
    /// truncating to the limit.
    pub fn restore(items: Vec<HistoryItem>, limit: usize) -> Self {
        let mut log = Self::with_limit(limit);
        log.items = items;
        log.items.truncate(log.limit);
        log
    }

    /// Records a prompt, promoting it to the front if it already exists.
    pub fn record(&mut self, prompt: impl Into<String>, name: impl Into<String>) -> &HistoryItem {
        let item = HistoryItem::new(name, prompt);
        self.items.retain(|existing| existing.prompt != item.prompt);
        self.items.insert(0, item);
        self.items.truncate(self.limit);
        &self.items[0]
    }

    /// All entries, newest first.
    pub fn all(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&HistoryItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
