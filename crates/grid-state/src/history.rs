//! Undo/redo history over filter configurations.
//!
//! History behaves like a browser's back/forward stack: pushing after an undo
//! discards the undone entries, and the oldest entry is evicted once the
//! history is full.

use chrono::{DateTime, Utc};
use grid_filter_rs::filter::FilterConfig;
use serde::Serialize;

use crate::buffer::BoundedBuffer;

/// Default number of filter configurations kept.
pub const DEFAULT_MAX_FILTER_HISTORY: usize = 10;

/// One accepted filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub filter_config: FilterConfig,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, branching history of filter configurations.
///
/// Invariant: when non-empty, `index < len() <= max_entries()`.
#[derive(Debug, Clone)]
pub struct FilterHistory {
    entries: BoundedBuffer<HistoryEntry>,
    index: usize,
}

impl Default for FilterHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILTER_HISTORY)
    }
}

impl FilterHistory {
    /// Creates an empty history keeping at most `max_entries` configurations.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: BoundedBuffer::new(max_entries),
            index: 0,
        }
    }

    /// Records a new configuration as the current one, timestamped now.
    pub fn push(&mut self, filter_config: FilterConfig) {
        self.push_at(filter_config, Utc::now());
    }

    /// Records a new configuration with an explicit timestamp.
    ///
    /// Entries after the current one are discarded first.
    pub fn push_at(&mut self, filter_config: FilterConfig, timestamp: DateTime<Utc>) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        let evicted = self.entries.push(HistoryEntry {
            filter_config,
            timestamp,
        });
        if evicted.is_some() {
            tracing::debug!(max = self.entries.capacity(), "evicted oldest filter history entry");
        }
        self.index = self.entries.len() - 1;
    }

    /// Steps back one entry and returns its configuration.
    ///
    /// Returns `None`, changing nothing, at the oldest entry.
    pub fn undo(&mut self) -> Option<&FilterConfig> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).map(|e| &e.filter_config)
    }

    /// Steps forward one entry and returns its configuration.
    ///
    /// Returns `None`, changing nothing, at the newest entry.
    pub fn redo(&mut self) -> Option<&FilterConfig> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).map(|e| &e.filter_config)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index < self.entries.len() - 1
    }

    /// The entry undo/redo currently points at.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.entries.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(expression: &str) -> FilterConfig {
        FilterConfig::new().with_expression(expression)
    }

    fn current(history: &FilterHistory) -> &str {
        &history.current().unwrap().filter_config.expression
    }

    #[test]
    fn test_empty_history() {
        let mut history = FilterHistory::default();
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.max_entries(), DEFAULT_MAX_FILTER_HISTORY);
    }

    #[test]
    fn test_undo_redo_walks_entries() {
        let mut history = FilterHistory::new(10);
        history.push(config("a"));
        history.push(config("b"));
        history.push(config("c"));

        assert_eq!(history.undo().unwrap().expression, "b");
        assert_eq!(history.undo().unwrap().expression, "a");
        assert!(history.undo().is_none());
        assert_eq!(current(&history), "a");
        assert_eq!(history.redo().unwrap().expression, "b");
        assert!(history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn test_push_after_undo_discards_future() {
        let mut history = FilterHistory::new(10);
        for e in ["a", "b", "c"] {
            history.push(config(e));
        }
        history.undo();
        history.undo();
        history.push(config("d"));

        let expressions: Vec<_> = history
            .entries()
            .map(|e| e.filter_config.expression.as_str())
            .collect();
        assert_eq!(expressions, vec!["a", "d"]);
        assert!(!history.can_redo());
        assert_eq!(history.undo().unwrap().expression, "a");
        assert_eq!(history.redo().unwrap().expression, "d");
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let max = 10;
        let mut history = FilterHistory::new(max);
        for i in 0..max + 5 {
            history.push(config(&format!("age > {i}")));
        }

        assert_eq!(history.len(), max);
        assert_eq!(history.index(), max - 1);
        let oldest = &history.entries().next().unwrap().filter_config.expression;
        assert_eq!(oldest, "age > 5");
        assert_eq!(current(&history), "age > 14");
    }

    #[test]
    fn test_index_invariant_holds_through_operations() {
        let mut history = FilterHistory::new(3);
        for i in 0..7 {
            history.push(config(&i.to_string()));
            if i % 3 == 0 {
                history.undo();
            }
            assert!(history.index() < history.len());
            assert!(history.len() <= history.max_entries());
            assert_eq!(history.can_undo(), history.index() > 0);
            assert_eq!(history.can_redo(), history.index() < history.len() - 1);
        }
    }

    #[test]
    fn test_entry_serialization() {
        let mut history = FilterHistory::new(2);
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        history.push_at(config("a = 1"), at);
        let json = serde_json::to_value(history.current().unwrap()).unwrap();
        assert_eq!(json["filterConfig"]["expression"], "a = 1");
        assert_eq!(json["timestamp"], "2024-05-01T10:00:00Z");
    }
}
