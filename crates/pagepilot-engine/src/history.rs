//! Bounded history of executed fill/click operations.
//!
//! Inspection only; replay correctness never depends on this buffer.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Default number of entries the ring retains.
const DEFAULT_CAPACITY: usize = 50;

/// One executed operation.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub description: String,
    pub ok: bool,
    pub at: DateTime<Utc>,
}

/// Ring buffer of recent operations; the oldest entry is dropped once
/// capacity is reached.
#[derive(Debug)]
pub struct ActionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an operation outcome.
    pub fn record(&mut self, description: impl Into<String>, ok: bool) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            description: description.into(),
            ok,
            at: Utc::now(),
        });
    }

    /// Entries oldest-first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_are_evicted() {
        let mut history = ActionHistory::with_capacity(3);
        for i in 0..5 {
            history.record(format!("op {i}"), true);
        }

        assert_eq!(history.len(), 3);
        let descriptions: Vec<&str> =
            history.entries().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["op 2", "op 3", "op 4"]);
    }
}
