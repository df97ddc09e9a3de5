use std::collections::VecDeque;

use super::types::LABEL_SEPARATOR;

/// Most entries a history ever holds.
pub const HISTORY_CAPACITY: usize = 5;

/// Recently issued queries, most recent first, without duplicates.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl History {
    /// Capacity is clamped to `1..=HISTORY_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, HISTORY_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push to the front. An existing identical entry is moved, not repeated.
    pub fn push(&mut self, entry: &str) {
        if entry.trim().is_empty() {
            return;
        }

        self.entries.retain(|existing| existing != entry);
        self.entries.push_front(entry.to_string());
        self.entries.truncate(self.capacity);
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

/// The query a composite label started from: text before the first separator.
pub fn original_query(entry: &str) -> &str {
    entry
        .split_once(LABEL_SEPARATOR)
        .map_or(entry, |(original, _)| original)
        .trim()
}
