//! Bounded rewind history
//!
//! A chronological sequence of snapshots with a cursor that can walk backward
//! and forward. Recording a new entry after stepping back discards the entries
//! ahead of the cursor, and recording at capacity evicts the oldest entry.

use std::collections::VecDeque;

use crate::consts::{DEFAULT_REWIND_SECONDS, TICK_RATE};

/// Default history length (10 seconds at 60 ticks per second)
pub const DEFAULT_REWIND_CAPACITY: usize = (DEFAULT_REWIND_SECONDS * TICK_RATE) as usize;

/// Ordered snapshot history with cursor navigation
#[derive(Debug, Clone)]
pub struct RewindBuffer<T> {
    capacity: usize,
    /// Oldest entry at the front
    entries: VecDeque<T>,
    /// Index of the current entry, `None` when empty
    cursor: Option<usize>,
}

impl<T> Default for RewindBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_REWIND_CAPACITY)
    }
}

impl<T> RewindBuffer<T> {
    /// Create an empty buffer. A capacity of 0 disables recording.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            // Avoid reserving a huge block up front for generous capacities
            entries: VecDeque::with_capacity(capacity.min(1024)),
            cursor: None,
        }
    }

    /// Record a new entry as the current position.
    ///
    /// Entries after the cursor are dropped first, then the oldest entry is
    /// evicted if the buffer is over capacity.
    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }

        // Branch truncation: history ahead of the cursor is gone for good
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);

        self.entries.push_back(entry);
        let mut cursor = self.entries.len() - 1;

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            cursor -= 1;
        }
        self.cursor = Some(cursor);
    }

    /// Move one entry back in time and return it.
    ///
    /// Returns `None` (cursor unchanged) at the oldest retained entry or when empty.
    pub fn step_back(&mut self) -> Option<&T> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                self.entries.get(c - 1)
            }
            _ => None,
        }
    }

    /// Move one entry forward in time and return it.
    ///
    /// Returns `None` (cursor unchanged) at the newest entry or when empty.
    pub fn step_forward(&mut self) -> Option<&T> {
        match self.cursor {
            Some(c) if c + 1 < self.entries.len() => {
                self.cursor = Some(c + 1);
                self.entries.get(c + 1)
            }
            _ => None,
        }
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn can_step_back(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_step_forward(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in chronological order (oldest first)
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}
