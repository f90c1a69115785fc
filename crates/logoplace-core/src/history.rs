//! Snapshot-based undo/redo history.
//!
//! The history stores full copies of the state it guards. Stored snapshots
//! are owned values, so later edits to the live state can never alter them.

use std::collections::VecDeque;

/// Default maximum number of undo states to keep.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded undo/redo stacks of snapshots.
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Oldest at the front, most recent at the back.
    past: VecDeque<T>,
    /// Next redo state at the back.
    future: VecDeque<T>,
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl<T> History<T> {
    /// Create an empty history keeping at most `limit` undo states (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo states.
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of redo states.
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// All stored snapshots, undo states first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.past.iter().chain(self.future.iter())
    }

    /// Swap `current` with the most recent undo state.
    /// Returns false if there is nothing to undo.
    pub fn undo(&mut self, current: &mut T) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let now = std::mem::replace(current, previous);
        self.future.push_back(now);
        true
    }

    /// Swap `current` with the most recently undone state.
    /// Returns false if there is nothing to redo.
    pub fn redo(&mut self, current: &mut T) -> bool {
        let Some(next) = self.future.pop_back() else {
            return false;
        };
        let now = std::mem::replace(current, next);
        self.past.push_back(now);
        self.trim();
        true
    }

    fn trim(&mut self) {
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }
}

impl<T: Clone> History<T> {
    /// Record `current` as an undo state (call before making changes).
    ///
    /// Clears the redo stack. When the limit is exceeded the oldest state is
    /// discarded.
    pub fn record(&mut self, current: &T) {
        self.past.push_back(current.clone());
        self.future.clear();
        self.trim();
    }
}
