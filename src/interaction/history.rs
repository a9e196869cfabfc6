//! Linear snapshot history
//!
//! ```text
//! push(s3)            [s0, s1, s2, s3]   index 3
//! undo() x2           [s0, s1, s2, s3]   index 1
//! push(s4)            [s0, s1, s4]       index 2   (s2, s3 discarded)
//! reset()             [s0, s1, s4, s0]   index 3
//! ```
//!
//! Invariants:
//! 1. `index < entries.len()` and `entries` is never empty
//! 2. Pushing discards everything after `index`
//! 3. `entries.len() <= max_depth`; the oldest entries are evicted first
//! 4. The initial snapshot survives eviction so `reset` always has a target

use std::collections::VecDeque;

pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct LayoutHistory<T: Clone> {
    initial: T,
    entries: VecDeque<T>,
    index: usize,
    max_depth: usize,
}

impl<T: Clone> LayoutHistory<T> {
    pub fn new(initial: T) -> Self {
        Self::with_max_depth(initial, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(initial: T, max_depth: usize) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(initial.clone());
        Self {
            initial,
            entries,
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record a new snapshot after the current one
    pub fn push(&mut self, snapshot: T) {
        self.entries.truncate(self.index + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back; `None` at the oldest entry
    pub fn undo(&mut self) -> Option<&T> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward; `None` at the newest entry
    pub fn redo(&mut self) -> Option<&T> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    /// Push the initial snapshot as a new entry, so reset itself can be undone
    pub fn reset(&mut self) -> &T {
        self.push(self.initial.clone());
        &self.initial
    }

    pub fn current(&self) -> &T {
        // entries is never empty and index is always in range
        &self.entries[self.index]
    }

    pub fn initial(&self) -> &T {
        &self.initial
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
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
}
