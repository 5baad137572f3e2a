//! # Undo/Redo Stack
//!
//! Bounded linear history of serialized document snapshots.
//!
//! ## Design
//!
//! - Each entry is the full canvas markup after an edit
//! - A cursor marks the entry matching the current tree
//! - Snapshotting discards entries after the cursor (the redo branch)
//! - Snapshotting markup identical to the cursor entry is ignored
//! - When capacity is exceeded the oldest entry is evicted
//!
//! ## Example
//!
//! ```rust
//! use mosaic_editor::UndoStack;
//!
//! let mut stack = UndoStack::with_capacity(20);
//! stack.snapshot("<p id=\"a\">one</p>\n".to_string());
//! stack.snapshot("<p id=\"a\">two</p>\n".to_string());
//!
//! assert_eq!(stack.undo(), Some("<p id=\"a\">one</p>\n"));
//! assert_eq!(stack.redo(), Some("<p id=\"a\">two</p>\n"));
//! ```

/// Default number of retained snapshots
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub struct UndoStack {
    /// Snapshots, oldest first
    entries: Vec<String>,

    /// Index of the entry matching the current tree
    cursor: usize,

    /// Maximum number of retained snapshots (at least 1)
    capacity: usize,
}

impl UndoStack {
    /// Create a new undo stack with the default capacity (20)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an undo stack with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a snapshot. Returns false when it matched the current entry.
    pub fn snapshot(&mut self, markup: String) -> bool {
        if self.current() == Some(markup.as_str()) {
            return false;
        }

        if !self.entries.is_empty() {
            let discarded = self.entries.len() - (self.cursor + 1);
            if discarded > 0 {
                tracing::debug!(discarded, "dropping redo branch");
            }
            self.entries.truncate(self.cursor + 1);
        }

        self.entries.push(markup);

        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            tracing::debug!(capacity = self.capacity, "evicted oldest snapshot");
        }

        self.cursor = self.entries.len() - 1;
        true
    }

    /// Step back; returns the snapshot to load
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Step forward; returns the snapshot to load
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// Snapshot `undo` would return, without moving the cursor
    pub fn peek_undo(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.entries.get(self.cursor - 1).map(String::as_str)
    }

    /// Snapshot `redo` would return, without moving the cursor
    pub fn peek_redo(&self) -> Option<&str> {
        self.entries.get(self.cursor + 1).map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Snapshot at the cursor
    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(n: usize) -> String {
        format!("<p id=\"p\">{}</p>\n", n)
    }

    #[test]
    fn test_undo_redo() {
        let mut stack = UndoStack::new();
        stack.snapshot(snap(1));
        stack.snapshot(snap(2));
        stack.snapshot(snap(3));

        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        assert_eq!(stack.undo(), Some(snap(2).as_str()));
        assert_eq!(stack.undo(), Some(snap(1).as_str()));
        assert_eq!(stack.undo(), None);
        assert!(!stack.can_undo());

        assert_eq!(stack.redo(), Some(snap(2).as_str()));
        assert!(stack.can_redo());
    }

    #[test]
    fn test_peek_leaves_cursor_in_place() {
        let mut stack = UndoStack::new();
        assert_eq!(stack.peek_undo(), None);
        stack.snapshot(snap(1));
        stack.snapshot(snap(2));

        assert_eq!(stack.peek_undo(), Some(snap(1).as_str()));
        assert_eq!(stack.peek_redo(), None);
        assert_eq!(stack.cursor(), 1);

        stack.undo();
        assert_eq!(stack.peek_undo(), None);
        assert_eq!(stack.peek_redo(), Some(snap(2).as_str()));
        assert_eq!(stack.cursor(), 0);
    }

    #[test]
    fn test_identical_snapshot_ignored() {
        let mut stack = UndoStack::new();
        assert!(stack.snapshot(snap(1)));
        assert!(!stack.snapshot(snap(1)));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_new_snapshot_clears_redo() {
        let mut stack = UndoStack::new();
        stack.snapshot(snap(1));
        stack.snapshot(snap(2));
        stack.snapshot(snap(3));

        stack.undo();
        stack.undo();
        assert!(stack.can_redo());

        stack.snapshot(snap(4));
        assert!(!stack.can_redo());
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.undo(), Some(snap(1).as_str()));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut stack = UndoStack::new();
        for i in 0..25 {
            stack.snapshot(snap(i));
        }

        assert_eq!(stack.len(), 20);
        assert_eq!(stack.cursor(), 19);
        assert_eq!(stack.current(), Some(snap(24).as_str()));

        let mut steps = 0;
        while stack.undo().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 19);
        assert_eq!(stack.current(), Some(snap(5).as_str()));
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let mut stack = UndoStack::with_capacity(0);
        stack.snapshot(snap(1));
        stack.snapshot(snap(2));
        assert_eq!(stack.len(), 1);
        assert!(!stack.can_undo());
    }
}
