//! # Selection Manager
//!
//! Ordered set of selected node ids. Order is insertion order: the first
//! selected node anchors wraps and is the one copied.

use std::fmt;

/// Callback invoked with the current selection after every change
pub type SelectionObserver = Box<dyn FnMut(&[String])>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    Single,
    Multi,
}

#[derive(Default)]
pub struct Selection {
    ids: Vec<String>,
    observers: Vec<SelectionObserver>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn first(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn state(&self) -> SelectionState {
        match self.ids.len() {
            0 => SelectionState::Empty,
            1 => SelectionState::Single,
            _ => SelectionState::Multi,
        }
    }

    /// Register a callback for selection changes
    pub fn subscribe(&mut self, observer: SelectionObserver) {
        self.observers.push(observer);
    }

    /// Select a node. Non-additive selection replaces the current one;
    /// additive selection toggles the node in or out.
    pub fn select(&mut self, id: &str, additive: bool) {
        let mut next = if additive { self.ids.clone() } else { Vec::new() };

        match next.iter().position(|selected| selected == id) {
            Some(index) => {
                next.remove(index);
            }
            None => next.push(id.to_string()),
        }

        self.replace(next);
    }

    /// Replace the selection with `ids` (duplicates dropped, order kept)
    pub fn set(&mut self, ids: impl IntoIterator<Item = String>) {
        let mut next: Vec<String> = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        self.replace(next);
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Drop ids for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let next = self
            .ids
            .iter()
            .filter(|id| keep(id))
            .cloned()
            .collect();
        self.replace(next);
    }

    /// Follow a node whose id changed
    pub fn rename(&mut self, old: &str, new: &str) {
        let next = self
            .ids
            .iter()
            .map(|id| if id == old { new.to_string() } else { id.clone() })
            .collect();
        self.replace(next);
    }

    fn replace(&mut self, next: Vec<String>) {
        if next == self.ids {
            return;
        }

        tracing::debug!(from = self.ids.len(), to = next.len(), "selection changed");
        self.ids = next;

        for observer in &mut self.observers {
            observer(&self.ids);
        }
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("ids", &self.ids)
            .field("observers", &self.observers.len())
            .finish()
    }
}
