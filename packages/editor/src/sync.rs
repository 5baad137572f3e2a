//! Synchronization state between the structural canvas and the markup view.
//!
//! Two things keep the views from echoing each other:
//! - text equal to the markup the engine last rendered is not an edit
//! - while the engine is rendering into the markup view, incoming text
//!   change events are ignored
//!
//! Accepted text edits are applied to the tree right away; the history
//! commit waits until the text has been quiet for the debounce interval.

use std::time::{Duration, Instant};

/// Default quiet period before a text edit is committed to history
pub const DEFAULT_TEXT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct MarkupSync {
    last_rendered: String,
    rendering: bool,
    commit_at: Option<Instant>,
    debounce: Duration,
}

impl MarkupSync {
    pub fn new(debounce: Duration) -> Self {
        Self {
            last_rendered: String::new(),
            rendering: false,
            commit_at: None,
            debounce,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Markup most recently pushed to the text view
    pub fn last_rendered(&self) -> &str {
        &self.last_rendered
    }

    pub fn record_render(&mut self, markup: &str) {
        self.last_rendered = markup.to_string();
    }

    /// Mark the start of a structural render into the text view
    pub fn begin_view_render(&mut self) {
        self.rendering = true;
    }

    pub fn end_view_render(&mut self) {
        self.rendering = false;
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// Whether incoming view text is a real user edit
    pub fn accepts(&self, text: &str) -> bool {
        if self.rendering {
            tracing::debug!("ignoring text change during structural render");
            return false;
        }
        if text == self.last_rendered {
            tracing::debug!("ignoring text identical to last render");
            return false;
        }
        true
    }

    /// (Re)start the quiet period for a text commit
    pub fn schedule_commit(&mut self, now: Instant) {
        self.commit_at = Some(now + self.debounce);
    }

    pub fn has_pending_commit(&self) -> bool {
        self.commit_at.is_some()
    }

    /// When the pending commit becomes due
    pub fn commit_deadline(&self) -> Option<Instant> {
        self.commit_at
    }

    /// Take the pending commit if its quiet period has elapsed
    pub fn take_due_commit(&mut self, now: Instant) -> bool {
        match self.commit_at {
            Some(at) if now >= at => {
                self.commit_at = None;
                true
            }
            _ => false,
        }
    }

    /// Take the pending commit regardless of the deadline
    pub fn take_pending_commit(&mut self) -> bool {
        self.commit_at.take().is_some()
    }
}

impl Default for MarkupSync {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_DEBOUNCE)
    }
}
