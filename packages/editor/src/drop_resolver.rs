//! # Drop Resolver
//!
//! Turns a pointer position over a target node into a placement intent.
//! The target's vertical extent is split into three bands: the top band
//! means "before", the bottom band "after" and the middle band "inside".
//! Void targets cannot take children, so their middle band resolves to
//! "after".

use crate::errors::{EditorError, MutationError};
use crate::mutations::DropPosition;
use mosaic_markup::Document;
use serde::{Deserialize, Serialize};

/// Band sizes as fractions of the target's height. The middle band is
/// whatever remains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropZones {
    pub before: f64,
    pub after: f64,
}

impl Default for DropZones {
    fn default() -> Self {
        Self {
            before: 0.25,
            after: 0.25,
        }
    }
}

impl DropZones {
    pub fn new(before: f64, after: f64) -> Result<Self, EditorError> {
        let zones = Self { before, after };
        zones.validate()?;
        Ok(zones)
    }

    /// Bands must lie in `[0, 1]` and leave a non-negative middle band
    pub fn validate(&self) -> Result<(), EditorError> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.before) || !in_range(self.after) {
            return Err(EditorError::Config(format!(
                "drop zone bands must be between 0 and 1 (before: {}, after: {})",
                self.before, self.after
            )));
        }
        if self.before + self.after > 1.0 {
            return Err(EditorError::Config(format!(
                "drop zone bands overlap (before: {} + after: {} > 1)",
                self.before, self.after
            )));
        }
        Ok(())
    }

    /// Classify a vertical offset within an extent of `height`.
    ///
    /// A degenerate extent (zero, negative or NaN height) has no edges and
    /// resolves to the middle band.
    pub fn classify(&self, offset_y: f64, height: f64) -> DropPosition {
        if height.is_nan() || height <= 0.0 || offset_y.is_nan() {
            return DropPosition::Inside;
        }

        if offset_y < height * self.before {
            DropPosition::Before
        } else if offset_y > height * (1.0 - self.after) {
            DropPosition::After
        } else {
            DropPosition::Inside
        }
    }
}

/// A resolved placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropIntent {
    pub position: DropPosition,
    pub valid: bool,
    /// Set when the pointer band asked for another position
    pub degraded_from: Option<DropPosition>,
}

#[derive(Debug, Clone, Default)]
pub struct DropResolver {
    zones: DropZones,
}

impl DropResolver {
    pub fn new(zones: DropZones) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> DropZones {
        self.zones
    }

    /// Resolve the pointer position over `target_id` into an intent.
    ///
    /// `dragged` is the node being moved, or `None` for a new element from
    /// the palette. The canvas root always resolves to "inside".
    pub fn resolve(
        &self,
        doc: &Document,
        dragged: Option<&str>,
        target_id: &str,
        offset_y: f64,
        height: f64,
    ) -> DropIntent {
        let Some(target) = doc.find(target_id) else {
            return DropIntent {
                position: DropPosition::Inside,
                valid: false,
                degraded_from: None,
            };
        };

        let requested = if doc.is_root(target_id) {
            DropPosition::Inside
        } else {
            self.zones.classify(offset_y, height)
        };

        let (position, degraded_from) = if requested == DropPosition::Inside && !target.is_container() {
            (DropPosition::After, Some(DropPosition::Inside))
        } else {
            (requested, None)
        };

        let intent = DropIntent {
            position,
            valid: Self::validate(doc, dragged, target_id, position).is_ok(),
            degraded_from,
        };

        tracing::debug!(node = %target_id, ?intent, "resolved drop intent");
        intent
    }

    /// Evaluate an explicit position without band resolution or degradation
    pub fn evaluate(
        doc: &Document,
        dragged: Option<&str>,
        target_id: &str,
        position: DropPosition,
    ) -> DropIntent {
        DropIntent {
            position,
            valid: Self::validate(doc, dragged, target_id, position).is_ok(),
            degraded_from: None,
        }
    }

    /// Check that dropping `dragged` (or a new node) at `position` relative
    /// to `target_id` keeps the tree valid.
    ///
    /// Dropping a node next to itself is accepted; applying it is a no-op.
    pub fn validate(
        doc: &Document,
        dragged: Option<&str>,
        target_id: &str,
        position: DropPosition,
    ) -> Result<(), MutationError> {
        let target = doc
            .find(target_id)
            .ok_or_else(|| MutationError::NotFound(target_id.to_string()))?;

        if let Some(dragged) = dragged {
            if doc.is_root(dragged) || !doc.contains(dragged) {
                return Err(MutationError::NotFound(dragged.to_string()));
            }
        }

        let cyclic = |parent_id: &str| {
            dragged
                .map(|dragged| doc.would_create_cycle(dragged, parent_id))
                .unwrap_or(false)
        };

        match position {
            DropPosition::Inside => {
                if cyclic(target_id) {
                    return Err(MutationError::CyclicMove {
                        node_id: dragged.unwrap_or_default().to_string(),
                        target_id: target_id.to_string(),
                    });
                }
                if !target.is_container() {
                    return Err(MutationError::InvalidContainer(target_id.to_string()));
                }
            }
            DropPosition::Before | DropPosition::After => {
                if dragged == Some(target_id) {
                    return Ok(());
                }
                let parent = doc
                    .parent_of(target_id)
                    .ok_or_else(|| MutationError::NotFound(format!("parent of {}", target_id)))?;
                if cyclic(&parent.id) {
                    return Err(MutationError::CyclicMove {
                        node_id: dragged.unwrap_or_default().to_string(),
                        target_id: target_id.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
