//! # Mosaic Editor
//!
//! Editing engine for the Mosaic visual document editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: text ⇄ Node tree                    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - Validated tree mutations                 │
//! │  - Selection with observers                 │
//! │  - Drop intent resolution                   │
//! │  - Snapshot history (undo/redo)             │
//! │  - Saved blocks and selection export        │
//! │  - Markup view sync with debounced commits  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: the markup view is a derived rendering
//! 2. **Validate, then apply**: a refused operation never touches the tree
//! 3. **Snapshots, not inverses**: history stores serialized markup
//!
//! ## Usage
//!
//! ```rust
//! use mosaic_editor::{EditSession, EditorConfig, Mutation};
//!
//! let mut session =
//!     EditSession::from_markup("<p id=\"intro\">Hello</p>", EditorConfig::default())?;
//!
//! session.apply(Mutation::SetStyle {
//!     node_id: "intro".to_string(),
//!     property: "color".to_string(),
//!     value: "red".to_string(),
//! })?;
//! assert_eq!(session.markup(), "<p id=\"intro\" style=\"color: red\">Hello</p>\n");
//!
//! session.undo()?;
//! assert_eq!(session.markup(), "<p id=\"intro\">Hello</p>\n");
//! # Ok::<(), mosaic_editor::EditorError>(())
//! ```

mod blocks;
mod clipboard;
mod config;
mod drop_resolver;
mod errors;
mod mutations;
mod notifications;
mod selection;
mod session;
mod sync;
mod undo_stack;

pub use blocks::BlockLibrary;
pub use clipboard::Clipboard;
pub use config::EditorConfig;
pub use drop_resolver::{DropIntent, DropResolver, DropZones};
pub use errors::{EditorError, EditorResult, ErrorKind, MutationError};
pub use mutations::{
    Direction, DropPosition, Mutation, MutationContext, MutationOutcome, PastePlacement,
};
pub use notifications::{Notice, NoticeLevel, NoticeLog, NotificationSink, TracingSink};
pub use selection::{Selection, SelectionObserver, SelectionState};
pub use session::EditSession;
pub use sync::{MarkupSync, DEFAULT_TEXT_DEBOUNCE};
pub use undo_stack::{UndoStack, DEFAULT_HISTORY_CAPACITY};

// Re-export the tree types for convenience
pub use mosaic_markup::{Document, Node};
