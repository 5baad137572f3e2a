//! # Edit Session
//!
//! The editing engine as one value. An `EditSession` owns the document,
//! selection, history, clipboard and the markup view sync state, and is
//! handed its collaborators (template catalog, notification sink)
//! explicitly.
//!
//! Structural operations are committed to history as soon as they succeed.
//! Edits arriving from the markup view replace the tree immediately and
//! are committed once the text has been quiet for the debounce interval
//! (see [`EditSession::poll`]); any structural operation flushes a pending
//! text commit first.

use crate::blocks::BlockLibrary;
use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::drop_resolver::{DropIntent, DropResolver};
use crate::errors::{EditorError, EditorResult, MutationError};
use crate::mutations::{Direction, DropPosition, Mutation, MutationContext, MutationOutcome};
use crate::notifications::{NoticeLevel, NotificationSink, TracingSink};
use crate::selection::{Selection, SelectionState};
use crate::sync::MarkupSync;
use crate::undo_stack::UndoStack;
use mosaic_markup::{BuiltinCatalog, Document, Node, Serializer, TemplateCatalog};
use std::time::Instant;

pub struct EditSession {
    document: Document,
    selection: Selection,
    history: UndoStack,
    clipboard: Clipboard,
    blocks: BlockLibrary,
    sync: MarkupSync,
    resolver: DropResolver,
    catalog: Box<dyn TemplateCatalog>,
    notifier: Box<dyn NotificationSink>,
    config: EditorConfig,
}

impl EditSession {
    /// Create a session with the default configuration
    pub fn new(document: Document) -> Self {
        Self::build(document, EditorConfig::default())
    }

    /// Create a session with a validated configuration
    pub fn with_config(document: Document, config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        Ok(Self::build(document, config))
    }

    /// Parse markup into a fresh document and open a session on it
    pub fn from_markup(source: &str, config: EditorConfig) -> EditorResult<Self> {
        let document = Document::from_markup(source, Default::default())?;
        Self::with_config(document, config)
    }

    fn build(document: Document, config: EditorConfig) -> Self {
        let mut catalog = BuiltinCatalog::new();
        catalog.extend(config.templates.iter().cloned());

        let mut session = Self {
            document,
            selection: Selection::new(),
            history: UndoStack::with_capacity(config.history_capacity),
            clipboard: Clipboard::new(),
            blocks: BlockLibrary::new(),
            sync: MarkupSync::new(config.text_debounce()),
            resolver: DropResolver::new(config.drop_zones),
            catalog: Box::new(catalog),
            notifier: Box::new(TracingSink),
            config,
        };

        // The initial state is the oldest undo target
        session.commit();
        session
    }

    /// Replace the template catalog
    pub fn with_catalog(mut self, catalog: Box<dyn TemplateCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the notification sink
    pub fn with_notifier(mut self, notifier: Box<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    // --- Queries ---

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &dyn TemplateCatalog {
        self.catalog.as_ref()
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn blocks(&self) -> &BlockLibrary {
        &self.blocks
    }

    /// Selected ids in selection order
    pub fn selection(&self) -> &[String] {
        self.selection.ids()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    /// Register a callback for selection changes
    pub fn on_selection_changed(&mut self, observer: impl FnMut(&[String]) + 'static) {
        self.selection.subscribe(Box::new(observer));
    }

    /// Current canvas markup
    pub fn markup(&self) -> String {
        let mut serializer = Serializer::with_indent(&self.config.indent);
        self.document.to_markup_with(&mut serializer)
    }

    /// Canvas as a complete page
    pub fn page(&self, title: &str) -> String {
        let mut serializer = Serializer::with_indent(&self.config.indent);
        serializer.serialize_page(self.document.root(), title)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Tree operations ---

    /// Apply a mutation, committing it to history when it changed the tree
    pub fn apply(&mut self, mutation: Mutation) -> EditorResult<MutationOutcome> {
        self.flush_text_commit();
        let outcome = self.run(&mutation)?;
        self.after_change(outcome.changed);
        Ok(outcome)
    }

    /// Apply without touching history or the selection
    fn run(&mut self, mutation: &Mutation) -> EditorResult<MutationOutcome> {
        let ctx = MutationContext::new(self.catalog.as_ref())
            .with_paste_placement(self.config.paste_placement);

        match mutation.apply(&mut self.document, &ctx) {
            Ok(outcome) => {
                tracing::debug!(
                    op = mutation.name(),
                    changed = outcome.changed,
                    created = ?outcome.created,
                    "mutation applied"
                );

                match mutation {
                    Mutation::SetId { node_id, id } if outcome.changed => {
                        self.selection.rename(node_id, id.trim());
                    }
                    Mutation::SetAttribute {
                        node_id,
                        name,
                        value,
                    } if outcome.changed && name.trim().eq_ignore_ascii_case("id") => {
                        self.selection.rename(node_id, value.trim());
                    }
                    _ => {}
                }

                Ok(outcome)
            }
            Err(error) => {
                tracing::warn!(op = mutation.name(), %error, "mutation refused");
                let level = match error {
                    MutationError::UnsafeWrap { .. } | MutationError::WouldDiscardChildren { .. } => {
                        NoticeLevel::Warning
                    }
                    _ => NoticeLevel::Error,
                };
                self.notifier.notify(level, &error.to_string());
                Err(error.into())
            }
        }
    }

    // --- Selection ---

    /// Select a node; `additive` toggles it within the current selection
    pub fn select(&mut self, id: &str, additive: bool) -> EditorResult<()> {
        let selectable = !self.document.is_root(id)
            && self.document.find(id).map(Node::is_managed).unwrap_or(false);
        if !selectable {
            return Err(MutationError::NotFound(id.to_string()).into());
        }

        self.selection.select(id, additive);
        self.mirror_selection();
        Ok(())
    }

    /// Select every managed node in document order
    pub fn select_all(&mut self) {
        self.selection.set(self.document.managed_ids());
        self.mirror_selection();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.mirror_selection();
    }

    fn first_selected(&self) -> EditorResult<String> {
        self.selection
            .first()
            .map(str::to_string)
            .ok_or(EditorError::EmptySelection)
    }

    // --- Clipboard ---

    /// Copy the first selected node
    pub fn copy(&mut self) -> EditorResult<()> {
        let id = self.first_selected()?;
        let node = self
            .document
            .find(&id)
            .ok_or_else(|| MutationError::NotFound(id.clone()))?;

        self.clipboard.copy(node);
        let message = format!("Copied <{}>", node.tag);
        self.notifier.notify(NoticeLevel::Success, &message);
        Ok(())
    }

    /// Copy the first selected node, then remove it
    pub fn cut(&mut self) -> EditorResult<()> {
        let id = self.first_selected()?;
        self.copy()?;
        self.apply(Mutation::RemoveNode { node_id: id })?;
        Ok(())
    }

    /// Paste the clipboard at `target`, or at the first selected node, or
    /// into the canvas root. The pasted node becomes the selection.
    pub fn paste(&mut self, target: Option<&str>) -> EditorResult<MutationOutcome> {
        let subtree = self
            .clipboard
            .content()
            .cloned()
            .ok_or(EditorError::EmptyClipboard)?;

        let target_id = match target {
            Some(target) => target.to_string(),
            None => self
                .selection
                .first()
                .map(str::to_string)
                .unwrap_or_else(|| self.document.root().id.clone()),
        };

        let outcome = self.apply(Mutation::PasteSubtree { subtree, target_id })?;
        self.select_created(&outcome);
        self.notifier.notify(NoticeLevel::Success, "Pasted");
        Ok(outcome)
    }

    /// Duplicate the first selected node and select the copy
    pub fn duplicate_selection(&mut self) -> EditorResult<MutationOutcome> {
        let node_id = self.first_selected()?;
        let outcome = self.apply(Mutation::Duplicate { node_id })?;
        self.select_created(&outcome);
        Ok(outcome)
    }

    /// Remove every selected node as one history step
    pub fn delete_selection(&mut self) -> EditorResult<usize> {
        if self.selection.is_empty() {
            return Err(EditorError::EmptySelection);
        }
        self.flush_text_commit();

        let mut removed = 0;
        let mut failure = None;
        for id in self.selection.ids().to_vec() {
            // Already gone with a removed ancestor
            if !self.document.contains(&id) {
                continue;
            }
            if let Err(error) = self.run(&Mutation::RemoveNode { node_id: id }) {
                failure = Some(error);
                break;
            }
            removed += 1;
        }

        // Removals that did happen are committed either way
        self.after_change(removed > 0);
        if let Some(error) = failure {
            return Err(error);
        }
        self.notifier.notify(
            NoticeLevel::Success,
            &format!("Deleted {} element(s)", removed),
        );
        Ok(removed)
    }

    /// Wrap the selected siblings of the first selected node in `tag`
    pub fn wrap_selection(&mut self, tag: &str) -> EditorResult<MutationOutcome> {
        if self.selection.is_empty() {
            return Err(EditorError::EmptySelection);
        }
        let outcome = self.apply(Mutation::WrapSiblings {
            tag: tag.to_string(),
            node_ids: self.selection.ids().to_vec(),
        })?;
        self.select_created(&outcome);
        Ok(outcome)
    }

    /// Wrap the first selected node's content in an inline `tag`
    pub fn wrap_inline(&mut self, tag: &str) -> EditorResult<MutationOutcome> {
        let node_id = self.first_selected()?;
        self.apply(Mutation::WrapInlineContent {
            node_id,
            tag: tag.to_string(),
        })
    }

    /// Remove the first selected node but keep its content
    pub fn unwrap_selection(&mut self) -> EditorResult<MutationOutcome> {
        let node_id = self.first_selected()?;
        self.apply(Mutation::Unwrap { node_id })
    }

    /// Move the first selected node up or down among its siblings
    pub fn move_selection(&mut self, direction: Direction) -> EditorResult<MutationOutcome> {
        let node_id = self.first_selected()?;
        self.apply(Mutation::MoveAdjacent { node_id, direction })
    }

    // --- Drag and drop ---

    /// Resolve a pointer position over `target_id` into a drop intent
    pub fn resolve_drop_intent(
        &self,
        dragged: Option<&str>,
        target_id: &str,
        offset_y: f64,
        height: f64,
    ) -> DropIntent {
        self.resolver
            .resolve(&self.document, dragged, target_id, offset_y, height)
    }

    /// Drop an existing node at a pointer position over `target_id`
    pub fn drop_node(
        &mut self,
        node_id: &str,
        target_id: &str,
        offset_y: f64,
        height: f64,
    ) -> EditorResult<MutationOutcome> {
        let intent = self.resolve_drop_intent(Some(node_id), target_id, offset_y, height);
        self.apply(Mutation::MoveNode {
            node_id: node_id.to_string(),
            target_id: target_id.to_string(),
            position: intent.position,
        })
    }

    /// Drop a new element from the palette at a pointer position
    pub fn drop_template(
        &mut self,
        template: &str,
        target_id: &str,
        offset_y: f64,
        height: f64,
    ) -> EditorResult<MutationOutcome> {
        let intent = self.resolve_drop_intent(None, target_id, offset_y, height);
        let (target_id, index) = self.drop_destination(target_id, intent.position)?;

        let outcome = self.apply(Mutation::CreateElement {
            template: template.to_string(),
            target_id,
            index,
        })?;
        self.select_created(&outcome);
        Ok(outcome)
    }

    /// Parent and index a new node dropped at `position` of `target_id` lands at
    fn drop_destination(
        &self,
        target_id: &str,
        position: DropPosition,
    ) -> EditorResult<(String, Option<usize>)> {
        match position {
            DropPosition::Inside => Ok((target_id.to_string(), None)),
            DropPosition::Before | DropPosition::After => {
                let (parent_id, index) = self
                    .document
                    .locate(target_id)
                    .ok_or_else(|| MutationError::NotFound(target_id.to_string()))?;
                let index = if position == DropPosition::After {
                    index + 1
                } else {
                    index
                };
                Ok((parent_id, Some(index)))
            }
        }
    }

    // --- Saved blocks ---

    /// Save a copy of the first selected node as a named block
    pub fn save_block(&mut self, name: &str) -> EditorResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MutationError::InvalidName(name.to_string()).into());
        }
        let id = self.first_selected()?;
        let node = self
            .document
            .find(&id)
            .ok_or_else(|| MutationError::NotFound(id.clone()))?;

        if self.blocks.save(name, node) {
            tracing::debug!(block = name, "replaced saved block");
        }
        self.notifier
            .notify(NoticeLevel::Success, &format!("Saved block {:?}", name));
        Ok(())
    }

    pub fn delete_block(&mut self, name: &str) -> EditorResult<()> {
        self.blocks
            .remove(name.trim())
            .map(|_| ())
            .ok_or_else(|| EditorError::UnknownBlock(name.trim().to_string()))
    }

    /// Drop a saved block at a pointer position. The copy gets fresh ids and
    /// becomes the selection.
    pub fn drop_block(
        &mut self,
        name: &str,
        target_id: &str,
        offset_y: f64,
        height: f64,
    ) -> EditorResult<MutationOutcome> {
        let node = self
            .blocks
            .get(name.trim())
            .cloned()
            .ok_or_else(|| EditorError::UnknownBlock(name.trim().to_string()))?;

        let intent = self.resolve_drop_intent(None, target_id, offset_y, height);
        let (parent_id, index) = self.drop_destination(target_id, intent.position)?;

        let outcome = self.apply(Mutation::InsertNode {
            parent_id,
            index,
            node,
        })?;
        self.select_created(&outcome);
        Ok(outcome)
    }

    // --- Export ---

    /// Markup of the selected nodes in selection order, without editor
    /// markers. A node inside another selected node is exported only as
    /// part of that ancestor.
    pub fn export_selection(&self) -> EditorResult<String> {
        let ids = self.selection.ids();
        if ids.is_empty() {
            return Err(EditorError::EmptySelection);
        }

        let mut serializer = Serializer::with_indent(&self.config.indent);
        let mut output = String::new();
        for id in ids {
            let nested = ids.iter().any(|other| {
                other != id
                    && self
                        .document
                        .find(other)
                        .map(|ancestor| ancestor.has_descendant(id))
                        .unwrap_or(false)
            });
            if nested {
                continue;
            }

            let node = self
                .document
                .find(id)
                .ok_or_else(|| MutationError::NotFound(id.clone()))?;
            let mut holder = Node::root();
            holder.children.push(node.clone());
            output.push_str(&serializer.serialize(&holder));
        }
        Ok(output)
    }

    // --- History ---

    /// Step back one snapshot. A snapshot that fails to load leaves the
    /// tree and the history cursor where they were.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.flush_text_commit();
        let Some(snapshot) = self.history.peek_undo().map(str::to_string) else {
            return Ok(false);
        };
        self.restore(&snapshot)?;
        self.history.undo();
        tracing::debug!(cursor = self.history.cursor(), "undo");
        Ok(true)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        self.flush_text_commit();
        let Some(snapshot) = self.history.peek_redo().map(str::to_string) else {
            return Ok(false);
        };
        self.restore(&snapshot)?;
        self.history.redo();
        tracing::debug!(cursor = self.history.cursor(), "redo");
        Ok(true)
    }

    fn restore(&mut self, snapshot: &str) -> EditorResult<()> {
        self.document.load_markup(snapshot)?;
        self.selection.clear();
        self.mirror_selection();
        let markup = self.markup();
        self.sync.record_render(&markup);
        Ok(())
    }

    // --- Markup view ---

    /// Replace the whole tree with parsed markup and commit it
    pub fn load_markup(&mut self, source: &str) -> EditorResult<()> {
        self.flush_text_commit();
        self.document.load_markup(source)?;
        self.selection.clear();
        self.after_change(true);
        Ok(())
    }

    /// Text arrived from the markup view.
    ///
    /// Returns false when the text was ignored (an echo of the last render,
    /// or a change event fired by a structural render in flight).
    pub fn text_edited(&mut self, text: &str, now: Instant) -> EditorResult<bool> {
        if !self.sync.accepts(text) {
            return Ok(false);
        }

        if let Err(error) = self.document.load_markup(text) {
            tracing::debug!(%error, "markup view text does not parse yet");
            return Err(error.into());
        }

        self.sync.record_render(text);
        self.selection.clear();
        self.mirror_selection();
        self.sync.schedule_commit(now);
        Ok(true)
    }

    /// Commit a debounced text edit once its quiet period has passed.
    /// Returns true if a commit happened.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.sync.take_due_commit(now) {
            self.commit();
            return true;
        }
        false
    }

    /// When a pending text edit is due to be committed
    pub fn commit_deadline(&self) -> Option<Instant> {
        self.sync.commit_deadline()
    }

    pub fn begin_view_render(&mut self) {
        self.sync.begin_view_render();
    }

    pub fn end_view_render(&mut self) {
        self.sync.end_view_render();
    }

    // --- Internals ---

    fn flush_text_commit(&mut self) {
        if self.sync.take_pending_commit() {
            tracing::debug!("flushing pending text commit");
            self.commit();
        }
    }

    /// Snapshot the current tree into history
    fn commit(&mut self) {
        let markup = self.markup();
        if self.history.snapshot(markup.clone()) {
            tracing::debug!(
                entries = self.history.len(),
                cursor = self.history.cursor(),
                "history snapshot"
            );
        }
        self.sync.record_render(&markup);
    }

    fn after_change(&mut self, changed: bool) {
        if changed {
            self.commit();
        }
        let document = &self.document;
        self.selection
            .retain(|id| document.contains(id) && !document.is_root(id));
        self.mirror_selection();
    }

    fn select_created(&mut self, outcome: &MutationOutcome) {
        if let Some(id) = &outcome.created {
            self.selection.set(vec![id.clone()]);
            self.mirror_selection();
        }
    }

    fn mirror_selection(&mut self) {
        self.document.mark_selection(self.selection.ids());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NoticeLog;

    fn session(markup: &str) -> EditSession {
        EditSession::from_markup(markup, EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_new_session_has_initial_snapshot() {
        let session = session("<p id=\"a\">x</p>");
        assert_eq!(session.history().len(), 1);
        assert!(!session.can_undo());
        assert!(!session.can_redo());
    }

    #[test]
    fn test_root_is_not_selectable() {
        let mut session = session("<p id=\"a\">x</p>");
        assert!(session.select("canvas", false).is_err());
        assert!(session.select("ghost", false).is_err());
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_selection_is_mirrored_on_the_tree() {
        let mut session = session("<p id=\"a\">x</p><p id=\"b\">y</p>");
        session.select("a", false).unwrap();
        assert!(session.document().find("a").unwrap().is_selected());

        session.select("b", false).unwrap();
        assert!(!session.document().find("a").unwrap().is_selected());
        assert!(session.document().find("b").unwrap().is_selected());
        assert!(!session.markup().contains("mosaic-selected"));
    }

    #[test]
    fn test_removed_nodes_leave_the_selection() {
        let mut session = session("<div id=\"a\"><p id=\"b\">x</p></div>");
        session.select("a", false).unwrap();
        session.select("b", true).unwrap();

        assert_eq!(session.delete_selection().unwrap(), 1);
        assert!(session.selection().is_empty());
        assert_eq!(session.markup(), "");
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_no_op_mutation_skips_history() {
        let mut session = session("<p id=\"a\">x</p>");
        let outcome = session
            .apply(Mutation::MoveAdjacent {
                node_id: "a".into(),
                direction: Direction::Up,
            })
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_unsafe_wrap_signals_warning() {
        let log = NoticeLog::new();
        let mut session =
            session("<div id=\"d\"><p id=\"p\">x</p></div>").with_notifier(Box::new(log.clone()));
        session.select("d", false).unwrap();

        let err = session.wrap_inline("span").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::UnsafeWrap);
        assert_eq!(log.last().unwrap().level, NoticeLevel::Warning);
    }

    #[test]
    fn test_set_id_follows_selection() {
        let mut session = session("<p id=\"a\">x</p>");
        session.select("a", false).unwrap();
        session
            .apply(Mutation::SetId {
                node_id: "a".into(),
                id: "intro".into(),
            })
            .unwrap();
        assert_eq!(session.selection(), ["intro"]);
    }

    #[test]
    fn test_failed_undo_keeps_cursor_and_tree() {
        let mut session = session("<p id=\"a\">x</p>");
        session.history.snapshot("<div".to_string());
        session
            .apply(Mutation::SetText {
                node_id: "a".into(),
                text: "y".into(),
                confirm_discard: false,
            })
            .unwrap();
        assert_eq!(session.history().cursor(), 2);

        let err = session.undo().unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::ParseFailure);
        assert_eq!(session.history().cursor(), 2);
        assert!(!session.can_redo());
        assert_eq!(session.markup(), "<p id=\"a\">y</p>\n");
    }

    #[test]
    fn test_failed_redo_keeps_cursor_and_tree() {
        let mut session = session("<p id=\"a\">x</p>");
        session.history.snapshot("<div".to_string());
        session.history.undo();

        assert!(session.redo().is_err());
        assert_eq!(session.history().cursor(), 0);
        assert!(session.can_redo());
        assert_eq!(session.markup(), "<p id=\"a\">x</p>\n");
    }

    #[test]
    fn test_partial_delete_is_still_committed() {
        let mut session = session("<p id=\"a\">x</p><p id=\"b\">y</p>");
        session
            .selection
            .set(vec!["a".to_string(), "canvas".to_string(), "b".to_string()]);

        let err = session.delete_selection().unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::NotFound);

        // "a" went before the failure; the removal is in history
        assert!(!session.document().contains("a"));
        assert!(session.document().contains("b"));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.selection(), ["b"]);
        assert!(session.document().find("b").unwrap().is_selected());

        session.undo().unwrap();
        assert!(session.document().contains("a"));
    }

    #[test]
    fn test_custom_indent() {
        let config = EditorConfig {
            indent: "\t".to_string(),
            ..EditorConfig::default()
        };
        let session =
            EditSession::from_markup("<div id=\"a\"><p id=\"b\">x</p></div>", config).unwrap();
        assert_eq!(
            session.markup(),
            "<div id=\"a\">\n\t<p id=\"b\">x</p>\n</div>\n"
        );
    }
}
