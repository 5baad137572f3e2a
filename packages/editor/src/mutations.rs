//! # Tree Mutations
//!
//! Structural and field-level operations on a canvas [`Document`].
//!
//! ## Contract
//!
//! 1. **Validated first**: `apply` runs `validate` before touching the tree,
//!    so a failed mutation leaves the document exactly as it was
//! 2. **Reported**: success returns a [`MutationOutcome`] saying whether the
//!    tree changed and which node (if any) was created
//! 3. **Ids stay unique**: inserted, pasted and duplicated subtrees receive
//!    fresh ids from the document
//! 4. **Markup reads back**: names, class tokens and style declarations that
//!    would serialize into something the parser reads differently are
//!    rejected or normalized, so serializing and re-parsing the tree gives
//!    the same tree
//!
//! The canvas root can be a parent or a target, never an operand: removing,
//! moving, wrapping or editing the root fails with `NotFound`.

use crate::errors::MutationError;
use indexmap::IndexSet;
use mosaic_markup::{
    is_raw_text, is_valid_attribute_name, is_valid_tag_name, normalize_style_declaration,
    parse_style_declarations, ContentModel, Document, Node, TemplateCatalog, MANAGED_CLASS,
    SELECTED_CLASS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Placement relative to a target node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    /// Sibling preceding the target
    Before,
    /// Sibling following the target
    After,
    /// Last child of the target
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Where a pasted subtree lands relative to the paste target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PastePlacement {
    /// Inside the target when it can hold children, after it otherwise
    #[default]
    IntoContainer,
    /// Always after the target (inside only for the canvas root)
    AfterTarget,
}

/// Collaborators a mutation may consult while it is applied
pub struct MutationContext<'a> {
    pub catalog: &'a dyn TemplateCatalog,
    pub paste_placement: PastePlacement,
}

impl<'a> MutationContext<'a> {
    pub fn new(catalog: &'a dyn TemplateCatalog) -> Self {
        Self {
            catalog,
            paste_placement: PastePlacement::default(),
        }
    }

    pub fn with_paste_placement(mut self, placement: PastePlacement) -> Self {
        self.paste_placement = placement;
        self
    }
}

/// Operations on the canvas tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Splice a node into a parent at `index` (end when absent)
    InsertNode {
        parent_id: String,
        #[serde(default)]
        index: Option<usize>,
        node: Node,
    },

    /// Build a node from a palette template and drop it on `target_id`.
    /// A void target receives the node as its next sibling.
    CreateElement {
        template: String,
        target_id: String,
        #[serde(default)]
        index: Option<usize>,
    },

    RemoveNode {
        node_id: String,
    },

    /// Reparent a node relative to a target
    MoveNode {
        node_id: String,
        target_id: String,
        position: DropPosition,
    },

    /// Group siblings under a new wrapper element
    WrapSiblings {
        tag: String,
        node_ids: Vec<String>,
    },

    /// Move a node's text and children into a new inline child
    WrapInlineContent {
        node_id: String,
        tag: String,
    },

    /// Insert a copy of `subtree` (with fresh ids) at `target_id`
    PasteSubtree {
        subtree: Node,
        target_id: String,
    },

    /// Copy a node (fresh ids) and insert it as the next sibling
    Duplicate {
        node_id: String,
    },

    /// Swap a node with its previous or next sibling
    MoveAdjacent {
        node_id: String,
        direction: Direction,
    },

    /// Set an inline style property; an empty value removes it
    SetStyle {
        node_id: String,
        property: String,
        value: String,
    },

    SetAttribute {
        node_id: String,
        name: String,
        value: String,
    },

    RemoveAttribute {
        node_id: String,
        name: String,
    },

    /// Replace the user classes (editor markers are kept). Entries holding
    /// whitespace are split into separate classes.
    SetClasses {
        node_id: String,
        classes: Vec<String>,
    },

    SetId {
        node_id: String,
        id: String,
    },

    /// Replace the text payload. Discarding children needs `confirm_discard`.
    /// Whitespace-only text clears the payload.
    SetText {
        node_id: String,
        text: String,
        #[serde(default)]
        confirm_discard: bool,
    },

    /// Remove a node but keep its content in place
    Unwrap {
        node_id: String,
    },
}

/// Result of a successful mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// False when the operation was a valid no-op
    pub changed: bool,

    /// Id of the node the operation created, if any
    pub created: Option<String>,
}

impl MutationOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            created: None,
        }
    }

    pub fn created(id: String) -> Self {
        Self {
            changed: true,
            created: Some(id),
        }
    }
}

impl Mutation {
    /// Short operation name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNode { .. } => "insert_node",
            Mutation::CreateElement { .. } => "create_element",
            Mutation::RemoveNode { .. } => "remove_node",
            Mutation::MoveNode { .. } => "move_node",
            Mutation::WrapSiblings { .. } => "wrap_siblings",
            Mutation::WrapInlineContent { .. } => "wrap_inline_content",
            Mutation::PasteSubtree { .. } => "paste_subtree",
            Mutation::Duplicate { .. } => "duplicate",
            Mutation::MoveAdjacent { .. } => "move_adjacent",
            Mutation::SetStyle { .. } => "set_style",
            Mutation::SetAttribute { .. } => "set_attribute",
            Mutation::RemoveAttribute { .. } => "remove_attribute",
            Mutation::SetClasses { .. } => "set_classes",
            Mutation::SetId { .. } => "set_id",
            Mutation::SetText { .. } => "set_text",
            Mutation::Unwrap { .. } => "unwrap",
        }
    }

    /// Apply mutation to the document with validation
    pub fn apply(
        &self,
        doc: &mut Document,
        ctx: &MutationContext<'_>,
    ) -> Result<MutationOutcome, MutationError> {
        // Validate first
        self.validate(doc, ctx)?;

        match self {
            Mutation::InsertNode {
                parent_id,
                index,
                node,
            } => Self::apply_insert(doc, parent_id, *index, node),

            Mutation::CreateElement {
                template,
                target_id,
                index,
            } => Self::apply_create(doc, ctx, template, target_id, *index),

            Mutation::RemoveNode { node_id } => {
                doc.detach(node_id).ok_or_else(|| not_found(node_id))?;
                Ok(MutationOutcome::changed())
            }

            Mutation::MoveNode {
                node_id,
                target_id,
                position,
            } => Self::apply_move(doc, node_id, target_id, *position),

            Mutation::WrapSiblings { tag, node_ids } => {
                Self::apply_wrap_siblings(doc, tag, node_ids)
            }

            Mutation::WrapInlineContent { node_id, tag } => {
                Self::apply_wrap_inline(doc, node_id, tag)
            }

            Mutation::PasteSubtree { subtree, target_id } => {
                Self::apply_paste(doc, ctx, subtree, target_id)
            }

            Mutation::Duplicate { node_id } => Self::apply_duplicate(doc, node_id),

            Mutation::MoveAdjacent { node_id, direction } => {
                Self::apply_move_adjacent(doc, node_id, *direction)
            }

            Mutation::SetStyle {
                node_id,
                property,
                value,
            } => Self::apply_set_style(doc, node_id, property, value),

            Mutation::SetAttribute {
                node_id,
                name,
                value,
            } => Self::apply_set_attribute(doc, node_id, name, value),

            Mutation::RemoveAttribute { node_id, name } => {
                Self::apply_remove_attribute(doc, node_id, name)
            }

            Mutation::SetClasses { node_id, classes } => {
                let node = doc.find_mut(node_id).ok_or_else(|| not_found(node_id))?;
                Ok(outcome(replace_classes(
                    node,
                    classes.iter().flat_map(|class| class.split_ascii_whitespace()),
                )))
            }

            Mutation::SetId { node_id, id } => Self::apply_set_id(doc, node_id, id),

            Mutation::SetText { node_id, text, .. } => Self::apply_set_text(doc, node_id, text),

            Mutation::Unwrap { node_id } => Self::apply_unwrap(doc, node_id),
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document, ctx: &MutationContext<'_>) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNode {
                parent_id, node, ..
            } => {
                container(doc, parent_id)?;
                check_subtree(node)
            }

            Mutation::CreateElement {
                template,
                target_id,
                ..
            } => {
                let template = ctx
                    .catalog
                    .template(template)
                    .ok_or_else(|| MutationError::UnknownTemplate(template.clone()))?;
                target(doc, target_id)?;
                // Configured templates are not trusted to produce readable markup
                check_subtree(&template.instantiate(&mut |_| String::new()))
            }

            Mutation::RemoveNode { node_id }
            | Mutation::Duplicate { node_id }
            | Mutation::MoveAdjacent { node_id, .. }
            | Mutation::RemoveAttribute { node_id, .. }
            | Mutation::SetClasses { node_id, .. }
            | Mutation::Unwrap { node_id } => {
                operand(doc, node_id)?;
                Ok(())
            }

            Mutation::MoveNode {
                node_id,
                target_id,
                position,
            } => {
                operand(doc, node_id)?;
                let target_node = target(doc, target_id)?;

                match position {
                    DropPosition::Inside => {
                        if doc.would_create_cycle(node_id, target_id) {
                            return Err(MutationError::CyclicMove {
                                node_id: node_id.clone(),
                                target_id: target_id.clone(),
                            });
                        }
                        if !target_node.is_container() {
                            return Err(MutationError::InvalidContainer(target_id.clone()));
                        }
                    }
                    DropPosition::Before | DropPosition::After => {
                        if node_id == target_id {
                            return Ok(());
                        }
                        // Siblings of the root would have no parent
                        if doc.is_root(target_id) {
                            return Err(not_found(&format!("parent of {}", target_id)));
                        }
                        let parent = doc.parent_of(target_id).ok_or_else(|| not_found(target_id))?;
                        if doc.would_create_cycle(node_id, &parent.id) {
                            return Err(MutationError::CyclicMove {
                                node_id: node_id.clone(),
                                target_id: target_id.clone(),
                            });
                        }
                    }
                }
                Ok(())
            }

            Mutation::WrapSiblings { tag, .. } => check_wrapper_tag(tag),

            Mutation::WrapInlineContent { node_id, tag } => {
                let node = operand(doc, node_id)?;
                if !node.is_container() {
                    return Err(MutationError::InvalidContainer(node_id.clone()));
                }
                check_wrapper_tag(tag)?;
                if let Some(block) = node.children.iter().find(|child| child.is_block()) {
                    return Err(MutationError::UnsafeWrap {
                        node_id: node_id.clone(),
                        child_tag: block.tag.clone(),
                    });
                }
                Ok(())
            }

            Mutation::PasteSubtree { subtree, target_id } => {
                target(doc, target_id)?;
                check_subtree(subtree)
            }

            Mutation::SetStyle {
                node_id,
                property,
                value,
            } => {
                operand(doc, node_id)?;
                if property.trim().is_empty() || value.trim().is_empty() {
                    return Ok(());
                }
                normalize_style_declaration(property, value)
                    .map(|_| ())
                    .ok_or_else(|| invalid_style(property, value))
            }

            Mutation::SetAttribute { node_id, name, value } => {
                operand(doc, node_id)?;
                let name = name.trim().to_ascii_lowercase();
                match name.as_str() {
                    "id" => check_new_id(doc, node_id, value),
                    "" | "class" | "style" => Ok(()),
                    _ if is_valid_attribute_name(&name) => Ok(()),
                    _ => Err(MutationError::InvalidName(name)),
                }
            }

            Mutation::SetId { node_id, id } => {
                operand(doc, node_id)?;
                check_new_id(doc, node_id, id)
            }

            Mutation::SetText {
                node_id,
                confirm_discard,
                ..
            } => {
                let node = operand(doc, node_id)?;
                if node.is_void() {
                    return Err(MutationError::InvalidContainer(node_id.clone()));
                }
                if !node.children.is_empty() && !confirm_discard {
                    return Err(MutationError::WouldDiscardChildren {
                        node_id: node_id.clone(),
                        children: node.children.len(),
                    });
                }
                Ok(())
            }
        }
    }

    fn apply_insert(
        doc: &mut Document,
        parent_id: &str,
        index: Option<usize>,
        node: &Node,
    ) -> Result<MutationOutcome, MutationError> {
        let mut node = node.clone();
        claim_ids(doc, &mut node);

        let id = node.id.clone();
        doc.attach(parent_id, index.unwrap_or(usize::MAX), node)
            .map_err(|_| MutationError::InvalidContainer(parent_id.to_string()))?;
        Ok(MutationOutcome::created(id))
    }

    fn apply_create(
        doc: &mut Document,
        ctx: &MutationContext<'_>,
        key: &str,
        target_id: &str,
        index: Option<usize>,
    ) -> Result<MutationOutcome, MutationError> {
        let template = ctx
            .catalog
            .template(key)
            .ok_or_else(|| MutationError::UnknownTemplate(key.to_string()))?;

        let target_is_container = doc
            .find(target_id)
            .map(Node::is_container)
            .ok_or_else(|| not_found(target_id))?;

        let (parent_id, index) = if target_is_container {
            (target_id.to_string(), index.unwrap_or(usize::MAX))
        } else {
            let (parent_id, position) = doc.locate(target_id).ok_or_else(|| not_found(target_id))?;
            (parent_id, position + 1)
        };

        let node = template.instantiate(&mut |tag| doc.fresh_id(tag));
        let id = node.id.clone();
        doc.attach(&parent_id, index, node)
            .map_err(|_| MutationError::InvalidContainer(parent_id.clone()))?;
        Ok(MutationOutcome::created(id))
    }

    fn apply_move(
        doc: &mut Document,
        node_id: &str,
        target_id: &str,
        position: DropPosition,
    ) -> Result<MutationOutcome, MutationError> {
        if node_id == target_id {
            return Ok(MutationOutcome::unchanged());
        }

        let origin = doc.locate(node_id).ok_or_else(|| not_found(node_id))?;
        let node = doc.detach(node_id).ok_or_else(|| not_found(node_id))?;

        let destination = match position {
            DropPosition::Inside => Some((target_id.to_string(), usize::MAX)),
            DropPosition::Before => doc.locate(target_id),
            DropPosition::After => doc.locate(target_id).map(|(parent, i)| (parent, i + 1)),
        };

        let Some((parent_id, index)) = destination else {
            let _ = doc.attach(&origin.0, origin.1, node);
            return Err(not_found(target_id));
        };

        if let Err(node) = doc.attach(&parent_id, index, node) {
            let _ = doc.attach(&origin.0, origin.1, node);
            return Err(MutationError::InvalidContainer(parent_id));
        }

        Ok(outcome(doc.locate(node_id) != Some(origin)))
    }

    fn apply_wrap_siblings(
        doc: &mut Document,
        tag: &str,
        node_ids: &[String],
    ) -> Result<MutationOutcome, MutationError> {
        let mut existing = node_ids
            .iter()
            .filter(|id| !doc.is_root(id))
            .filter_map(|id| doc.locate(id).map(|(parent, index)| (id, parent, index)));

        let Some((first, anchor, first_index)) = existing.next() else {
            return Ok(MutationOutcome::unchanged());
        };

        let mut members = vec![(first_index, first.clone())];
        for (id, parent, index) in existing {
            if parent != anchor {
                tracing::debug!(node = %id, "skipping node outside the wrap anchor's parent");
                continue;
            }
            if !members.iter().any(|(_, member)| member == id) {
                members.push((index, id.clone()));
            }
        }
        members.sort_by_key(|(index, _)| *index);

        let tag = tag.trim().to_ascii_lowercase();
        let insert_at = members[0].0;
        let mut wrapper = Node::new(tag.as_str(), doc.fresh_id(&tag));

        // Detach from the back so earlier indexes stay valid
        let mut moved = Vec::with_capacity(members.len());
        for (_, id) in members.iter().rev() {
            if let Some(node) = doc.detach(id) {
                moved.push(node);
            }
        }
        moved.reverse();
        wrapper.children = moved;

        let id = wrapper.id.clone();
        doc.attach(&anchor, insert_at, wrapper)
            .map_err(|_| MutationError::InvalidContainer(anchor.clone()))?;
        Ok(MutationOutcome::created(id))
    }

    fn apply_wrap_inline(
        doc: &mut Document,
        node_id: &str,
        tag: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let has_content = doc
            .find(node_id)
            .map(Node::has_content)
            .ok_or_else(|| not_found(node_id))?;
        if !has_content {
            return Ok(MutationOutcome::unchanged());
        }

        let tag = tag.trim().to_ascii_lowercase();
        let span_id = doc.fresh_id(&tag);
        let node = doc.find_mut(node_id).ok_or_else(|| not_found(node_id))?;

        let mut span = Node::new(tag, span_id.clone());
        span.text = std::mem::take(&mut node.text);
        span.children = std::mem::take(&mut node.children);
        node.children.push(span);

        Ok(MutationOutcome::created(span_id))
    }

    fn apply_paste(
        doc: &mut Document,
        ctx: &MutationContext<'_>,
        subtree: &Node,
        target_id: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let inside = {
            let target = doc.find(target_id).ok_or_else(|| not_found(target_id))?;
            doc.is_root(target_id)
                || match ctx.paste_placement {
                    PastePlacement::IntoContainer => target.is_container(),
                    PastePlacement::AfterTarget => false,
                }
        };

        let (parent_id, index) = if inside {
            (target_id.to_string(), usize::MAX)
        } else {
            let (parent_id, position) = doc.locate(target_id).ok_or_else(|| not_found(target_id))?;
            (parent_id, position + 1)
        };

        let mut copy = subtree.deep_clone(&mut |tag| doc.fresh_id(tag));
        copy.walk_mut(&mut |node| {
            normalize_node(node);
            node.mark_managed();
        });

        let id = copy.id.clone();
        doc.attach(&parent_id, index, copy)
            .map_err(|_| MutationError::InvalidContainer(parent_id.clone()))?;
        Ok(MutationOutcome::created(id))
    }

    fn apply_duplicate(doc: &mut Document, node_id: &str) -> Result<MutationOutcome, MutationError> {
        let original = doc.find(node_id).cloned().ok_or_else(|| not_found(node_id))?;
        let (parent_id, index) = doc.locate(node_id).ok_or_else(|| not_found(node_id))?;

        let copy = original.deep_clone(&mut |tag| doc.fresh_id(tag));
        let id = copy.id.clone();
        doc.attach(&parent_id, index + 1, copy)
            .map_err(|_| MutationError::InvalidContainer(parent_id.clone()))?;
        Ok(MutationOutcome::created(id))
    }

    fn apply_move_adjacent(
        doc: &mut Document,
        node_id: &str,
        direction: Direction,
    ) -> Result<MutationOutcome, MutationError> {
        let parent = doc.parent_of_mut(node_id).ok_or_else(|| not_found(node_id))?;
        let index = parent.child_index(node_id).ok_or_else(|| not_found(node_id))?;

        let other = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < parent.children.len() => index + 1,
            _ => return Ok(MutationOutcome::unchanged()),
        };

        parent.children.swap(index, other);
        Ok(MutationOutcome::changed())
    }

    fn apply_set_style(
        doc: &mut Document,
        node_id: &str,
        property: &str,
        value: &str,
    ) -> Result<MutationOutcome, MutationError> {
        if property.trim().is_empty() {
            return Ok(MutationOutcome::unchanged());
        }

        let node = doc.find_mut(node_id).ok_or_else(|| not_found(node_id))?;
        let changed = if value.trim().is_empty() {
            node.style
                .shift_remove(&property.trim().to_ascii_lowercase())
                .is_some()
        } else {
            let (property, value) = normalize_style_declaration(property, value)
                .ok_or_else(|| invalid_style(property, value))?;
            node.style.insert(property, value.clone()) != Some(value)
        };
        Ok(outcome(changed))
    }

    fn apply_set_attribute(
        doc: &mut Document,
        node_id: &str,
        name: &str,
        value: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let name = name.trim().to_ascii_lowercase();
        if name == "id" {
            return Self::apply_set_id(doc, node_id, value);
        }

        let node = doc.find_mut(node_id).ok_or_else(|| not_found(node_id))?;
        let changed = match name.as_str() {
            "" => false,
            "class" => replace_classes(node, value.split_ascii_whitespace()),
            "style" => {
                let style = parse_style_declarations(value);
                let changed = !style.iter().eq(node.style.iter());
                node.style = style;
                changed
            }
            _ => node.attributes.insert(name, value.to_string()).as_deref() != Some(value),
        };
        Ok(outcome(changed))
    }

    fn apply_remove_attribute(
        doc: &mut Document,
        node_id: &str,
        name: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let name = name.trim().to_ascii_lowercase();
        let node = doc.find_mut(node_id).ok_or_else(|| not_found(node_id))?;

        let changed = match name.as_str() {
            "class" => replace_classes(node, std::iter::empty()),
            "style" => {
                let changed = !node.style.is_empty();
                node.style.clear();
                changed
            }
            // Every node keeps an id
            "id" => false,
            _ => node.attributes.shift_remove(&name).is_some(),
        };
        Ok(outcome(changed))
    }

    fn apply_set_id(doc: &mut Document, node_id: &str, id: &str) -> Result<MutationOutcome, MutationError> {
        let id = id.trim();
        if id == node_id {
            return Ok(MutationOutcome::unchanged());
        }
        let node = doc.find_mut(node_id).ok_or_else(|| not_found(node_id))?;
        node.id = id.to_string();
        Ok(MutationOutcome::changed())
    }

    fn apply_set_text(doc: &mut Document, node_id: &str, text: &str) -> Result<MutationOutcome, MutationError> {
        let node = doc.find_mut(node_id).ok_or_else(|| not_found(node_id))?;

        let discarded = node.children.len();
        if discarded > 0 {
            tracing::info!(node = %node_id, discarded, "text edit replaced child nodes");
            node.children.clear();
        }

        // Markup cannot carry a whitespace-only payload
        let text = if text.trim().is_empty() { "" } else { text };
        let changed = discarded > 0 || node.text != text;
        node.text = text.to_string();
        Ok(outcome(changed))
    }

    fn apply_unwrap(doc: &mut Document, node_id: &str) -> Result<MutationOutcome, MutationError> {
        let (parent_id, index) = doc.locate(node_id).ok_or_else(|| not_found(node_id))?;

        // Issued before detaching so it cannot collide with the node's subtree
        let has_text = doc
            .find(node_id)
            .map(|node| !node.text.trim().is_empty())
            .unwrap_or(false);
        let span_id = if has_text {
            Some(doc.fresh_id("span"))
        } else {
            None
        };

        let node = doc.detach(node_id).ok_or_else(|| not_found(node_id))?;

        let mut content = Vec::with_capacity(node.children.len() + 1);
        if let Some(span_id) = &span_id {
            content.push(Node::new("span", span_id.clone()).with_text(node.text));
        }
        content.extend(node.children);

        let parent = doc.find_mut(&parent_id).ok_or_else(|| not_found(&parent_id))?;
        parent.children.splice(index..index, content);

        Ok(MutationOutcome {
            changed: true,
            created: span_id,
        })
    }
}

fn not_found(id: &str) -> MutationError {
    MutationError::NotFound(id.to_string())
}

fn outcome(changed: bool) -> MutationOutcome {
    if changed {
        MutationOutcome::changed()
    } else {
        MutationOutcome::unchanged()
    }
}

/// An existing node that may be edited, moved or removed (never the root)
fn operand<'d>(doc: &'d Document, id: &str) -> Result<&'d Node, MutationError> {
    if doc.is_root(id) {
        return Err(not_found(id));
    }
    doc.find(id).ok_or_else(|| not_found(id))
}

/// An existing node used as a parent or drop target (the root included)
fn target<'d>(doc: &'d Document, id: &str) -> Result<&'d Node, MutationError> {
    doc.find(id).ok_or_else(|| not_found(id))
}

fn container<'d>(doc: &'d Document, id: &str) -> Result<&'d Node, MutationError> {
    let node = target(doc, id)?;
    if node.is_container() {
        Ok(node)
    } else {
        Err(MutationError::InvalidContainer(id.to_string()))
    }
}

fn invalid_style(property: &str, value: &str) -> MutationError {
    MutationError::InvalidStyle {
        property: property.trim().to_string(),
        value: value.trim().to_string(),
    }
}

/// A wrapper must be a nameable element that can hold markup children
fn check_wrapper_tag(tag: &str) -> Result<(), MutationError> {
    let tag = tag.trim();
    if !is_valid_tag_name(tag) {
        return Err(MutationError::InvalidName(tag.to_string()));
    }
    if ContentModel::of(tag) == ContentModel::Void || is_raw_text(tag) {
        return Err(MutationError::InvalidContainer(tag.to_string()));
    }
    Ok(())
}

/// Reject incoming subtrees that could not be written as markup and read
/// back: bad names, class tokens or style pairs, and childful void or
/// raw-text nodes
fn check_subtree(node: &Node) -> Result<(), MutationError> {
    let mut first_error = None;
    node.walk(&mut |n| {
        if first_error.is_none() {
            first_error = check_node(n).err();
        }
    });
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn check_node(node: &Node) -> Result<(), MutationError> {
    if !is_valid_tag_name(&node.tag) {
        return Err(MutationError::InvalidName(node.tag.clone()));
    }
    if !node.children.is_empty() && (node.is_void() || is_raw_text(&node.tag)) {
        let name = if node.id.is_empty() { &node.tag } else { &node.id };
        return Err(MutationError::InvalidContainer(name.clone()));
    }

    for name in node.attributes.keys() {
        let reserved = matches!(name.to_ascii_lowercase().as_str(), "id" | "class" | "style");
        if reserved || !is_valid_attribute_name(name) {
            return Err(MutationError::InvalidName(name.clone()));
        }
    }
    if let Some(class) = node
        .classes
        .iter()
        .find(|class| class.is_empty() || class.contains(|c: char| c.is_ascii_whitespace()))
    {
        return Err(MutationError::InvalidName(class.clone()));
    }
    for (property, value) in &node.style {
        let reads_back = matches!(
            normalize_style_declaration(property, value),
            Some((p, v)) if p == *property && v == *value
        );
        if !reads_back {
            return Err(invalid_style(property, value));
        }
    }
    Ok(())
}

/// Lowercase names and fold text the way the parser would read it back
fn normalize_node(node: &mut Node) {
    node.tag.make_ascii_lowercase();
    if node.attributes.keys().any(|name| name.bytes().any(|b| b.is_ascii_uppercase())) {
        node.attributes = std::mem::take(&mut node.attributes)
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
    }
    if node.text.trim().is_empty() {
        node.text.clear();
    } else if !node.children.is_empty() {
        node.text = node.text.trim().to_string();
    }
}

fn check_new_id(doc: &Document, node_id: &str, id: &str) -> Result<(), MutationError> {
    let id = id.trim();
    if id.is_empty() || id.contains(char::is_whitespace) {
        return Err(MutationError::InvalidId(id.to_string()));
    }
    if id != node_id && doc.contains(id) {
        return Err(MutationError::DuplicateId(id.to_string()));
    }
    Ok(())
}

/// Give an incoming subtree managed markers and ids unused in `doc`.
///
/// Ids the subtree brings along are kept when free. All of them are reserved
/// before any fresh id is issued, so a generated id never repeats one that
/// appears later in the subtree.
fn claim_ids(doc: &mut Document, node: &mut Node) {
    let mut kept: HashSet<String> = HashSet::new();
    node.walk_mut(&mut |n| {
        normalize_node(n);
        n.mark_managed();
        n.set_selected(false);

        let id = n.id.trim().to_string();
        let usable = !id.is_empty() && !id.contains(char::is_whitespace);
        if !usable || doc.contains(&id) || kept.contains(&id) {
            n.id.clear();
        } else {
            kept.insert(id.clone());
            n.id = id;
        }
    });

    node.walk_mut(&mut |n| {
        if n.id.is_empty() {
            let mut id = doc.fresh_id(&n.tag);
            while kept.contains(&id) {
                id = doc.fresh_id(&n.tag);
            }
            kept.insert(id.clone());
            n.id = id;
        }
    });
}

fn is_marker(class: &str) -> bool {
    class == MANAGED_CLASS || class == SELECTED_CLASS
}

/// Replace user classes, keeping editor markers. Returns whether the
/// class list changed.
fn replace_classes<'c>(node: &mut Node, classes: impl Iterator<Item = &'c str>) -> bool {
    let mut next: IndexSet<String> = node
        .classes
        .iter()
        .filter(|class| is_marker(class))
        .cloned()
        .collect();
    for class in classes {
        if !is_marker(class) {
            next.insert(class.to_string());
        }
    }

    let changed = !next.iter().eq(node.classes.iter());
    node.classes = next;
    changed
}
