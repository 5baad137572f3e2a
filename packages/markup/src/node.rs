//! # Node Model
//!
//! The typed tree entity edited on the canvas.
//!
//! Every node carries a tag, a document-unique id, an ordered class set,
//! ordered attribute and style maps, ordered children and a direct text
//! payload. The tag decides the node's [`ContentModel`]: void nodes never
//! own children, block nodes are structural containers, everything else is
//! inline content.
//!
//! Two class markers are reserved for the editor:
//! - [`MANAGED_CLASS`] marks nodes the editor owns (selectable, draggable)
//! - [`SELECTED_CLASS`] mirrors the current selection and is transient
//!
//! Neither marker is ever written to serialized markup.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Membership marker carried by every editor-managed node
pub const MANAGED_CLASS: &str = "mosaic-node";

/// Transient marker mirrored from the selection
pub const SELECTED_CLASS: &str = "mosaic-selected";

/// Tag of the canvas root
pub const ROOT_TAG: &str = "body";

/// Id of the canvas root
pub const ROOT_ID: &str = "canvas";

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "details", "dialog", "dd", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Elements whose content is raw text, never markup
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Whether an element's content is raw text (`script`, `style`)
pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Whether `tag` lexes as an element name: an ASCII letter followed by
/// letters, digits, `:`, `_`, `.` or `-`
pub fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '-')),
        _ => false,
    }
}

/// Whether `name` lexes back as a single attribute name
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '=' | '/')
        })
}

/// Whether a tag may own children, and how it nests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentModel {
    /// Never owns children (img, input, br, ...)
    Void,
    /// Structural container (div, section, p, ...)
    Block,
    /// Phrasing content (span, a, button, ...)
    Inline,
}

impl ContentModel {
    /// Classify a tag name (case-insensitive)
    pub fn of(tag: &str) -> Self {
        if VOID_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            ContentModel::Void
        } else if BLOCK_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            ContentModel::Block
        } else {
            ContentModel::Inline
        }
    }

    pub fn is_container(self) -> bool {
        !matches!(self, ContentModel::Void)
    }
}

/// A single element on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Element kind, always lowercase
    pub tag: String,

    /// Unique across the whole tree; empty only before rehydration
    #[serde(default)]
    pub id: String,

    /// Class tokens, including the editor markers
    #[serde(default)]
    pub classes: IndexSet<String>,

    /// Attributes other than `id`, `class` and `style`
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Inline style declarations
    #[serde(default)]
    pub style: IndexMap<String, String>,

    /// Ordered children (always empty for void nodes)
    #[serde(default)]
    pub children: Vec<Node>,

    /// Direct text payload
    #[serde(default)]
    pub text: String,
}

impl Node {
    /// Create an editor-managed node
    pub fn new(tag: impl Into<String>, id: impl Into<String>) -> Self {
        let mut classes = IndexSet::new();
        classes.insert(MANAGED_CLASS.to_string());

        Self {
            tag: tag.into().to_ascii_lowercase(),
            id: id.into(),
            classes,
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Create a node as read from external markup, before rehydration
    pub fn unmanaged(tag: impl Into<String>) -> Self {
        let mut node = Self::new(tag, String::new());
        node.classes.clear();
        node
    }

    /// Create the canvas root (never managed, never selectable)
    pub fn root() -> Self {
        Self {
            tag: ROOT_TAG.to_string(),
            id: ROOT_ID.to_string(),
            classes: IndexSet::new(),
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    pub fn content_model(&self) -> ContentModel {
        ContentModel::of(&self.tag)
    }

    pub fn is_void(&self) -> bool {
        self.content_model() == ContentModel::Void
    }

    /// Whether the node may own children. Raw-text elements hold text only.
    pub fn is_container(&self) -> bool {
        self.content_model().is_container() && !is_raw_text(&self.tag)
    }

    pub fn is_block(&self) -> bool {
        self.content_model() == ContentModel::Block
    }

    pub fn is_managed(&self) -> bool {
        self.classes.contains(MANAGED_CLASS)
    }

    pub fn is_selected(&self) -> bool {
        self.classes.contains(SELECTED_CLASS)
    }

    pub fn set_selected(&mut self, selected: bool) {
        if selected {
            self.classes.insert(SELECTED_CLASS.to_string());
        } else {
            self.classes.shift_remove(SELECTED_CLASS);
        }
    }

    /// Add the membership marker
    pub fn mark_managed(&mut self) {
        self.classes.insert(MANAGED_CLASS.to_string());
    }

    /// Classes without the editor markers, in insertion order
    pub fn user_classes(&self) -> impl Iterator<Item = &str> {
        self.classes
            .iter()
            .map(String::as_str)
            .filter(|c| *c != MANAGED_CLASS && *c != SELECTED_CLASS)
    }

    /// True if the node has text or children
    pub fn has_content(&self) -> bool {
        !self.text.is_empty() || !self.children.is_empty()
    }

    /// Find a node by id in this subtree (including self)
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Find a node by id in this subtree (including self)
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Find the parent of `id` within this subtree
    pub fn find_parent(&self, id: &str) -> Option<&Node> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_parent(id))
    }

    /// Find the parent of `id` within this subtree
    pub fn find_parent_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_parent_mut(id))
    }

    /// True if `id` is a strict descendant of this node
    pub fn has_descendant(&self, id: &str) -> bool {
        self.children.iter().any(|child| child.find(id).is_some())
    }

    /// Index of the direct child with `id`
    pub fn child_index(&self, id: &str) -> Option<usize> {
        self.children.iter().position(|c| c.id == id)
    }

    /// Visit this node and its descendants in document order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Visit this node and its descendants mutably in document order
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Node)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Descendants (excluding self) in document order
    pub fn descendants(&self) -> Vec<&Node> {
        let mut nodes = Vec::new();
        for child in &self.children {
            child.walk(&mut |n| nodes.push(n));
        }
        nodes
    }

    /// Number of nodes in this subtree, self included
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_size).sum::<usize>()
    }

    /// Remove the selected marker from this subtree
    pub fn clear_transient(&mut self) {
        self.walk_mut(&mut |n| n.set_selected(false));
    }

    /// Replace every id in this subtree with one from `fresh_id`
    pub fn regenerate_ids(&mut self, fresh_id: &mut dyn FnMut(&str) -> String) {
        self.walk_mut(&mut |n| n.id = fresh_id(&n.tag));
    }

    /// Deep copy with regenerated ids and without transient markers
    pub fn deep_clone(&self, fresh_id: &mut dyn FnMut(&str) -> String) -> Node {
        let mut copy = self.clone();
        copy.clear_transient();
        copy.regenerate_ids(fresh_id);
        copy
    }

    /// Inline style rendered as a declaration list (`a: b; c: d`)
    pub fn style_declarations(&self) -> String {
        self.style
            .iter()
            .map(|(property, value)| format!("{}: {}", property, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Parse a `style` attribute value into ordered declarations.
///
/// Semicolons inside parentheses or quotes do not split declarations, so
/// `url("a;b")` survives intact. Declarations without a colon are dropped.
pub fn parse_style_declarations(source: &str) -> IndexMap<String, String> {
    let mut declarations = IndexMap::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    let mut push = |chunk: &str| {
        if let Some((property, value)) = chunk.split_once(':') {
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if !property.is_empty() && !value.is_empty() {
                declarations.insert(property, value.to_string());
            }
        }
    };

    for (i, ch) in source.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push(&source[start..]);

    declarations
}

/// Normalize a single `property: value` pair the way a `style` attribute
/// would read it back. Returns `None` when the pair would parse as anything
/// other than that one declaration (a `;` in the value, a `:` in the name).
pub fn normalize_style_declaration(property: &str, value: &str) -> Option<(String, String)> {
    let property = property.trim().to_ascii_lowercase();
    if property.is_empty() || property.contains(';') {
        return None;
    }

    let mut parsed = parse_style_declarations(&format!("{}: {}", property, value));
    if parsed.len() != 1 {
        return None;
    }
    parsed.shift_remove(&property).map(|value| (property, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_model_classification() {
        assert_eq!(ContentModel::of("img"), ContentModel::Void);
        assert_eq!(ContentModel::of("INPUT"), ContentModel::Void);
        assert_eq!(ContentModel::of("div"), ContentModel::Block);
        assert_eq!(ContentModel::of("span"), ContentModel::Inline);
        assert_eq!(ContentModel::of("button"), ContentModel::Inline);
        assert!(!ContentModel::Void.is_container());
        assert!(ContentModel::Inline.is_container());
    }

    #[test]
    fn test_new_node_is_managed() {
        let node = Node::new("DIV", "div-1");
        assert_eq!(node.tag, "div");
        assert!(node.is_managed());
        assert!(!node.is_selected());
        assert_eq!(node.user_classes().count(), 0);
    }

    #[test]
    fn test_root_is_not_managed() {
        let root = Node::root();
        assert_eq!(root.id, ROOT_ID);
        assert!(!root.is_managed());
    }

    #[test]
    fn test_user_classes_skip_markers() {
        let mut node = Node::new("div", "d").with_class("card");
        node.set_selected(true);
        assert_eq!(node.user_classes().collect::<Vec<_>>(), vec!["card"]);
        node.set_selected(false);
        assert!(!node.is_selected());
    }

    #[test]
    fn test_find_and_parent_lookup() {
        let tree = Node::root().with_child(
            Node::new("div", "a").with_child(Node::new("span", "b").with_text("hi")),
        );

        assert_eq!(tree.find("b").map(|n| n.text.as_str()), Some("hi"));
        assert_eq!(tree.find_parent("b").map(|n| n.id.as_str()), Some("a"));
        assert!(tree.find_parent("canvas").is_none());
        assert!(tree.has_descendant("b"));
        assert!(!tree.find("a").unwrap().has_descendant("a"));
        assert_eq!(tree.subtree_size(), 3);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = Node::root()
            .with_child(Node::new("div", "a").with_child(Node::new("p", "b")))
            .with_child(Node::new("div", "c"));

        let ids: Vec<_> = tree.descendants().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_deep_clone_regenerates_ids_and_drops_selection() {
        let mut original = Node::new("div", "a").with_child(Node::new("p", "b").with_text("x"));
        original.set_selected(true);

        let mut counter = 0;
        let copy = original.deep_clone(&mut |tag| {
            counter += 1;
            format!("{}-copy-{}", tag, counter)
        });

        assert_eq!(copy.id, "div-copy-1");
        assert_eq!(copy.children[0].id, "p-copy-2");
        assert_eq!(copy.children[0].text, "x");
        assert!(!copy.is_selected());
        assert!(copy.is_managed());
        assert!(original.is_selected());
    }

    #[test]
    fn test_parse_style_declarations() {
        let style = parse_style_declarations(
            "padding: 20px; background: url(\"a;b.png\"); ; broken; Color: red",
        );

        assert_eq!(style.len(), 3);
        assert_eq!(style["padding"], "20px");
        assert_eq!(style["background"], "url(\"a;b.png\")");
        assert_eq!(style["color"], "red");
        assert_eq!(
            style.keys().collect::<Vec<_>>(),
            vec!["padding", "background", "color"]
        );
    }

    #[test]
    fn test_normalize_style_declaration() {
        assert_eq!(
            normalize_style_declaration(" Color ", "red;"),
            Some(("color".to_string(), "red".to_string()))
        );
        assert_eq!(
            normalize_style_declaration("background", "url(\"a;b.png\")"),
            Some(("background".to_string(), "url(\"a;b.png\")".to_string()))
        );
        assert_eq!(normalize_style_declaration("color", "red; background: blue"), None);
        assert_eq!(normalize_style_declaration("a:b", "c"), None);
        assert_eq!(normalize_style_declaration("a;b", "c"), None);
        assert_eq!(normalize_style_declaration("color", "  "), None);
    }

    #[test]
    fn test_name_rules_match_the_lexer() {
        assert!(is_valid_tag_name("my-widget"));
        assert!(is_valid_tag_name("svg:rect"));
        assert!(!is_valid_tag_name(""));
        assert!(!is_valid_tag_name("1div"));
        assert!(!is_valid_tag_name("div class"));
        assert!(!is_valid_tag_name("p>"));

        assert!(is_valid_attribute_name("data-role"));
        assert!(is_valid_attribute_name("@click"));
        for name in ["", "\"", "a b", "a=b", "a/", "<x", "it's"] {
            assert!(!is_valid_attribute_name(name), "{:?}", name);
        }
    }

    #[test]
    fn test_raw_text_elements_hold_no_children() {
        assert!(is_raw_text("SCRIPT"));
        assert!(!Node::new("script", "s").is_container());
        assert!(Node::new("span", "s").is_container());
    }

    #[test]
    fn test_style_declarations_render_in_order() {
        let node = Node::new("div", "d")
            .with_style("padding", "20px")
            .with_style("margin", "0 auto");
        assert_eq!(node.style_declarations(), "padding: 20px; margin: 0 auto");
    }
}
