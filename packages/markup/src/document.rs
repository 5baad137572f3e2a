use crate::error::ParseResult;
use crate::id_generator::IdGenerator;
use crate::node::{Node, ROOT_ID};
use crate::parser::parse_fragment;
use crate::rehydrate::rehydrate;
use crate::serializer::Serializer;

/// A canvas tree together with the generator that issues its ids.
///
/// The root is created once and never replaced; loading markup swaps the
/// root's content, not the root itself.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    ids: IdGenerator,
}

impl Document {
    pub fn new() -> Self {
        Self::with_id_generator(IdGenerator::new())
    }

    pub fn with_id_generator(ids: IdGenerator) -> Self {
        Self {
            root: Node::root(),
            ids,
        }
    }

    /// Parse markup into a new document
    pub fn from_markup(source: &str, ids: IdGenerator) -> ParseResult<Self> {
        let mut document = Self::with_id_generator(ids);
        document.load_markup(source)?;
        Ok(document)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn is_root(&self, id: &str) -> bool {
        id == ROOT_ID
    }

    pub fn contains(&self, id: &str) -> bool {
        self.root.find(id).is_some()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.root.find(id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.root.find_mut(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        self.root.find_parent(id)
    }

    pub fn parent_of_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.root.find_parent_mut(id)
    }

    /// Parent id and index of a node within its parent's children
    pub fn locate(&self, id: &str) -> Option<(String, usize)> {
        let parent = self.root.find_parent(id)?;
        let index = parent.child_index(id)?;
        Some((parent.id.clone(), index))
    }

    /// True if placing `node_id` under `parent_id` would nest it in itself
    pub fn would_create_cycle(&self, node_id: &str, parent_id: &str) -> bool {
        if node_id == parent_id {
            return true;
        }
        self.root
            .find(node_id)
            .map(|node| node.has_descendant(parent_id))
            .unwrap_or(false)
    }

    /// Issue an id for `tag` that no node in the tree uses yet
    pub fn fresh_id(&mut self, tag: &str) -> String {
        loop {
            let candidate = self.ids.new_id(tag);
            if self.root.find(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Detach a node from its parent and return it
    pub fn detach(&mut self, id: &str) -> Option<Node> {
        let parent = self.root.find_parent_mut(id)?;
        let index = parent.child_index(id)?;
        Some(parent.children.remove(index))
    }

    /// Insert `node` under `parent_id` at `index` (clamped to the end).
    /// Hands the node back if the parent is missing or void.
    pub fn attach(&mut self, parent_id: &str, index: usize, node: Node) -> Result<(), Node> {
        match self.root.find_mut(parent_id) {
            Some(parent) if parent.is_container() => {
                let index = index.min(parent.children.len());
                parent.children.insert(index, node);
                Ok(())
            }
            _ => Err(node),
        }
    }

    /// Ids of every managed node in document order (the root excluded)
    pub fn managed_ids(&self) -> Vec<String> {
        self.root
            .descendants()
            .into_iter()
            .filter(|node| node.is_managed())
            .map(|node| node.id.clone())
            .collect()
    }

    /// Mirror a selection onto the tree's selected markers
    pub fn mark_selection(&mut self, selected: &[String]) {
        self.root.walk_mut(&mut |node| {
            let is_selected = selected.iter().any(|id| *id == node.id);
            node.set_selected(is_selected);
        });
    }

    /// Replace the canvas content with parsed markup.
    ///
    /// Atomic: on a parse error the current tree is left untouched.
    pub fn load_markup(&mut self, source: &str) -> ParseResult<()> {
        let mut parsed = parse_fragment(source)?;
        let generated = rehydrate(&mut parsed, &mut self.ids);

        tracing::debug!(
            nodes = parsed.subtree_size() - 1,
            generated,
            "loaded markup into document"
        );

        self.root.children = parsed.children;
        self.root.text = parsed.text;
        Ok(())
    }

    pub fn to_markup(&self) -> String {
        Serializer::new().serialize(&self.root)
    }

    pub fn to_markup_with(&self, serializer: &mut Serializer) -> String {
        serializer.serialize(&self.root)
    }

    pub fn to_page(&self, title: &str) -> String {
        Serializer::new().serialize_page(&self.root, title)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_markup(
            r#"<div id="a"><p id="b">one</p><p id="c">two</p></div><img id="d">"#,
            IdGenerator::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_locate_and_parent() {
        let doc = sample();

        assert_eq!(doc.locate("c"), Some(("a".to_string(), 1)));
        assert_eq!(doc.locate("a"), Some(("canvas".to_string(), 0)));
        assert_eq!(doc.locate("canvas"), None);
        assert_eq!(doc.parent_of("b").map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_cycle_detection() {
        let doc = sample();

        assert!(doc.would_create_cycle("a", "a"));
        assert!(doc.would_create_cycle("a", "b"));
        assert!(!doc.would_create_cycle("b", "a"));
        assert!(!doc.would_create_cycle("d", "canvas"));
    }

    #[test]
    fn test_fresh_id_skips_taken_ids() {
        let mut doc = Document::from_markup(r#"<p id="p-1">x</p>"#, IdGenerator::new()).unwrap();
        assert_eq!(doc.fresh_id("p"), "p-2");
    }

    #[test]
    fn test_detach_and_attach() {
        let mut doc = sample();

        let node = doc.detach("b").unwrap();
        assert!(!doc.contains("b"));
        doc.attach("canvas", 99, node).unwrap();
        assert_eq!(doc.locate("b"), Some(("canvas".to_string(), 2)));

        let node = doc.detach("c").unwrap();
        let refused = doc.attach("d", 0, node).unwrap_err();
        assert_eq!(refused.id, "c");
    }

    #[test]
    fn test_managed_ids_and_selection_markers() {
        let mut doc = sample();
        assert_eq!(doc.managed_ids(), vec!["a", "b", "c", "d"]);

        doc.mark_selection(&["b".to_string()]);
        assert!(doc.find("b").unwrap().is_selected());
        assert!(!doc.to_markup().contains("mosaic-selected"));

        doc.mark_selection(&[]);
        assert!(!doc.find("b").unwrap().is_selected());
    }

    #[test]
    fn test_failed_load_leaves_tree_untouched() {
        let mut doc = sample();
        let before = doc.to_markup();

        assert!(doc.load_markup("<div></span>").is_err());
        assert_eq!(doc.to_markup(), before);
    }
}
