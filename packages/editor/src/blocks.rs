use indexmap::IndexMap;
use mosaic_markup::Node;

/// Named subtrees saved for reuse, in the order they were first saved.
///
/// Like clipboard copies, blocks are stored without ids or selection
/// markers, so every drop receives fresh ids from the document.
#[derive(Debug, Clone, Default)]
pub struct BlockLibrary {
    blocks: IndexMap<String, Node>,
}

impl BlockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a copy of `node` under `name`. Returns true when it replaced a
    /// block of the same name.
    pub fn save(&mut self, name: &str, node: &Node) -> bool {
        let mut copy = node.clone();
        copy.walk_mut(&mut |n| {
            n.id.clear();
            n.set_selected(false);
        });
        self.blocks.insert(name.to_string(), copy).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.blocks.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.blocks.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
