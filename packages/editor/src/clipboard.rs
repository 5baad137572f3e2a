use mosaic_markup::Node;

/// Holds at most one copied subtree.
///
/// Copies are stored without ids or selection markers; every paste gets
/// fresh ids from the document.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    content: Option<Node>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clipboard content with a copy of `node`
    pub fn copy(&mut self, node: &Node) {
        let mut copy = node.clone();
        copy.walk_mut(&mut |n| {
            n.id.clear();
            n.set_selected(false);
        });
        self.content = Some(copy);
    }

    pub fn content(&self) -> Option<&Node> {
        self.content.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    pub fn clear(&mut self) {
        self.content = None;
    }
}
