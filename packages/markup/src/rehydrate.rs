//! Turn a freshly parsed tree into an editable one.
//!
//! Every non-root node gets the membership marker and a unique id. Explicit
//! ids from the markup are kept unless they collide with an earlier node or
//! with the canvas root, in which case a fresh id is generated.

use crate::id_generator::IdGenerator;
use crate::node::{Node, ROOT_ID};
use std::collections::HashSet;

/// Rehydrate `root` in place. Returns the number of ids that were generated.
pub fn rehydrate(root: &mut Node, ids: &mut IdGenerator) -> usize {
    let mut taken: HashSet<String> = HashSet::new();
    taken.insert(ROOT_ID.to_string());

    // Claim explicit ids first so generated ones never shadow them
    for child in &mut root.children {
        child.walk_mut(&mut |node| {
            if node.id.is_empty() {
                return;
            }
            if !taken.insert(node.id.clone()) {
                tracing::warn!(id = %node.id, tag = %node.tag, "duplicate id in markup, reassigning");
                node.id.clear();
            }
        });
    }

    let mut generated = 0;
    for child in &mut root.children {
        child.walk_mut(&mut |node| {
            if node.id.is_empty() {
                let mut candidate = ids.new_id(&node.tag);
                while taken.contains(&candidate) {
                    candidate = ids.new_id(&node.tag);
                }
                taken.insert(candidate.clone());
                node.id = candidate;
                generated += 1;
            }
            node.mark_managed();
            node.set_selected(false);
        });
    }

    root.set_selected(false);
    generated
}
