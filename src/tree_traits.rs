//! Rendering of subtrees as `termtree` trees.

use std::fmt::Display;

use termtree::Tree;
use tracing::instrument;

use crate::domain::{Forest, NodeRef};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl<T: Display> TreeNodeConvert for NodeRef<'_, T> {
    #[instrument(level = "debug", skip(self), fields(id = %self.id()))]
    fn to_tree_string(&self) -> Tree<String> {
        // Recursively construct the children
        let leaves: Vec<_> = self.children().map(|c| c.to_tree_string()).collect();

        Tree::new(self.value().to_string()).with_leaves(leaves)
    }
}

/// Several roots hang under a "." node.
impl<T: Display> TreeNodeConvert for Forest<T> {
    fn to_tree_string(&self) -> Tree<String> {
        let mut roots = self.roots().peekable();
        match roots.next() {
            Some(first) if roots.peek().is_none() => first.to_tree_string(),
            Some(first) => {
                let mut forest = Tree::new(".".to_string());
                forest.push(first.to_tree_string());
                for root in roots {
                    forest.push(root.to_tree_string());
                }
                forest
            }
            None => Tree::new("Empty forest".to_string()),
        }
    }
}
