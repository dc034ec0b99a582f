//! Lazy walks over a forest.
//!
//! Every iterator borrows the forest immutably and keeps its own explicit
//! stack or queue of handles, so deep trees never recurse.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::arena::{Forest, NodeId, NodeRef};
use crate::domain::error::TreeError;

/// Whole-subtree visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Traversal {
    /// Node first, then each child's subtree in order
    #[default]
    DepthFirstPreOrder,
    /// Each child's subtree in order, then the node
    DepthFirstPostOrder,
    /// Level by level, left to right
    BreadthFirst,
}

impl Traversal {
    pub const ALL: [Traversal; 3] = [
        Traversal::DepthFirstPreOrder,
        Traversal::DepthFirstPostOrder,
        Traversal::BreadthFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Traversal::DepthFirstPreOrder => "pre-order",
            Traversal::DepthFirstPostOrder => "post-order",
            Traversal::BreadthFirst => "breadth-first",
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Traversal {
    type Err = TreeError;

    #[instrument(level = "trace")]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pre-order" | "preorder" | "pre" | "depth-first-pre-order" | "dfs" => {
                Ok(Traversal::DepthFirstPreOrder)
            }
            "post-order" | "postorder" | "post" | "depth-first-post-order" => {
                Ok(Traversal::DepthFirstPostOrder)
            }
            "breadth-first" | "breadthfirst" | "bfs" | "level-order" => Ok(Traversal::BreadthFirst),
            _ => Err(TreeError::UnsupportedTraversal(s.to_string())),
        }
    }
}

impl TryFrom<String> for Traversal {
    type Error = TreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Traversal> for String {
    fn from(value: Traversal) -> Self {
        value.as_str().to_string()
    }
}

/// Parent chain upward, excluding the starting node.
pub struct Ancestors<'a, T> {
    forest: &'a Forest<T>,
    next: Option<NodeId>,
}

impl<'a, T> Ancestors<'a, T> {
    pub(crate) fn new(forest: &'a Forest<T>, parent: Option<NodeId>) -> Self {
        Self {
            forest,
            next: parent,
        }
    }
}

impl<'a, T> Iterator for Ancestors<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.forest.view(self.next.take()?)?;
        self.next = current.data().parent();
        Some(current)
    }
}

/// Direct children in stored order.
pub struct Children<'a, T> {
    forest: &'a Forest<T>,
    ids: std::slice::Iter<'a, NodeId>,
}

impl<'a, T> Children<'a, T> {
    pub(crate) fn new(forest: &'a Forest<T>, ids: &'a [NodeId]) -> Self {
        Self {
            forest,
            ids: ids.iter(),
        }
    }
}

impl<'a, T> Iterator for Children<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().and_then(|&id| self.forest.view(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<T> DoubleEndedIterator for Children<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.ids.next_back().and_then(|&id| self.forest.view(id))
    }
}

impl<T> ExactSizeIterator for Children<'_, T> {}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Following,
    Previous,
}

/// Walk along a sibling chain away from the starting node.
pub struct Siblings<'a, T> {
    forest: &'a Forest<T>,
    next: Option<NodeId>,
    direction: Direction,
}

impl<'a, T> Siblings<'a, T> {
    pub(crate) fn following(forest: &'a Forest<T>, start: Option<NodeId>) -> Self {
        Self {
            forest,
            next: start,
            direction: Direction::Following,
        }
    }

    pub(crate) fn previous(forest: &'a Forest<T>, start: Option<NodeId>) -> Self {
        Self {
            forest,
            next: start,
            direction: Direction::Previous,
        }
    }
}

impl<'a, T> Iterator for Siblings<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.forest.view(self.next.take()?)?;
        self.next = match self.direction {
            Direction::Following => current.data().following_sibling(),
            Direction::Previous => current.data().previous_sibling(),
        };
        Some(current)
    }
}

/// Depth-first pre-order walk.
pub struct PreOrder<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<NodeId>,
}

/// Proper descendants are a pre-order walk seeded with the children.
pub type Descendants<'a, T> = PreOrder<'a, T>;

impl<'a, T> PreOrder<'a, T> {
    pub(crate) fn new(forest: &'a Forest<T>, start: NodeId) -> Self {
        Self {
            forest,
            stack: vec![start],
        }
    }

    pub(crate) fn below(forest: &'a Forest<T>, children: &[NodeId]) -> Self {
        Self {
            forest,
            stack: children.iter().rev().copied().collect(),
        }
    }
}

impl<'a, T> Iterator for PreOrder<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.forest.view(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.data().children().iter().rev());
                return Some(node);
            }
        }
        None
    }
}

/// Depth-first post-order walk; a node is emitted once its children are exhausted.
pub struct PostOrder<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<(NodeId, bool)>,
}

impl<'a, T> PostOrder<'a, T> {
    pub(crate) fn new(forest: &'a Forest<T>, start: NodeId) -> Self {
        Self {
            forest,
            stack: vec![(start, false)],
        }
    }
}

impl<'a, T> Iterator for PostOrder<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.view(current) {
                if visited {
                    return Some(node);
                }
                self.stack.push((current, true));
                for &child in node.data().children().iter().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}

/// Level-by-level walk.
pub struct BreadthFirst<'a, T> {
    forest: &'a Forest<T>,
    queue: VecDeque<NodeId>,
}

impl<'a, T> BreadthFirst<'a, T> {
    pub(crate) fn new(forest: &'a Forest<T>, start: NodeId) -> Self {
        Self {
            forest,
            queue: VecDeque::from([start]),
        }
    }
}

impl<'a, T> Iterator for BreadthFirst<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.queue.pop_front() {
            if let Some(node) = self.forest.view(current) {
                self.queue.extend(node.data().children());
                return Some(node);
            }
        }
        None
    }
}

/// Subtree walk in the order picked by a [`Traversal`].
pub enum SelfAndDescendants<'a, T> {
    PreOrder(PreOrder<'a, T>),
    PostOrder(PostOrder<'a, T>),
    BreadthFirst(BreadthFirst<'a, T>),
}

impl<'a, T> Iterator for SelfAndDescendants<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SelfAndDescendants::PreOrder(walk) => walk.next(),
            SelfAndDescendants::PostOrder(walk) => walk.next(),
            SelfAndDescendants::BreadthFirst(walk) => walk.next(),
        }
    }
}
