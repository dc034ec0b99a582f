use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::{debug, error, instrument};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::traversal::{
    Ancestors, BreadthFirst, Children, Descendants, PostOrder, PreOrder, SelfAndDescendants,
    Siblings, Traversal,
};

/// Stable handle of a node inside a [`Forest`].
///
/// Handles are generational: once a node is removed from the forest its
/// handle never aliases a node created later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{slot}.{generation}")
    }
}

/// Tree node stored in the arena.
///
/// Links are only written by the forest's mutation methods.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Payload, fixed at construction
    value: T,
    /// Owning node, None for root nodes
    parent: Option<NodeId>,
    /// Sibling immediately before this node, within the parent or a root-level chain
    previous_sibling: Option<NodeId>,
    /// Sibling immediately after this node
    following_sibling: Option<NodeId>,
    /// Ordered children
    children: Vec<NodeId>,
}

impl<T> Node<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            parent: None,
            previous_sibling: None,
            following_sibling: None,
            children: Vec::new(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn previous_sibling(&self) -> Option<NodeId> {
        self.previous_sibling
    }

    pub fn following_sibling(&self) -> Option<NodeId> {
        self.following_sibling
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena owning every node of one or more trees.
///
/// Nodes reference each other by [`NodeId`]; attaching and detaching only
/// rewires handles, so there are no back-reference cycles to manage.
#[derive(Debug, Clone)]
pub struct Forest<T> {
    arena: Arena<Node<T>>,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Forest<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
        }
    }

    /// Number of live nodes across all trees.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Creates a new singleton root holding `value`.
    #[instrument(level = "trace", skip(self, value))]
    pub fn new_node(&mut self, value: T) -> NodeId {
        NodeId(self.arena.insert(Node::new(value)))
    }

    /// Creates a new singleton root holding `T::default()`.
    pub fn new_default_node(&mut self) -> NodeId
    where
        T: Default,
    {
        self.new_node(T::default())
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.arena.get(id.0)
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.get(id).map(Node::value)
    }

    /// Read-only view of a node, the entry point for queries and traversals.
    pub fn node(&self, id: NodeId) -> TreeResult<NodeRef<'_, T>> {
        self.view(id).ok_or(TreeError::MissingNode(id))
    }

    pub(crate) fn view(&self, id: NodeId) -> Option<NodeRef<'_, T>> {
        self.arena.get(id.0).map(|node| NodeRef {
            forest: self,
            id,
            node,
        })
    }

    /// All live nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_, T>> {
        self.arena.iter().map(move |(idx, node)| NodeRef {
            forest: self,
            id: NodeId(idx),
            node,
        })
    }

    /// All live root nodes in arena order.
    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_, T>> {
        self.iter().filter(|node| node.is_root())
    }

    /// First node in arena order whose value equals `value`.
    pub fn find(&self, value: &T) -> Option<NodeRef<'_, T>>
    where
        T: PartialEq,
    {
        self.iter().find(|node| node.value() == value)
    }

    fn node_ref(&self, id: NodeId) -> TreeResult<&Node<T>> {
        self.arena.get(id.0).ok_or(TreeError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node<T>> {
        self.arena.get_mut(id.0).ok_or(TreeError::MissingNode(id))
    }

    fn child_position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.arena
            .get(parent.0)
            .and_then(|p| p.children.iter().position(|&c| c == child))
    }

    /// Child count of `parent` once `child` is detached from it.
    fn len_without(&self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        let len = self.node_ref(parent)?.children.len();
        if self.node_ref(child)?.parent == Some(parent) {
            Ok(len.saturating_sub(1))
        } else {
            Ok(len)
        }
    }

    /// Position of `node` under `parent` once `moving` is detached.
    fn position_without(
        &self,
        parent: NodeId,
        node: NodeId,
        moving: NodeId,
    ) -> TreeResult<usize> {
        let position = self.position_in_parent(parent, node)?;
        match self.child_position(parent, moving) {
            Some(other) if other < position => Ok(position - 1),
            _ => Ok(position),
        }
    }

    /// True if `candidate` is `node` or one of its ancestors.
    fn is_self_or_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.arena.get(id.0).and_then(|n| n.parent);
        }
        false
    }

    // ------------------------------------------------------------------
    // Mutation protocol
    // ------------------------------------------------------------------

    /// Attaches `child` (with its subtree) to `parent` at `index`.
    ///
    /// The child is detached from wherever it currently lives first, so this
    /// doubles as "move". `index` is a position in the children list after
    /// that detach: `0..=child_count`, or `0..child_count` when `child`
    /// already belongs to `parent`. Afterwards `children[index] == child`.
    #[instrument(level = "debug", skip(self))]
    pub fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) -> TreeResult<()> {
        let len = self.len_without(parent, child)?;
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        if self.is_self_or_ancestor(child, parent) {
            return Err(TreeError::CycleDetected(child));
        }

        self.detach(child)?;
        self.link_child(parent, index, child)?;
        debug!(%parent, %child, index, "attached child");
        Ok(())
    }

    /// Creates a node from `value` and attaches it to `parent` at `index`.
    #[instrument(level = "debug", skip(self, value))]
    pub fn attach_value(&mut self, parent: NodeId, index: usize, value: T) -> TreeResult<NodeId> {
        let len = self.node_ref(parent)?.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        let child = self.new_node(value);
        self.link_child(parent, index, child)?;
        debug!(%parent, %child, index, "attached new child");
        Ok(child)
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.attach(parent, 0, child)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let len = self.len_without(parent, child)?;
        self.attach(parent, len, child)
    }

    pub fn prepend_value(&mut self, parent: NodeId, value: T) -> TreeResult<NodeId> {
        self.attach_value(parent, 0, value)
    }

    pub fn append_value(&mut self, parent: NodeId, value: T) -> TreeResult<NodeId> {
        let len = self.node_ref(parent)?.children.len();
        self.attach_value(parent, len, value)
    }

    /// Inserts a detached `child` into `parent.children` at a validated index.
    fn link_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> TreeResult<()> {
        let siblings = &self.node_ref(parent)?.children;
        let previous = index.checked_sub(1).and_then(|i| siblings.get(i).copied());
        let following = siblings.get(index).copied();

        if let Some(prev) = previous {
            self.node_mut(prev)?.following_sibling = Some(child);
        }
        if let Some(next) = following {
            self.node_mut(next)?.previous_sibling = Some(child);
        }

        let node = self.node_mut(child)?;
        node.previous_sibling = previous;
        node.following_sibling = following;
        node.parent = Some(parent);

        self.node_mut(parent)?.children.insert(index, child);
        Ok(())
    }

    /// Moves `sibling` directly after `node`.
    ///
    /// A root node keeps a lateral chain of its own, so this works without a
    /// parent too.
    #[instrument(level = "debug", skip(self))]
    pub fn attach_following_sibling(&mut self, node: NodeId, sibling: NodeId) -> TreeResult<()> {
        let parent = self.node_ref(node)?.parent;
        self.node_ref(sibling)?;
        if node == sibling {
            return Err(TreeError::CycleDetected(sibling));
        }

        match parent {
            Some(parent) => {
                let position = self.position_without(parent, node, sibling)?;
                self.attach(parent, position + 1, sibling)
            }
            None => {
                self.detach(sibling)?;
                let following = self.node_ref(node)?.following_sibling;
                if let Some(next) = following {
                    self.node_mut(next)?.previous_sibling = Some(sibling);
                }
                let inserted = self.node_mut(sibling)?;
                inserted.previous_sibling = Some(node);
                inserted.following_sibling = following;
                self.node_mut(node)?.following_sibling = Some(sibling);
                debug!(%node, %sibling, "linked following root sibling");
                Ok(())
            }
        }
    }

    /// Moves `sibling` directly before `node`.
    #[instrument(level = "debug", skip(self))]
    pub fn attach_previous_sibling(&mut self, node: NodeId, sibling: NodeId) -> TreeResult<()> {
        let parent = self.node_ref(node)?.parent;
        self.node_ref(sibling)?;
        if node == sibling {
            return Err(TreeError::CycleDetected(sibling));
        }

        match parent {
            Some(parent) => {
                let position = self.position_without(parent, node, sibling)?;
                self.attach(parent, position, sibling)
            }
            None => {
                self.detach(sibling)?;
                let previous = self.node_ref(node)?.previous_sibling;
                if let Some(prev) = previous {
                    self.node_mut(prev)?.following_sibling = Some(sibling);
                }
                let inserted = self.node_mut(sibling)?;
                inserted.previous_sibling = previous;
                inserted.following_sibling = Some(node);
                self.node_mut(node)?.previous_sibling = Some(sibling);
                debug!(%node, %sibling, "linked previous root sibling");
                Ok(())
            }
        }
    }

    fn position_in_parent(&self, parent: NodeId, node: NodeId) -> TreeResult<usize> {
        self.child_position(parent, node).ok_or_else(|| {
            error!(%node, %parent, "node missing from its parent's children");
            TreeError::InvariantViolation(format!("{node} is not a child of its parent {parent}"))
        })
    }

    /// Turns `id` into a root, keeping its children.
    ///
    /// Idempotent on nodes that are already roots without siblings.
    #[instrument(level = "debug", skip(self))]
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        let node = self.node_ref(id)?;
        let (parent, previous, following) =
            (node.parent, node.previous_sibling, node.following_sibling);

        if let Some(parent) = parent {
            let position = self.position_in_parent(parent, id)?;
            self.node_mut(parent)?.children.remove(position);
        }

        if let Some(prev) = previous {
            self.node_mut(prev)?.following_sibling = following;
        }
        if let Some(next) = following {
            self.node_mut(next)?.previous_sibling = previous;
        }

        let node = self.node_mut(id)?;
        node.parent = None;
        node.previous_sibling = None;
        node.following_sibling = None;
        Ok(())
    }

    /// Detaches `child` if it is a direct child of `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<bool> {
        self.node_ref(parent)?;
        match self.child_position(parent, child) {
            Some(_) => {
                self.detach(child)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Detaches the child at `index` and returns its handle.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> TreeResult<NodeId> {
        let children = &self.node_ref(parent)?.children;
        let child = children
            .get(index)
            .copied()
            .ok_or(TreeError::IndexOutOfRange {
                index,
                len: children.len(),
            })?;
        self.detach(child)?;
        Ok(child)
    }

    /// Detaches every child of `parent`, returning them in former order.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_all_children(&mut self, parent: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut removed = Vec::new();
        while let Some(first) = self.node_ref(parent)?.children.first().copied() {
            self.detach(first)?;
            removed.push(first);
        }
        Ok(removed)
    }

    /// Detaches `id` and drops it with its whole subtree, returning its value.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<T> {
        self.detach(id)?;
        let doomed: Vec<NodeId> = self.node(id)?.descendants().map(|n| n.id()).collect();
        debug!(%id, descendants = doomed.len(), "removing subtree");
        for descendant in doomed {
            self.arena.remove(descendant.0);
        }
        self.arena
            .remove(id.0)
            .map(|node| node.value)
            .ok_or(TreeError::MissingNode(id))
    }
}

/// Borrowed view of one node with its forest, used for queries and walks.
pub struct NodeRef<'a, T> {
    forest: &'a Forest<T>,
    id: NodeId,
    node: &'a Node<T>,
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T> PartialEq for NodeRef<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.forest, other.forest) && self.id == other.id
    }
}

impl<T> Eq for NodeRef<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("value", &self.node.value)
            .finish()
    }
}

impl<'a, T> NodeRef<'a, T> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> &'a T {
        &self.node.value
    }

    /// Raw links of the underlying node.
    pub fn data(&self) -> &'a Node<T> {
        self.node
    }

    pub fn forest(&self) -> &'a Forest<T> {
        self.forest
    }

    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.node.parent.and_then(|id| self.forest.view(id))
    }

    pub fn previous_sibling(&self) -> Option<NodeRef<'a, T>> {
        self.node.previous_sibling.and_then(|id| self.forest.view(id))
    }

    pub fn following_sibling(&self) -> Option<NodeRef<'a, T>> {
        self.node.following_sibling.and_then(|id| self.forest.view(id))
    }

    pub fn first_child(&self) -> Option<NodeRef<'a, T>> {
        self.node.children.first().and_then(|&id| self.forest.view(id))
    }

    pub fn last_child(&self) -> Option<NodeRef<'a, T>> {
        self.node.children.last().and_then(|&id| self.forest.view(id))
    }

    /// Topmost ancestor, or self for a root. O(depth).
    pub fn root(&self) -> NodeRef<'a, T> {
        self.ancestors().last().unwrap_or(*self)
    }

    /// Number of parent steps to the root; 0 for a root. O(depth).
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn has_child(&self) -> bool {
        !self.node.children.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.node.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    pub fn is_first_sibling(&self) -> bool {
        self.node.previous_sibling.is_none()
    }

    pub fn is_last_sibling(&self) -> bool {
        self.node.following_sibling.is_none()
    }

    /// Deep search of self and all descendants by value.
    #[instrument(level = "trace", skip_all, fields(id = %self.id))]
    pub fn contains_value(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.self_and_descendants(Traversal::DepthFirstPreOrder)
            .any(|node| node.value() == value)
    }

    /// Deep search of self and all descendants by handle.
    #[instrument(level = "trace", skip(self), fields(id = %self.id))]
    pub fn contains(&self, node: NodeId) -> bool {
        self.self_and_descendants(Traversal::DepthFirstPreOrder)
            .any(|candidate| candidate.id() == node)
    }

    pub fn ancestors(&self) -> Ancestors<'a, T> {
        Ancestors::new(self.forest, self.node.parent)
    }

    pub fn children(&self) -> Children<'a, T> {
        Children::new(self.forest, &self.node.children)
    }

    pub fn following_siblings(&self) -> Siblings<'a, T> {
        Siblings::following(self.forest, self.node.following_sibling)
    }

    pub fn previous_siblings(&self) -> Siblings<'a, T> {
        Siblings::previous(self.forest, self.node.previous_sibling)
    }

    /// Proper descendants in pre-order.
    pub fn descendants(&self) -> Descendants<'a, T> {
        PreOrder::below(self.forest, &self.node.children)
    }

    #[instrument(level = "trace", skip(self), fields(id = %self.id))]
    pub fn self_and_descendants(&self, order: Traversal) -> SelfAndDescendants<'a, T> {
        match order {
            Traversal::DepthFirstPreOrder => {
                SelfAndDescendants::PreOrder(PreOrder::new(self.forest, self.id))
            }
            Traversal::DepthFirstPostOrder => {
                SelfAndDescendants::PostOrder(PostOrder::new(self.forest, self.id))
            }
            Traversal::BreadthFirst => {
                SelfAndDescendants::BreadthFirst(BreadthFirst::new(self.forest, self.id))
            }
        }
    }

    /// Every path from a leaf of this subtree up to this node, leaf first.
    ///
    /// Leaves come in pre-order.
    pub fn branches(&self) -> Vec<Vec<NodeRef<'a, T>>> {
        let top = self.id;
        self.self_and_descendants(Traversal::DepthFirstPreOrder)
            .filter(|node| node.is_leaf())
            .map(|leaf| {
                let mut branch = vec![leaf];
                if leaf.id() != top {
                    branch.extend(leaf.ancestors().take_while_inclusive(|a| a.id() != top));
                }
                branch
            })
            .collect()
    }
}
