//! Domain layer: the forest, its traversals and the outline builder
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod error;
pub mod traversal;

pub use arena::{Forest, Node, NodeId, NodeRef};
pub use builder::{Outline, OutlineBuilder, DEFAULT_INDENT_WIDTH};
pub use error::{TreeError, TreeResult};
pub use traversal::{
    Ancestors, BreadthFirst, Children, Descendants, PostOrder, PreOrder, SelfAndDescendants,
    Siblings, Traversal,
};
