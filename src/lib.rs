//! Arena-backed generic trees.
//!
//! A [`Forest`](domain::Forest) owns every node; nodes are addressed through
//! generational [`NodeId`](domain::NodeId) handles and carry ordered
//! children, a parent link and previous/following sibling links. Attaching a
//! node always detaches it from its previous position first, so a node is
//! never part of two trees.
//!
//! ```
//! use arbor::domain::{Forest, Traversal};
//!
//! let mut forest = Forest::new();
//! let root = forest.new_node("root");
//! let a = forest.append_value(root, "a").unwrap();
//! forest.append_value(root, "b").unwrap();
//! forest.append_value(a, "a1").unwrap();
//!
//! let order: Vec<_> = forest
//!     .node(root)
//!     .unwrap()
//!     .self_and_descendants(Traversal::BreadthFirst)
//!     .map(|n| *n.value())
//!     .collect();
//! assert_eq!(order, ["root", "a", "b", "a1"]);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod tree_traits;
pub mod util;

pub use domain::{Forest, Node, NodeId, NodeRef, Traversal, TreeError, TreeResult};
