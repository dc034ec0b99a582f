//! Outline builder: turns indented text into a forest.
//!
//! ```text
//! root
//!   a
//!     a1
//!     a2
//!   b
//! ```
//!
//! Top-level lines become roots, linked to each other as root-level siblings
//! in file order.

use tracing::{debug, instrument};

use crate::domain::arena::{Forest, NodeId};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::traversal::Traversal;

pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Forest built from an outline, with its roots in file order.
#[derive(Debug, Clone)]
pub struct Outline {
    pub forest: Forest<String>,
    pub roots: Vec<NodeId>,
}

impl Outline {
    /// First node in pre-order across all roots whose label equals `label`.
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.roots.iter().find_map(|&root| {
            self.forest.node(root).ok().and_then(|node| {
                node.self_and_descendants(Traversal::DepthFirstPreOrder)
                    .find(|n| n.value() == label)
                    .map(|n| n.id())
            })
        })
    }
}

/// Constructs forests from indentation-structured text.
#[derive(Debug, Clone)]
pub struct OutlineBuilder {
    indent_width: usize,
}

impl Default for OutlineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineBuilder {
    pub fn new() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }

    /// Spaces per nesting level; values below 1 are treated as 1.
    pub fn with_indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width.max(1);
        self
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width
    }

    /// Build a forest from outline text.
    #[instrument(level = "debug", skip(self, text), fields(indent_width = self.indent_width))]
    pub fn build_from_str(&self, text: &str) -> TreeResult<Outline> {
        let mut forest = Forest::new();
        let mut roots: Vec<NodeId> = Vec::new();
        // open ancestors of the next line, one per nesting level
        let mut stack: Vec<NodeId> = Vec::new();

        for (line_no, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l)) {
            let label = line.trim();
            if label.is_empty() || label.starts_with('#') {
                continue;
            }

            let level = self.level_of(line, line_no)?;
            if level > stack.len() {
                return Err(TreeError::InvalidFormat {
                    line: line_no,
                    reason: format!(
                        "indentation jumps to level {level} below level {}",
                        stack.len()
                    ),
                });
            }
            stack.truncate(level);

            let current = match stack.last() {
                Some(&parent) => forest.append_value(parent, label.to_string())?,
                None => {
                    let root = forest.new_node(label.to_string());
                    if let Some(&previous) = roots.last() {
                        forest.attach_following_sibling(previous, root)?;
                    }
                    roots.push(root);
                    root
                }
            };
            stack.push(current);
        }

        debug!(nodes = forest.len(), roots = roots.len(), "built outline");
        Ok(Outline { forest, roots })
    }

    fn level_of(&self, line: &str, line_no: usize) -> TreeResult<usize> {
        let indent = &line[..line.len() - line.trim_start().len()];
        if indent.contains('\t') {
            return Err(TreeError::InvalidFormat {
                line: line_no,
                reason: "tabs are not allowed in indentation".to_string(),
            });
        }
        let width = indent.chars().count();
        if width % self.indent_width != 0 {
            return Err(TreeError::InvalidFormat {
                line: line_no,
                reason: format!(
                    "indentation of {width} is not a multiple of {}",
                    self.indent_width
                ),
            });
        }
        Ok(width / self.indent_width)
    }
}
