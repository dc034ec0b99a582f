//! Outline files: loading and summarising.

use std::path::Path;

use tracing::{info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, TreeResultExt};
use crate::config::Settings;
use crate::domain::{NodeId, Outline, OutlineBuilder, Traversal};

/// Read and parse an outline file using the configured indent width.
#[instrument(level = "debug", skip(settings))]
pub fn load_outline(path: &Path, settings: &Settings) -> ApplicationResult<Outline> {
    let text = std::fs::read_to_string(path).with_path_context("read outline", path)?;
    let outline = OutlineBuilder::new()
        .with_indent_width(settings.indent_width)
        .build_from_str(&text)
        .in_outline(path)?;
    info!(
        path = %path.display(),
        nodes = outline.forest.len(),
        "loaded outline"
    );
    Ok(outline)
}

/// Look a node up by label, failing with the label in the message.
pub fn require_label(outline: &Outline, label: &str) -> ApplicationResult<NodeId> {
    outline
        .find(label)
        .ok_or_else(|| ApplicationError::NodeNotFound(label.to_string()))
}

/// Shape summary of an outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub roots: usize,
    pub nodes: usize,
    pub leaves: usize,
    /// Deepest node depth; 0 when only roots exist
    pub max_depth: usize,
    pub max_children: usize,
}

impl TreeStats {
    #[instrument(level = "debug", skip(outline))]
    pub fn collect(outline: &Outline) -> ApplicationResult<Self> {
        let mut stats = TreeStats {
            roots: outline.roots.len(),
            ..Default::default()
        };
        for &root in &outline.roots {
            for node in outline
                .forest
                .node(root)?
                .self_and_descendants(Traversal::BreadthFirst)
            {
                stats.nodes += 1;
                if node.is_leaf() {
                    stats.leaves += 1;
                }
                stats.max_children = stats.max_children.max(node.child_count());
                stats.max_depth = stats.max_depth.max(node.depth());
            }
        }
        Ok(stats)
    }
}
