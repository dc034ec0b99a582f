//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Errors raised by the forest and the outline builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A required node handle is not live in this forest.
    #[error("node not found: {0}")]
    MissingNode(NodeId),

    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unsupported traversal: {0}")]
    UnsupportedTraversal(String),

    /// Structural state was already corrupt when a mutation looked at it.
    #[error("tree invariant violated: {0}")]
    InvariantViolation(String),

    #[error("cycle detected: {0} cannot be attached below itself")]
    CycleDetected(NodeId),

    #[error("invalid outline at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
