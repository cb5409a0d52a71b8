use crate::id::NodeId;

/// Rejected node-store mutations. Every variant leaves the graph untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("node text must not be empty")]
    EmptyText,
    #[error("the root node cannot be removed")]
    RootProtected,
    #[error("a root node already exists: {0}")]
    DuplicateRoot(NodeId),
    #[error("expansion {node} needs a live topic or root parent (got {parent:?})")]
    InvalidParent {
        node: NodeId,
        parent: Option<NodeId>,
    },
    #[error("node {0} cannot change kind in place")]
    KindChange(NodeId),
    #[error("non-finite coordinate for node {0}")]
    NonFinite(NodeId),
}

/// Configuration that cannot drive the canvas.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scale bounds must satisfy 0.1 <= min < max <= 5 (got {min}..{max})")]
    ScaleBounds { min: f32, max: f32 },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, GraphError>;
