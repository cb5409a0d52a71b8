use crate::orchestrator::OpId;
use ib_core::{GraphError, NodeId};

/// Invalid local operations. Rejected synchronously; nothing changes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("node {0} has an operation in flight")]
    Busy(NodeId),
    #[error("node {0} is being dragged")]
    Dragging(NodeId),
    #[error("expansion {0} cannot be expanded further")]
    NotExpandable(NodeId),
    #[error("cannot combine {0} with itself")]
    SelfCombine(NodeId),
    #[error("the root node cannot be combined")]
    RootCombine,
    #[error("no use case has been set")]
    NoUseCase,
    #[error("topic generation {0} is already in flight")]
    GenerationBusy(OpId),
}

pub type Result<T> = std::result::Result<T, EngineError>;
