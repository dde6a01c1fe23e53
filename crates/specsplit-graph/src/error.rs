//! Graph errors

/// Errors raised while building a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A node cannot depend on itself
    #[error("self-loop on node {0}")]
    SelfLoop(usize),

    /// Edge endpoint outside the declared node range
    #[error("node {node} not found (graph has {node_count} nodes)")]
    NodeNotFound { node: usize, node_count: usize },
}
