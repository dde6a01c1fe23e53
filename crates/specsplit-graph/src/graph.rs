use crate::error::GraphError;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

/// Directed graph where an edge `from -> to` means `from` depends on `to`
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    inner: DiGraphMap<usize, ()>,
    node_count: usize,
}

impl DependencyGraph {
    /// Graph with nodes `0..node_count` and no edges
    #[must_use]
    pub fn with_nodes(node_count: usize) -> Self {
        let mut inner = DiGraphMap::with_capacity(node_count, node_count * 2);
        for node in 0..node_count {
            inner.add_node(node);
        }
        Self { inner, node_count }
    }

    /// Record that `from` depends on `to`.
    ///
    /// Returns `Ok(false)` if the edge already existed.
    pub fn add_dependency(&mut self, from: usize, to: usize) -> Result<bool, GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        for node in [from, to] {
            if node >= self.node_count {
                return Err(GraphError::NodeNotFound {
                    node,
                    node_count: self.node_count,
                });
            }
        }
        Ok(self.inner.add_edge(from, to, ()).is_none())
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    #[inline]
    #[must_use]
    pub fn contains_dependency(&self, from: usize, to: usize) -> bool {
        self.inner.contains_edge(from, to)
    }

    /// Nodes `node` depends on, ascending
    #[must_use]
    pub fn dependencies(&self, node: usize) -> Vec<usize> {
        self.sorted_neighbors(node, Direction::Outgoing)
    }

    /// Nodes that depend on `node`, ascending
    #[must_use]
    pub fn dependents(&self, node: usize) -> Vec<usize> {
        self.sorted_neighbors(node, Direction::Incoming)
    }

    /// All edges as `(from, to)`, sorted
    #[must_use]
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self.inner.all_edges().map(|(a, b, _)| (a, b)).collect();
        edges.sort_unstable();
        edges
    }

    /// Fast acyclicity check
    #[inline]
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.inner)
    }

    fn sorted_neighbors(&self, node: usize, direction: Direction) -> Vec<usize> {
        if !self.inner.contains_node(node) {
            return Vec::new();
        }
        let mut nodes: Vec<_> = self.inner.neighbors_directed(node, direction).collect();
        nodes.sort_unstable();
        nodes
    }
}
