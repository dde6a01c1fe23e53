//! Suggested implementation order
//!
//! Kahn's algorithm over "depends on" edges: a node becomes ready once every
//! node it depends on has been placed. Ties go to the earliest-declared node.

use crate::graph::DependencyGraph;
use serde::{Deserialize, Serialize};

/// Result of ordering a dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologicalOrder {
    /// Every node exactly once
    pub order: Vec<usize>,
    /// Nodes placed before all their dependencies were, to break a stall
    pub released: Vec<usize>,
}

impl TopologicalOrder {
    /// Whether the order honors every edge
    #[inline]
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.released.is_empty()
    }
}

impl DependencyGraph {
    /// Order nodes so dependencies come first.
    ///
    /// Never fails: when no node is ready but some remain (a cycle), the
    /// earliest-declared remaining node is released and ordering continues.
    #[must_use]
    pub fn suggested_order(&self) -> TopologicalOrder {
        let n = self.node_count();
        let mut remaining: Vec<usize> = (0..n).map(|node| self.dependencies(node).len()).collect();
        let mut placed = vec![false; n];
        let mut result = TopologicalOrder {
            order: Vec::with_capacity(n),
            released: Vec::new(),
        };

        while result.order.len() < n {
            let ready = (0..n).find(|&node| !placed[node] && remaining[node] == 0);
            let node = match ready {
                Some(node) => node,
                None => {
                    let Some(node) = (0..n).find(|&node| !placed[node]) else {
                        break;
                    };
                    result.released.push(node);
                    node
                }
            };

            placed[node] = true;
            result.order.push(node);
            for dependent in self.dependents(node) {
                remaining[dependent] = remaining[dependent].saturating_sub(1);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_follow_declaration_order() {
        let graph = DependencyGraph::with_nodes(3);
        let order = graph.suggested_order();
        assert_eq!(order.order, vec![0, 1, 2]);
        assert!(order.is_strict());
    }

    #[test]
    fn dependencies_come_first() {
        let mut graph = DependencyGraph::with_nodes(3);
        graph.add_dependency(0, 2).unwrap();
        graph.add_dependency(1, 0).unwrap();
        assert_eq!(graph.suggested_order().order, vec![2, 0, 1]);
    }

    #[test]
    fn cycles_are_broken_by_declaration_order() {
        let mut graph = DependencyGraph::with_nodes(3);
        graph.add_dependency(0, 1).unwrap();
        graph.add_dependency(1, 0).unwrap();
        graph.add_dependency(2, 0).unwrap();

        let order = graph.suggested_order();
        assert_eq!(order.order, vec![0, 1, 2]);
        assert_eq!(order.released, vec![0]);
        assert!(!order.is_strict());
    }

    #[test]
    fn empty_graph_orders_nothing() {
        let order = DependencyGraph::with_nodes(0).suggested_order();
        assert!(order.order.is_empty());
    }
}
