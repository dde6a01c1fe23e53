//! Cycle detection
//!
//! Depth-first traversal with three marks. An edge into an in-progress node
//! closes a cycle; the cycle is the traversal stack from that node onward.

use crate::graph::DependencyGraph;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Every distinct cycle found by the traversal.
    ///
    /// Each cycle is listed in edge order (each node depends on the next, the
    /// last depends on the first) and rotated to start at its
    /// earliest-declared node. Cycles over the same node set are reported
    /// once.
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Vec<usize>> {
        let mut marks = vec![Mark::Unvisited; self.node_count()];
        let mut stack = Vec::new();
        let mut seen = BTreeSet::new();
        let mut cycles = Vec::new();

        for node in 0..self.node_count() {
            if marks[node] == Mark::Unvisited {
                self.visit(node, &mut marks, &mut stack, &mut seen, &mut cycles);
            }
        }
        cycles
    }

    fn visit(
        &self,
        node: usize,
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
        seen: &mut BTreeSet<Vec<usize>>,
        cycles: &mut Vec<Vec<usize>>,
    ) {
        marks[node] = Mark::InProgress;
        stack.push(node);

        for next in self.dependencies(node) {
            match marks[next] {
                Mark::Unvisited => self.visit(next, marks, stack, seen, cycles),
                Mark::InProgress => {
                    if let Some(pos) = stack.iter().position(|&n| n == next) {
                        let cycle = rotate_to_min(&stack[pos..]);
                        let mut key = cycle.clone();
                        key.sort_unstable();
                        if seen.insert(key) {
                            cycles.push(cycle);
                        }
                    }
                }
                Mark::Done => {}
            }
        }

        stack.pop();
        marks[node] = Mark::Done;
    }
}

fn rotate_to_min(path: &[usize]) -> Vec<usize> {
    let start = path
        .iter()
        .enumerate()
        .min_by_key(|(_, &n)| n)
        .map_or(0, |(i, _)| i);
    path[start..].iter().chain(&path[..start]).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let mut graph = DependencyGraph::with_nodes(3);
        graph.add_dependency(2, 1).unwrap();
        graph.add_dependency(1, 0).unwrap();
        graph.add_dependency(2, 0).unwrap();
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn mutual_dependency_is_one_cycle() {
        let mut graph = DependencyGraph::with_nodes(2);
        graph.add_dependency(0, 1).unwrap();
        graph.add_dependency(1, 0).unwrap();
        assert_eq!(graph.find_cycles(), vec![vec![0, 1]]);
    }

    #[test]
    fn cycle_is_rotated_to_earliest_node() {
        let mut graph = DependencyGraph::with_nodes(4);
        // 3 -> 1 -> 2 -> 3, entered from 0
        graph.add_dependency(0, 3).unwrap();
        graph.add_dependency(3, 1).unwrap();
        graph.add_dependency(1, 2).unwrap();
        graph.add_dependency(2, 3).unwrap();
        assert_eq!(graph.find_cycles(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn disjoint_cycles_are_reported_separately() {
        let mut graph = DependencyGraph::with_nodes(4);
        graph.add_dependency(0, 1).unwrap();
        graph.add_dependency(1, 0).unwrap();
        graph.add_dependency(2, 3).unwrap();
        graph.add_dependency(3, 2).unwrap();
        assert_eq!(graph.find_cycles(), vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn rotation_keeps_edge_order() {
        assert_eq!(rotate_to_min(&[5, 2, 9]), vec![2, 9, 5]);
        assert!(rotate_to_min(&[]).is_empty());
    }
}
