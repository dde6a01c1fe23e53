//! Specsplit Dependency Graph
//!
//! Directed "depends on" graph over candidate changes. Nodes are declaration
//! indices (document order), so every tie-break in this crate is "earliest
//! declared first".
//!
//! Cycles are tolerated: [`DependencyGraph::find_cycles`] reports them and
//! [`DependencyGraph::suggested_order`] still returns a complete order by
//! releasing the earliest-declared node whenever ordering stalls.
//!
//! # Example
//!
//! ```rust
//! use specsplit_graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::with_nodes(3);
//! graph.add_dependency(1, 0).unwrap(); // 1 depends on 0
//! graph.add_dependency(2, 1).unwrap();
//!
//! assert!(graph.find_cycles().is_empty());
//! assert_eq!(graph.suggested_order().order, vec![0, 1, 2]);
//! ```

#![warn(unreachable_pub)]

pub mod cycles;
pub mod error;
pub mod graph;
pub mod order;

pub use error::GraphError;
pub use graph::DependencyGraph;
pub use order::TopologicalOrder;
