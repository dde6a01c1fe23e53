//! Dependency inference
//!
//! Derives "A depends on B" edges between candidates from three rules, in
//! decreasing confidence:
//!
//! 1. explicit cues (`requires <term>`, `after <term> is complete`) naming
//!    another candidate's title or name
//! 2. endpoint namespace containment (`/auth` in A, `/auth/login` in B)
//! 3. heavy concept overlap, pointing from the later candidate to the
//!    earlier one
//!
//! Candidates are referred to by their index, which is document order.

use crate::config::DependencyRules;
use crate::naming::slugify;
use crate::types::{DecomposedChange, Signal};
use specsplit_graph::DependencyGraph;

/// Why an edge was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeReason {
    ExplicitCue,
    EndpointNamespace,
    ConceptOverlap,
}

/// `from` depends on `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DerivedEdge {
    pub from: usize,
    pub to: usize,
    pub reason: EdgeReason,
}

/// What the analyzer needs to know about a candidate
#[derive(Debug, Clone, Copy)]
pub struct CandidateProfile<'a> {
    pub title: &'a str,
    pub name: &'a str,
    pub signals: &'a Signal,
}

impl<'a> From<&'a DecomposedChange> for CandidateProfile<'a> {
    fn from(change: &'a DecomposedChange) -> Self {
        Self {
            title: &change.title,
            name: &change.name,
            signals: &change.signals,
        }
    }
}

/// Infers dependency edges between candidates
#[derive(Debug, Clone, Copy)]
pub struct DependencyAnalyzer<'a> {
    rules: &'a DependencyRules,
}

impl<'a> DependencyAnalyzer<'a> {
    #[inline]
    #[must_use]
    pub fn new(rules: &'a DependencyRules) -> Self {
        Self { rules }
    }

    /// All enabled rules, sorted and without duplicate `(from, to)` pairs.
    ///
    /// When several rules support the same pair the strongest reason is kept.
    #[must_use]
    pub fn derive_edges(&self, candidates: &[CandidateProfile<'_>]) -> Vec<DerivedEdge> {
        let mut edges = self.derive_structural_edges(candidates);
        if self.rules.concept_overlap_edges {
            edges.extend(self.concept_overlap_edges(candidates));
        }
        dedup_edges(edges)
    }

    /// Cue and endpoint rules only.
    ///
    /// These depend on each pair of candidates alone, so merging two
    /// candidates never invents an edge the members did not already have.
    #[must_use]
    pub fn derive_structural_edges(&self, candidates: &[CandidateProfile<'_>]) -> Vec<DerivedEdge> {
        let mut edges = Vec::new();
        for (from, a) in candidates.iter().enumerate() {
            for (to, b) in candidates.iter().enumerate() {
                if from == to {
                    continue;
                }
                if self.rules.explicit_cues && self.cue_names(a.signals, b) {
                    edges.push(DerivedEdge {
                        from,
                        to,
                        reason: EdgeReason::ExplicitCue,
                    });
                }
                if self.rules.endpoint_namespaces && consumes_namespace(a.signals, b.signals) {
                    edges.push(DerivedEdge {
                        from,
                        to,
                        reason: EdgeReason::EndpointNamespace,
                    });
                }
            }
        }
        dedup_edges(edges)
    }

    fn concept_overlap_edges(&self, candidates: &[CandidateProfile<'_>]) -> Vec<DerivedEdge> {
        let mut edges = Vec::new();
        for (later, a) in candidates.iter().enumerate() {
            for (earlier, b) in candidates.iter().enumerate().take(later) {
                let similarity = jaccard(&a.signals.domain_concepts, &b.signals.domain_concepts);
                if similarity >= self.rules.concept_overlap_threshold {
                    tracing::trace!(later, earlier, similarity, "concept overlap edge");
                    edges.push(DerivedEdge {
                        from: later,
                        to: earlier,
                        reason: EdgeReason::ConceptOverlap,
                    });
                }
            }
        }
        edges
    }

    /// Whether any cue of `signals` names `target`
    fn cue_names(&self, signals: &Signal, target: &CandidateProfile<'_>) -> bool {
        let min_len = self.rules.min_cue_term_len;
        let title = target.title.trim().to_lowercase();
        signals.explicit_dependency_mentions.iter().any(|term| {
            let term = term.trim().to_lowercase();
            if term.chars().count() < min_len {
                return false;
            }
            let names_title = title.chars().count() >= min_len && term.contains(&title);
            let names_slug =
                target.name.len() >= min_len && slugify(&term).contains(target.name);
            names_title || names_slug || title.contains(&term)
        })
    }
}

/// Build the graph over `node_count` candidates from `(from, to)` pairs.
///
/// Self-loops and out-of-range pairs are skipped.
#[must_use]
pub fn build_graph(node_count: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> DependencyGraph {
    let mut graph = DependencyGraph::with_nodes(node_count);
    for (from, to) in edges {
        if let Err(err) = graph.add_dependency(from, to) {
            tracing::debug!(from, to, error = %err, "skipping edge");
        }
    }
    graph
}

fn dedup_edges(mut edges: Vec<DerivedEdge>) -> Vec<DerivedEdge> {
    // reasons order strongest first, so the first of each pair survives
    edges.sort_unstable();
    edges.dedup_by_key(|e| (e.from, e.to));
    edges
}

/// `A` calls into a namespace `B` serves: some path of `A` (minus a trailing
/// `*`) is a strict segment prefix of some path of `B`
fn consumes_namespace(a: &Signal, b: &Signal) -> bool {
    let b_paths: Vec<Vec<&str>> = b.api_endpoints.iter().map(|e| path_segments(e)).collect();
    a.api_endpoints.iter().any(|endpoint| {
        let prefix = path_segments(endpoint);
        !prefix.is_empty()
            && b_paths
                .iter()
                .any(|path| path.len() > prefix.len() && path.starts_with(&prefix))
    })
}

fn path_segments(endpoint: &str) -> Vec<&str> {
    let path = endpoint.split_whitespace().nth(1).unwrap_or(endpoint);
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.last() == Some(&"*") {
        segments.pop();
    }
    segments
}

fn jaccard<T: Ord>(a: &std::collections::BTreeSet<T>, b: &std::collections::BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}
