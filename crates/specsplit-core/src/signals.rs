//! Signal aggregation and complexity

use crate::config::ComplexityThresholds;
use crate::types::{Complexity, Signal};
use specsplit_extract::{DocumentStructure, FragmentKind, LineSpan};

/// Aggregates extracted fragments over candidate spans
#[derive(Debug, Clone, Copy)]
pub struct SignalCollector<'a> {
    structure: &'a DocumentStructure,
}

impl<'a> SignalCollector<'a> {
    #[inline]
    #[must_use]
    pub fn new(structure: &'a DocumentStructure) -> Self {
        Self { structure }
    }

    /// Everything extracted inside `spans`, in document order
    #[must_use]
    pub fn collect(&self, spans: &[LineSpan]) -> Signal {
        let mut signal = Signal {
            domain_concepts: self.structure.concepts_in(spans),
            ..Signal::default()
        };
        for fragment in self.structure.fragments_in(spans) {
            match &fragment.kind {
                FragmentKind::Endpoint(endpoint) => {
                    signal.api_endpoints.insert(endpoint.clone());
                }
                FragmentKind::AcceptanceCriterion(text) => {
                    signal.acceptance_criteria.push(text.clone());
                }
                FragmentKind::UserStory(story) => signal.user_stories.push(story.clone()),
                FragmentKind::DependencyCue(term) => {
                    signal.explicit_dependency_mentions.insert(term.clone());
                }
            }
        }
        signal
    }
}

/// Classify a change by its criteria and endpoint counts
#[must_use]
pub fn classify(signal: &Signal, thresholds: &ComplexityThresholds) -> Complexity {
    let ac = signal.acceptance_criteria_count();
    let endpoints = signal.endpoint_count();
    if ac > thresholds.large_above_acceptance_criteria || endpoints > thresholds.large_above_endpoints
    {
        Complexity::Large
    } else if ac <= thresholds.small_max_acceptance_criteria
        && endpoints <= thresholds.small_max_endpoints
    {
        Complexity::Small
    } else {
        Complexity::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsplit_extract::StructureExtractor;

    fn signal(ac: usize, endpoints: usize) -> Signal {
        Signal {
            acceptance_criteria: (0..ac).map(|i| format!("criterion {i}")).collect(),
            api_endpoints: (0..endpoints).map(|i| format!("GET /r{i}")).collect(),
            ..Signal::default()
        }
    }

    #[test]
    fn complexity_thresholds() {
        let t = ComplexityThresholds::default();
        assert_eq!(classify(&signal(3, 2), &t), Complexity::Small);
        assert_eq!(classify(&signal(4, 0), &t), Complexity::Medium);
        assert_eq!(classify(&signal(0, 3), &t), Complexity::Medium);
        assert_eq!(classify(&signal(8, 5), &t), Complexity::Medium);
        assert_eq!(classify(&signal(9, 0), &t), Complexity::Large);
        assert_eq!(classify(&signal(0, 6), &t), Complexity::Large);
    }

    #[test]
    fn collects_only_inside_spans() {
        let text = "\
## Orders
As a buyer, I want to order so that I get goods
POST /orders
POST /orders
- Given a cart when I pay then an Order exists
This requires Payments.
## Payments
POST /payments
";
        let structure = StructureExtractor::new().extract(text);
        let collector = SignalCollector::new(&structure);

        let orders = collector.collect(&[LineSpan::new(0, 1, 6)]);
        assert_eq!(orders.api_endpoints.len(), 1);
        assert_eq!(orders.acceptance_criteria.len(), 1);
        assert_eq!(orders.user_stories[0].role, "buyer");
        assert!(orders.explicit_dependency_mentions.contains("Payments"));

        let payments = collector.collect(&[LineSpan::new(0, 7, 8)]);
        assert_eq!(payments.api_endpoints.iter().collect::<Vec<_>>(), ["POST /payments"]);
        assert!(payments.acceptance_criteria.is_empty());
    }
}
