//! Independence scoring
//!
//! A bounded, advisory measure of how self-contained a change is. Scores
//! never trigger edits; a low score only attaches a suggestion.

use crate::config::ScoringWeights;
use crate::types::DecomposedChange;
use std::collections::BTreeSet;

/// Heading words that mark a section as user-interface work
pub const UI_KEYWORDS: [&str; 9] = [
    "ui",
    "interface",
    "screen",
    "page",
    "view",
    "frontend",
    "component",
    "form",
    "dashboard",
];

/// Boolean and count features feeding the score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreInputs {
    pub has_endpoints: bool,
    pub has_own_data_entities: bool,
    pub has_own_ui_section: bool,
    pub acceptance_criteria: usize,
    pub has_distinct_role: bool,
    pub hard_dependencies: usize,
    pub shared_concepts: usize,
}

impl ScoreInputs {
    /// Features of `changes[index]` relative to the other changes.
    ///
    /// Expects dependencies to be final; `shared` is the result-wide set of
    /// concepts mentioned by two or more changes.
    #[must_use]
    pub fn gather(changes: &[DecomposedChange], index: usize, shared: &BTreeSet<String>) -> Self {
        let Some(change) = changes.get(index) else {
            return Self::default();
        };
        let others = || {
            changes
                .iter()
                .enumerate()
                .filter(move |(i, _)| *i != index)
                .map(|(_, c)| c)
        };

        let concepts = &change.signals.domain_concepts;
        let has_own_data_entities = concepts
            .iter()
            .any(|concept| others().all(|c| !c.signals.domain_concepts.contains(concept)));

        let has_distinct_role = change.signals.user_stories.iter().any(|story| {
            let role = story.role.to_lowercase();
            others().all(|c| {
                c.signals
                    .user_stories
                    .iter()
                    .all(|s| s.role.to_lowercase() != role)
            })
        });

        Self {
            has_endpoints: !change.signals.api_endpoints.is_empty(),
            has_own_data_entities,
            has_own_ui_section: change
                .sections
                .iter()
                .any(|s| is_ui_heading(&s.heading_text)),
            acceptance_criteria: change.signals.acceptance_criteria.len(),
            has_distinct_role,
            hard_dependencies: change.dependencies.len(),
            shared_concepts: concepts.iter().filter(|c| shared.contains(*c)).count(),
        }
    }
}

/// Computes independence scores and low-score suggestions
#[derive(Debug, Clone, Copy)]
pub struct IndependenceScorer<'a> {
    weights: &'a ScoringWeights,
}

impl<'a> IndependenceScorer<'a> {
    #[inline]
    #[must_use]
    pub fn new(weights: &'a ScoringWeights) -> Self {
        Self { weights }
    }

    /// Weighted sum, clamped to `[0, 1]` and rounded to two decimals
    #[must_use]
    pub fn score(&self, inputs: &ScoreInputs) -> f64 {
        let w = self.weights;
        let flag = |on: bool, weight: f64| if on { weight } else { 0.0 };
        let raw = flag(inputs.has_endpoints, w.has_endpoints)
            + flag(inputs.has_own_data_entities, w.own_data_entities)
            + flag(inputs.has_own_ui_section, w.own_ui_section)
            + flag(
                inputs.acceptance_criteria >= w.min_acceptance_criteria,
                w.enough_acceptance_criteria,
            )
            + flag(inputs.has_distinct_role, w.distinct_role)
            - w.per_dependency_penalty * inputs.hard_dependencies as f64
            - w.per_shared_concept_penalty * inputs.shared_concepts as f64;
        (raw.clamp(0.0, 1.0) * 100.0).round() / 100.0
    }

    /// Advice for `changes[index]` when its score is below the threshold
    #[must_use]
    pub fn suggestion(&self, changes: &[DecomposedChange], index: usize) -> Option<String> {
        let change = changes.get(index)?;
        let score = change.independence_score;
        let threshold = self.weights.suggestion_threshold;
        if score >= threshold {
            return None;
        }

        let advice = match most_coupled(changes, index) {
            Some(partner) => format!(
                "consider merging with {} ({})",
                partner.id, partner.title
            ),
            None => "review whether this change stands on its own".to_string(),
        };
        Some(format!(
            "independence score {score:.2} is below {threshold:.2}; {advice}"
        ))
    }
}

/// First dependency in result order, otherwise the change sharing the most
/// concepts (earliest on ties)
fn most_coupled(changes: &[DecomposedChange], index: usize) -> Option<&DecomposedChange> {
    let change = changes.get(index)?;
    if let Some(dep) = changes.iter().find(|c| change.depends_on(&c.id)) {
        return Some(dep);
    }

    let mut best: Option<(usize, &DecomposedChange)> = None;
    for (i, other) in changes.iter().enumerate() {
        if i == index {
            continue;
        }
        let shared = change
            .signals
            .domain_concepts
            .intersection(&other.signals.domain_concepts)
            .count();
        if shared > 0 && best.map_or(true, |(n, _)| shared > n) {
            best = Some((shared, other));
        }
    }
    best.map(|(_, c)| c)
}

/// Whether a heading names user-interface work
#[must_use]
pub fn is_ui_heading(heading: &str) -> bool {
    heading
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| UI_KEYWORDS.contains(&word.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer_score(inputs: ScoreInputs) -> f64 {
        IndependenceScorer::new(&ScoringWeights::default()).score(&inputs)
    }

    #[test]
    fn fully_independent_change_scores_one() {
        let inputs = ScoreInputs {
            has_endpoints: true,
            has_own_data_entities: true,
            has_own_ui_section: true,
            acceptance_criteria: 3,
            has_distinct_role: true,
            ..ScoreInputs::default()
        };
        assert_eq!(scorer_score(inputs), 1.0);
    }

    #[test]
    fn penalties_are_clamped_at_zero() {
        let inputs = ScoreInputs {
            has_endpoints: true,
            hard_dependencies: 3,
            shared_concepts: 4,
            ..ScoreInputs::default()
        };
        assert_eq!(scorer_score(inputs), 0.0);
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let inputs = ScoreInputs {
            has_endpoints: true,
            acceptance_criteria: 5,
            shared_concepts: 1,
            ..ScoreInputs::default()
        };
        // 0.3 + 0.2 - 0.1
        assert_eq!(scorer_score(inputs), 0.4);
    }

    #[test]
    fn ui_keywords_match_whole_words() {
        assert!(is_ui_heading("Login Screen"));
        assert!(is_ui_heading("Admin dashboard (v2)"));
        assert!(is_ui_heading("UI"));
        assert!(!is_ui_heading("Reviews"));
        assert!(!is_ui_heading("Pagination"));
    }
}
