//! Core types for decomposition
//!
//! Defines the values the engine hands back to callers:
//! - change identifiers and change types
//! - per-change signals and complexity
//! - warnings
//! - the `DecompositionResult` snapshot

use crate::error::DecompositionError;
use chrono::NaiveDate;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use specsplit_extract::{LineSpan, Section, SourceDocument, UserStory};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Stable short identifier of a change (`c1`, `c3a`, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// Identifier of the n-th candidate (1-based)
    #[inline]
    #[must_use]
    pub fn numbered(n: usize) -> Self {
        Self(format!("c{n}"))
    }

    /// Identifier of a split part: `c3` + 0 -> `c3a`
    #[must_use]
    pub fn part(&self, index: usize) -> Self {
        let mut suffix = String::new();
        let mut n = index;
        loop {
            // bijective base-26: a..z, aa, ab, ...
            suffix.insert(0, char::from(b'a' + (n % 26) as u8));
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        Self(format!("{}{suffix}", self.0))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChangeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChangeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for ChangeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ChangeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Kind of work a change represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    #[default]
    Feature,
    Bugfix,
    Refactor,
}

impl ChangeType {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Bugfix => "bugfix",
            Self::Refactor => "refactor",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feature" => Ok(Self::Feature),
            "bugfix" => Ok(Self::Bugfix),
            "refactor" => Ok(Self::Refactor),
            other => Err(DecompositionError::invalid_operation(format!(
                "unknown change type '{other}' (expected feature, bugfix or refactor)"
            ))),
        }
    }
}

/// Size class derived from criteria and endpoint counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        })
    }
}

/// Signals aggregated over a change's spans, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// `METHOD /path`, first occurrence order
    pub api_endpoints: IndexSet<String>,
    pub acceptance_criteria: Vec<String>,
    pub user_stories: Vec<UserStory>,
    pub domain_concepts: BTreeSet<String>,
    /// Terms named by `requires ...` / `after ... is complete`
    pub explicit_dependency_mentions: BTreeSet<String>,
}

impl Signal {
    #[inline]
    #[must_use]
    pub fn acceptance_criteria_count(&self) -> usize {
        self.acceptance_criteria.len()
    }

    #[inline]
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.api_endpoints.len()
    }
}

/// One proposed independent unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecomposedChange {
    pub id: ChangeId,
    /// Slug, unique within the result
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub domain: String,
    pub complexity: Complexity,
    /// Ids this change depends on
    pub dependencies: BTreeSet<ChangeId>,
    /// Advisory score in `[0.0, 1.0]`
    pub independence_score: f64,
    pub sections: Vec<Section>,
    pub signals: Signal,
    /// Source lines this change covers
    pub spans: Vec<LineSpan>,
    /// Advice attached when the score is low; never acted on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl DecomposedChange {
    /// Position of the change's first line, for document ordering
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        self.spans
            .iter()
            .map(|s| (s.document, s.start_line))
            .min()
            .unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub fn depends_on(&self, id: &ChangeId) -> bool {
        self.dependencies.contains(id)
    }
}

/// Non-fatal structural condition attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Ids on a dependency cycle, in edge order
    CircularDependency { ids: Vec<ChangeId> },
    /// A change carries more acceptance criteria than comfortable
    OversizedChange { id: ChangeId, ac_count: usize },
    /// The input has no headings at all
    NoBoundariesDetected,
    /// Too few criteria and endpoints to justify splitting
    SpecTooSmall,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircularDependency { ids } => {
                let path: Vec<_> = ids.iter().map(ChangeId::as_str).collect();
                write!(f, "circular dependency: {}", path.join(" -> "))
            }
            Self::OversizedChange { id, ac_count } => {
                write!(f, "change {id} has {ac_count} acceptance criteria")
            }
            Self::NoBoundariesDetected => f.write_str("no headings found; kept as one change"),
            Self::SpecTooSmall => f.write_str("specification too small to decompose"),
        }
    }
}

/// Immutable snapshot produced by analysis and by every refinement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    /// Changes in document order
    pub changes: Vec<DecomposedChange>,
    /// Concepts mentioned by two or more changes
    pub shared_concepts: BTreeSet<String>,
    /// Dependencies first; complete even when cyclic
    pub suggested_order: Vec<ChangeId>,
    pub warnings: Vec<Warning>,
    pub is_decomposable: bool,
    /// Advisory flag for grouping the changes under an epic
    pub recommend_epic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_name: Option<String>,
    pub analysis_date: NaiveDate,
    /// Inputs the result was derived from; refinement re-reads them
    pub documents: Vec<SourceDocument>,
}

impl DecompositionResult {
    /// Look up a change by id
    #[must_use]
    pub fn change(&self, id: &str) -> Option<&DecomposedChange> {
        self.changes.iter().find(|c| c.id == id)
    }

    /// Index of a change by id
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.changes.iter().position(|c| c.id == id)
    }

    /// Ids in result order
    #[must_use]
    pub fn ids(&self) -> Vec<&ChangeId> {
        self.changes.iter().map(|c| &c.id).collect()
    }

    /// Every dependency edge as `(from, to)`, in change order
    #[must_use]
    pub fn edges(&self) -> Vec<(ChangeId, ChangeId)> {
        self.changes
            .iter()
            .flat_map(|c| c.dependencies.iter().map(|d| (c.id.clone(), d.clone())))
            .collect()
    }

    /// Whether any cycle warning is present
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, Warning::CircularDependency { .. }))
    }

    /// Changes mentioning a concept
    #[must_use]
    pub fn concept_owners(&self, concept: &str) -> Vec<&ChangeId> {
        self.changes
            .iter()
            .filter(|c| c.signals.domain_concepts.contains(concept))
            .map(|c| &c.id)
            .collect()
    }

    #[must_use]
    pub fn total_acceptance_criteria(&self) -> usize {
        self.changes
            .iter()
            .map(|c| c.signals.acceptance_criteria_count())
            .sum()
    }

    #[must_use]
    pub fn total_endpoints(&self) -> usize {
        self.changes.iter().map(|c| c.signals.endpoint_count()).sum()
    }

    /// Encode as pretty JSON
    pub fn to_json(&self) -> Result<String, DecompositionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Encode as YAML
    pub fn to_yaml(&self) -> Result<String, DecompositionError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, DecompositionError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, DecompositionError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_ids_use_letter_suffixes() {
        let id = ChangeId::from("c3");
        assert_eq!(id.part(0), "c3a");
        assert_eq!(id.part(1), "c3b");
        assert_eq!(id.part(25), "c3z");
        assert_eq!(id.part(26), "c3aa");
        assert_eq!(ChangeId::numbered(4).to_string(), "c4");
    }

    #[test]
    fn change_type_parses_case_insensitively() {
        assert_eq!("Bugfix".parse::<ChangeType>().unwrap(), ChangeType::Bugfix);
        assert_eq!(" refactor ".parse::<ChangeType>().unwrap(), ChangeType::Refactor);
        let err = "chore".parse::<ChangeType>().unwrap_err();
        assert!(matches!(err, DecompositionError::InvalidOperation(_)));
    }

    #[test]
    fn warnings_serialize_internally_tagged() {
        let warning = Warning::OversizedChange {
            id: ChangeId::from("c2"),
            ac_count: 9,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "oversized_change");
        assert_eq!(json["id"], "c2");
        assert_eq!(json["ac_count"], 9);

        let json = serde_json::to_value(Warning::SpecTooSmall).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "spec_too_small" }));
    }

    #[test]
    fn warning_messages_are_readable() {
        let warning = Warning::CircularDependency {
            ids: vec!["c1".into(), "c2".into()],
        };
        assert_eq!(warning.to_string(), "circular dependency: c1 -> c2");
    }
}
