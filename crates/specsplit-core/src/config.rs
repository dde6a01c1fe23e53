//! Engine configuration
//!
//! Every threshold and weight the engine uses lives here under a name.
//! Defaults reproduce the documented rule set exactly.

use crate::error::DecompositionError;
use crate::types::ChangeType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Top-level decomposition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    /// Heading level that cuts the document into candidates (1-3)
    pub boundary_level: u8,
    /// One candidate per source file for multi-document input
    pub group_by_file: bool,
    /// Domain used when neither caller nor frontmatter supplies one
    pub default_domain: String,
    /// Change type used when frontmatter does not supply one
    pub default_change_type: ChangeType,
    /// Inputs with fewer criteria than this (and too few endpoints) stay whole
    pub small_spec_min_acceptance_criteria: usize,
    /// Inputs with fewer endpoints than this (and too few criteria) stay whole
    pub small_spec_min_endpoints: usize,
    /// A change with more criteria than this is reported as oversized
    pub oversized_acceptance_criteria: usize,
    /// Change count at which epic grouping is recommended
    pub epic_threshold: usize,
    /// Complexity classification thresholds
    pub complexity: ComplexityThresholds,
    /// Independence score weights
    pub scoring: ScoringWeights,
    /// Dependency inference rules
    pub dependency: DependencyRules,
    /// Date stamped on results; `None` uses the current local date
    pub analysis_date: Option<NaiveDate>,
}

impl DecompositionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With boundary heading level (clamped to 1..=3)
    #[inline]
    #[must_use]
    pub fn with_boundary_level(mut self, level: u8) -> Self {
        self.boundary_level = level.clamp(1, 3);
        self
    }

    /// One candidate per file for multi-document input
    #[inline]
    #[must_use]
    pub fn with_group_by_file(mut self, group_by_file: bool) -> Self {
        self.group_by_file = group_by_file;
        self
    }

    /// With fallback domain
    #[inline]
    #[must_use]
    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = domain.into();
        self
    }

    /// Pin the analysis date (deterministic output for tests and replays)
    #[inline]
    #[must_use]
    pub fn with_analysis_date(mut self, date: NaiveDate) -> Self {
        self.analysis_date = Some(date);
        self
    }

    /// Enable or disable edges inferred from shared concepts
    #[inline]
    #[must_use]
    pub fn with_concept_overlap_edges(mut self, enabled: bool) -> Self {
        self.dependency.concept_overlap_edges = enabled;
        self
    }

    /// With scoring weights
    #[inline]
    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringWeights) -> Self {
        self.scoring = scoring;
        self
    }

    /// Parse configuration from TOML; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, DecompositionError> {
        let config: Self =
            toml::from_str(text).map_err(|e| DecompositionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges the engine relies on
    pub fn validate(&self) -> Result<(), DecompositionError> {
        if !(1..=3).contains(&self.boundary_level) {
            return Err(DecompositionError::Config(format!(
                "boundary_level must be between 1 and 3, got {}",
                self.boundary_level
            )));
        }
        if self.epic_threshold == 0 {
            return Err(DecompositionError::Config(
                "epic_threshold must be at least 1".to_string(),
            ));
        }
        let threshold = self.dependency.concept_overlap_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(DecompositionError::Config(format!(
                "concept_overlap_threshold must be within [0, 1], got {threshold}"
            )));
        }
        self.scoring.validate()
    }
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            boundary_level: 2,
            group_by_file: false,
            default_domain: "General".to_string(),
            default_change_type: ChangeType::Feature,
            small_spec_min_acceptance_criteria: 3,
            small_spec_min_endpoints: 2,
            oversized_acceptance_criteria: 8,
            epic_threshold: 3,
            complexity: ComplexityThresholds::default(),
            scoring: ScoringWeights::default(),
            dependency: DependencyRules::default(),
            analysis_date: None,
        }
    }
}

/// Thresholds for `small` / `large` complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityThresholds {
    pub small_max_acceptance_criteria: usize,
    pub small_max_endpoints: usize,
    pub large_above_acceptance_criteria: usize,
    pub large_above_endpoints: usize,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            small_max_acceptance_criteria: 3,
            small_max_endpoints: 2,
            large_above_acceptance_criteria: 8,
            large_above_endpoints: 5,
        }
    }
}

/// Weights of the independence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub has_endpoints: f64,
    pub own_data_entities: f64,
    pub own_ui_section: f64,
    pub enough_acceptance_criteria: f64,
    pub distinct_role: f64,
    /// Subtracted per hard dependency
    pub per_dependency_penalty: f64,
    /// Subtracted per concept shared with other changes
    pub per_shared_concept_penalty: f64,
    /// Criteria count that earns `enough_acceptance_criteria`
    pub min_acceptance_criteria: usize,
    /// Scores below this carry a merge suggestion
    pub suggestion_threshold: f64,
}

impl ScoringWeights {
    fn validate(&self) -> Result<(), DecompositionError> {
        let weights = [
            ("has_endpoints", self.has_endpoints),
            ("own_data_entities", self.own_data_entities),
            ("own_ui_section", self.own_ui_section),
            ("enough_acceptance_criteria", self.enough_acceptance_criteria),
            ("distinct_role", self.distinct_role),
            ("per_dependency_penalty", self.per_dependency_penalty),
            ("per_shared_concept_penalty", self.per_shared_concept_penalty),
            ("suggestion_threshold", self.suggestion_threshold),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(DecompositionError::Config(format!(
                    "scoring.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            has_endpoints: 0.3,
            own_data_entities: 0.2,
            own_ui_section: 0.2,
            enough_acceptance_criteria: 0.2,
            distinct_role: 0.1,
            per_dependency_penalty: 0.2,
            per_shared_concept_penalty: 0.1,
            min_acceptance_criteria: 3,
            suggestion_threshold: 0.3,
        }
    }
}

/// Dependency inference switches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyRules {
    /// Infer edges from explicit `requires` / `after ... is complete` cues
    pub explicit_cues: bool,
    /// Infer edges from endpoint namespace containment
    pub endpoint_namespaces: bool,
    /// Infer edges from heavy concept overlap (weakest signal)
    pub concept_overlap_edges: bool,
    /// Jaccard similarity at which concept overlap creates an edge
    pub concept_overlap_threshold: f64,
    /// Shortest cue term matched against titles
    pub min_cue_term_len: usize,
}

impl Default for DependencyRules {
    fn default() -> Self {
        Self {
            explicit_cues: true,
            endpoint_namespaces: true,
            concept_overlap_edges: true,
            concept_overlap_threshold: 0.5,
            min_cue_term_len: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_rules() {
        let config = DecompositionConfig::default();
        assert_eq!(config.boundary_level, 2);
        assert_eq!(config.epic_threshold, 3);
        assert_eq!(config.scoring.has_endpoints, 0.3);
        assert_eq!(config.dependency.concept_overlap_threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn boundary_level_is_clamped() {
        assert_eq!(DecompositionConfig::new().with_boundary_level(7).boundary_level, 3);
        assert_eq!(DecompositionConfig::new().with_boundary_level(0).boundary_level, 1);
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let config = DecompositionConfig::from_toml_str(
            r#"
            boundary_level = 3
            default_domain = "Payments"
            analysis_date = "2024-05-01"

            [scoring]
            has_endpoints = 0.5

            [dependency]
            concept_overlap_edges = false
            "#,
        )
        .unwrap();
        assert_eq!(config.boundary_level, 3);
        assert_eq!(config.default_domain, "Payments");
        assert_eq!(config.scoring.has_endpoints, 0.5);
        assert_eq!(config.scoring.distinct_role, 0.1);
        assert!(!config.dependency.concept_overlap_edges);
        assert_eq!(config.analysis_date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = DecompositionConfig::from_toml_str("boundary_level = 5").unwrap_err();
        assert!(matches!(err, DecompositionError::Config(_)));

        let err = DecompositionConfig::from_toml_str("[scoring]\ndistinct_role = -1.0").unwrap_err();
        assert!(err.to_string().contains("distinct_role"));

        assert!(DecompositionConfig::from_toml_str("boundary_level = \"two\"").is_err());
    }
}
