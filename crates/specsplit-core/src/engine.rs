//! Decomposition engine
//!
//! [`SpecDecomposer`] runs the analysis pipeline and rebuilds results after
//! refinement edits. Every run is a pure function of its input: the result
//! is re-derived from the source documents and the candidate drafts.

use crate::boundary::{BoundaryDetector, CandidateDraft};
use crate::config::DecompositionConfig;
use crate::dependency::{build_graph, CandidateProfile, DependencyAnalyzer};
use crate::epic::EpicThresholdEvaluator;
use crate::scoring::{IndependenceScorer, ScoreInputs};
use crate::signals::{classify, SignalCollector};
use crate::types::{ChangeId, DecomposedChange, DecompositionResult, Warning};
use chrono::NaiveDate;
use specsplit_extract::{DocumentStructure, SourceDocument, StructureExtractor};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How edges are derived when assembling a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeDerivation {
    /// Fresh analysis: every enabled rule
    Analysis,
    /// After an edit: pairwise rules only, plus the carried edges
    Refinement,
}

/// Specification decomposition engine
#[derive(Debug, Clone, Default)]
pub struct SpecDecomposer {
    config: DecompositionConfig,
    extractor: StructureExtractor,
}

impl SpecDecomposer {
    /// Create a decomposer with the given configuration
    #[inline]
    #[must_use]
    pub fn new(config: DecompositionConfig) -> Self {
        Self {
            config,
            extractor: StructureExtractor::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DecompositionConfig {
        &self.config
    }

    /// Analyze one specification document
    #[must_use]
    pub fn analyze(
        &self,
        spec_content: &str,
        spec_path: Option<&str>,
        default_domain: Option<&str>,
    ) -> DecompositionResult {
        let document = match spec_path {
            Some(path) => SourceDocument::with_path(path, spec_content),
            None => SourceDocument::new(spec_content),
        };
        self.analyze_documents(vec![document], default_domain)
    }

    /// Analyze an ordered list of `(filename, content)` pairs as one input
    #[must_use]
    pub fn analyze_multi_document<P, C>(
        &self,
        files: &[(P, C)],
        default_domain: Option<&str>,
    ) -> DecompositionResult
    where
        P: AsRef<str>,
        C: AsRef<str>,
    {
        let documents = files
            .iter()
            .map(|(path, content)| SourceDocument::with_path(path.as_ref(), content.as_ref()))
            .collect();
        self.analyze_documents(documents, default_domain)
    }

    /// Analyze already-loaded documents
    #[must_use]
    pub fn analyze_documents(
        &self,
        mut documents: Vec<SourceDocument>,
        default_domain: Option<&str>,
    ) -> DecompositionResult {
        if documents.is_empty() {
            documents.push(SourceDocument::new(""));
        }
        let structure = self.extractor.extract_documents(&documents);
        let drafts = BoundaryDetector::new(&self.config).detect(&structure, default_domain);
        let analysis_date = self
            .config
            .analysis_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        self.assemble(
            documents,
            &structure,
            drafts,
            &[],
            EdgeDerivation::Analysis,
            analysis_date,
        )
    }

    /// Re-extract the documents a result was built from
    pub(crate) fn extract(&self, documents: &[SourceDocument]) -> DocumentStructure {
        self.extractor.extract_documents(documents)
    }

    /// Build a complete result from candidate drafts.
    ///
    /// `carried` edges (by id) are unioned with freshly derived ones; pairs
    /// naming unknown ids or the same id twice are dropped.
    pub(crate) fn assemble(
        &self,
        documents: Vec<SourceDocument>,
        structure: &DocumentStructure,
        drafts: Vec<CandidateDraft>,
        carried: &[(ChangeId, ChangeId)],
        derivation: EdgeDerivation,
        analysis_date: NaiveDate,
    ) -> DecompositionResult {
        let config = &self.config;
        let collector = SignalCollector::new(structure);
        let mut changes: Vec<DecomposedChange> = drafts
            .into_iter()
            .map(|draft| {
                let signals = collector.collect(&draft.spans);
                DecomposedChange {
                    complexity: classify(&signals, &config.complexity),
                    id: draft.id,
                    name: draft.name,
                    title: draft.title,
                    change_type: draft.change_type,
                    domain: draft.domain,
                    dependencies: BTreeSet::new(),
                    independence_score: 0.0,
                    sections: draft.sections,
                    signals,
                    spans: draft.spans,
                    suggestion: None,
                }
            })
            .collect();

        // dependency graph
        let analyzer = DependencyAnalyzer::new(&config.dependency);
        let derived = {
            let profiles: Vec<CandidateProfile<'_>> =
                changes.iter().map(CandidateProfile::from).collect();
            match derivation {
                EdgeDerivation::Analysis => analyzer.derive_edges(&profiles),
                EdgeDerivation::Refinement => analyzer.derive_structural_edges(&profiles),
            }
        };
        for edge in &derived {
            tracing::debug!(
                from = %changes[edge.from].id,
                to = %changes[edge.to].id,
                reason = ?edge.reason,
                "derived dependency"
            );
        }
        let index: HashMap<&str, usize> = changes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();
        let carried_pairs: Vec<(usize, usize)> = carried
            .iter()
            .filter_map(|(from, to)| Some((*index.get(from.as_str())?, *index.get(to.as_str())?)))
            .collect();
        drop(index);
        let graph = build_graph(
            changes.len(),
            derived
                .iter()
                .map(|e| (e.from, e.to))
                .chain(carried_pairs),
        );

        let ids: Vec<ChangeId> = changes.iter().map(|c| c.id.clone()).collect();
        for (i, change) in changes.iter_mut().enumerate() {
            change.dependencies = graph
                .dependencies(i)
                .into_iter()
                .map(|d| ids[d].clone())
                .collect();
        }

        // warnings: document-level, then cycles, then oversized changes
        let mut warnings = BoundaryDetector::new(config).structural_warnings(structure);
        for cycle in graph.find_cycles() {
            warnings.push(Warning::CircularDependency {
                ids: cycle.into_iter().map(|i| ids[i].clone()).collect(),
            });
        }
        let order = graph.suggested_order();
        if !order.is_strict() {
            tracing::debug!(
                released = ?order.released.iter().map(|&i| ids[i].as_str()).collect::<Vec<_>>(),
                "ordering released nodes to break cycles"
            );
        }
        let suggested_order: Vec<ChangeId> = order.order.iter().map(|&i| ids[i].clone()).collect();

        let shared_concepts = shared_concepts(&changes);

        // scores need final dependencies and shared concepts
        let scorer = IndependenceScorer::new(&config.scoring);
        let scores: Vec<f64> = (0..changes.len())
            .map(|i| scorer.score(&ScoreInputs::gather(&changes, i, &shared_concepts)))
            .collect();
        for (change, score) in changes.iter_mut().zip(scores) {
            change.independence_score = score;
        }
        let suggestions: Vec<Option<String>> = (0..changes.len())
            .map(|i| scorer.suggestion(&changes, i))
            .collect();
        for (change, suggestion) in changes.iter_mut().zip(suggestions) {
            change.suggestion = suggestion;
        }

        for change in &changes {
            let ac_count = change.signals.acceptance_criteria_count();
            if ac_count > config.oversized_acceptance_criteria {
                warnings.push(Warning::OversizedChange {
                    id: change.id.clone(),
                    ac_count,
                });
            }
        }
        for warning in &warnings {
            tracing::warn!(%warning, "decomposition warning");
        }

        let epic = EpicThresholdEvaluator::new(config.epic_threshold);
        let recommend_epic = epic.recommend(changes.len());
        let epic_name = if recommend_epic {
            epic.epic_name(structure)
        } else {
            None
        };

        tracing::info!(
            changes = changes.len(),
            edges = graph.edge_count(),
            shared_concepts = shared_concepts.len(),
            warnings = warnings.len(),
            recommend_epic,
            "decomposition assembled"
        );

        DecompositionResult {
            is_decomposable: changes.len() >= 2,
            changes,
            shared_concepts,
            suggested_order,
            warnings,
            recommend_epic,
            epic_name,
            analysis_date,
            documents,
        }
    }
}

/// Concepts mentioned by two or more changes
fn shared_concepts(changes: &[DecomposedChange]) -> BTreeSet<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for change in changes {
        for concept in &change.signals.domain_concepts {
            *counts.entry(concept.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|&(_, n)| n >= 2)
        .map(|(concept, _)| concept.to_string())
        .collect()
}
