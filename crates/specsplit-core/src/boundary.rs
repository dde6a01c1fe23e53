//! Boundary detection
//!
//! Cuts the extracted structure into candidate changes. Candidate spans
//! partition the input: each runs from its boundary heading to the line
//! before the next one, and the first candidate of a document absorbs the
//! lines above its heading.

use crate::config::DecompositionConfig;
use crate::naming::NameAllocator;
use crate::types::{ChangeId, ChangeType, DecomposedChange, Warning};
use specsplit_extract::{DocumentStructure, LineSpan, Section};

/// Title used when the input offers nothing better
const FALLBACK_TITLE: &str = "Specification";

/// A candidate before signals, edges and scores are attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDraft {
    pub id: ChangeId,
    pub name: String,
    pub title: String,
    pub change_type: ChangeType,
    pub domain: String,
    pub spans: Vec<LineSpan>,
    pub sections: Vec<Section>,
}

impl CandidateDraft {
    /// Draft carrying the identity and extent of an existing change
    #[must_use]
    pub fn from_change(change: &DecomposedChange) -> Self {
        Self {
            id: change.id.clone(),
            name: change.name.clone(),
            title: change.title.clone(),
            change_type: change.change_type,
            domain: change.domain.clone(),
            spans: change.spans.clone(),
            sections: change.sections.clone(),
        }
    }
}

/// Produces candidate drafts from a [`DocumentStructure`]
#[derive(Debug, Clone, Copy)]
pub struct BoundaryDetector<'a> {
    config: &'a DecompositionConfig,
}

impl<'a> BoundaryDetector<'a> {
    #[inline]
    #[must_use]
    pub fn new(config: &'a DecompositionConfig) -> Self {
        Self { config }
    }

    /// Whether the whole input is too small to split
    #[must_use]
    pub fn is_too_small(&self, structure: &DocumentStructure) -> bool {
        structure.acceptance_criteria_count() < self.config.small_spec_min_acceptance_criteria
            && structure.endpoint_count() < self.config.small_spec_min_endpoints
    }

    /// Document-level warnings, independent of any edit
    #[must_use]
    pub fn structural_warnings(&self, structure: &DocumentStructure) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if !structure.has_headings() {
            warnings.push(Warning::NoBoundariesDetected);
        }
        if self.is_too_small(structure) {
            warnings.push(Warning::SpecTooSmall);
        }
        warnings
    }

    /// Heading level that cuts the input, if any.
    ///
    /// The configured level wins when it has headings; otherwise the
    /// shallowest level with at least two headings.
    #[must_use]
    pub fn effective_level(&self, structure: &DocumentStructure) -> Option<u8> {
        let count = |level: u8| structure.sections_at_level(level).count();
        if count(self.config.boundary_level) > 0 {
            return Some(self.config.boundary_level);
        }
        (1..=6).find(|&level| count(level) >= 2)
    }

    /// Candidate drafts in document order.
    ///
    /// `default_domain` applies to documents whose frontmatter names none.
    #[must_use]
    pub fn detect(
        &self,
        structure: &DocumentStructure,
        default_domain: Option<&str>,
    ) -> Vec<CandidateDraft> {
        let defaults = DocumentDefaults::resolve(structure, self.config, default_domain);

        let drafts = if self.is_too_small(structure) {
            tracing::debug!("input below size thresholds; keeping it whole");
            vec![self.whole_input(structure, &defaults)]
        } else if self.config.group_by_file && structure.documents.len() > 1 {
            self.per_document(structure, &defaults)
        } else if let Some(level) = self.effective_level(structure) {
            if level != self.config.boundary_level {
                tracing::debug!(
                    requested = self.config.boundary_level,
                    level,
                    "no headings at requested level; falling back"
                );
            }
            self.by_heading_level(structure, level, &defaults)
        } else {
            vec![self.whole_input(structure, &defaults)]
        };

        tracing::debug!(candidates = drafts.len(), "boundary detection complete");
        drafts
    }

    fn whole_input(&self, structure: &DocumentStructure, defaults: &DocumentDefaults) -> CandidateDraft {
        let title = whole_input_title(structure);
        let mut names = NameAllocator::new();
        CandidateDraft {
            id: ChangeId::numbered(1),
            name: names.allocate(&title),
            title,
            change_type: defaults.change_type(0),
            domain: defaults.domain(0),
            spans: structure.whole_input_spans(),
            sections: structure.sections.clone(),
        }
    }

    fn per_document(
        &self,
        structure: &DocumentStructure,
        defaults: &DocumentDefaults,
    ) -> Vec<CandidateDraft> {
        let mut names = NameAllocator::new();
        structure
            .documents
            .iter()
            .enumerate()
            .map(|(doc, outline)| {
                let title = outline
                    .frontmatter
                    .as_ref()
                    .and_then(|fm| fm.title.clone())
                    .or_else(|| {
                        structure
                            .sections
                            .iter()
                            .find(|s| s.document == doc)
                            .map(|s| s.heading_text.clone())
                    })
                    .or_else(|| path_stem(outline.path.as_deref()))
                    .unwrap_or_else(|| format!("Document {}", doc + 1));
                CandidateDraft {
                    id: ChangeId::numbered(doc + 1),
                    name: names.allocate(&title),
                    title,
                    change_type: defaults.change_type(doc),
                    domain: defaults.domain(doc),
                    spans: vec![outline.full_span(doc)],
                    sections: structure
                        .sections
                        .iter()
                        .filter(|s| s.document == doc)
                        .cloned()
                        .collect(),
                }
            })
            .collect()
    }

    fn by_heading_level(
        &self,
        structure: &DocumentStructure,
        level: u8,
        defaults: &DocumentDefaults,
    ) -> Vec<CandidateDraft> {
        let mut spans_per_candidate: Vec<(&Section, Vec<LineSpan>)> = Vec::new();
        // documents with no boundary heading, before the first candidate exists
        let mut leading_orphans = Vec::new();

        for (doc, outline) in structure.documents.iter().enumerate() {
            let bounds: Vec<&Section> = structure
                .sections_at_level(level)
                .filter(|s| s.document == doc)
                .collect();
            if bounds.is_empty() {
                let span = outline.full_span(doc);
                match spans_per_candidate.last_mut() {
                    Some((_, spans)) => spans.push(span),
                    None => leading_orphans.push(span),
                }
                continue;
            }

            for (i, &heading) in bounds.iter().enumerate() {
                let start = if i == 0 { 1 } else { heading.start_line };
                let end = bounds
                    .get(i + 1)
                    .map_or(outline.line_count, |next| next.start_line - 1);
                spans_per_candidate.push((heading, vec![LineSpan::new(doc, start, end)]));
            }
        }

        if let Some((_, spans)) = spans_per_candidate.first_mut() {
            leading_orphans.append(spans);
            *spans = leading_orphans;
        }

        let mut names = NameAllocator::new();
        spans_per_candidate
            .into_iter()
            .enumerate()
            .map(|(i, (heading, spans))| {
                let spans = coalesce_spans(spans);
                let sections = structure
                    .sections_in(&spans)
                    .filter(|s| s.level >= level)
                    .cloned()
                    .collect();
                CandidateDraft {
                    id: ChangeId::numbered(i + 1),
                    name: names.allocate(&heading.heading_text),
                    title: heading.heading_text.clone(),
                    change_type: defaults.change_type(heading.document),
                    domain: defaults.domain(heading.document),
                    spans,
                    sections,
                }
            })
            .collect()
    }
}

/// Per-document domain and change type after frontmatter overrides
#[derive(Debug)]
struct DocumentDefaults {
    domains: Vec<String>,
    change_types: Vec<ChangeType>,
    fallback_domain: String,
    fallback_type: ChangeType,
}

impl DocumentDefaults {
    fn resolve(
        structure: &DocumentStructure,
        config: &DecompositionConfig,
        default_domain: Option<&str>,
    ) -> Self {
        let fallback_domain = default_domain
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(&config.default_domain)
            .to_string();

        let mut domains = Vec::with_capacity(structure.documents.len());
        let mut change_types = Vec::with_capacity(structure.documents.len());
        for outline in &structure.documents {
            let fm = outline.frontmatter.as_ref();
            domains.push(
                fm.and_then(|fm| fm.domain.clone())
                    .unwrap_or_else(|| fallback_domain.clone()),
            );
            let change_type = match fm.and_then(|fm| fm.change_type.as_deref()) {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    tracing::debug!(value = raw, "ignoring unknown frontmatter type");
                    config.default_change_type
                }),
                None => config.default_change_type,
            };
            change_types.push(change_type);
        }

        Self {
            domains,
            change_types,
            fallback_domain,
            fallback_type: config.default_change_type,
        }
    }

    fn domain(&self, document: usize) -> String {
        self.domains
            .get(document)
            .unwrap_or(&self.fallback_domain)
            .clone()
    }

    fn change_type(&self, document: usize) -> ChangeType {
        self.change_types
            .get(document)
            .copied()
            .unwrap_or(self.fallback_type)
    }
}

/// Title for a candidate covering the whole input
#[must_use]
pub fn whole_input_title(structure: &DocumentStructure) -> String {
    structure
        .documents
        .first()
        .and_then(|outline| outline.frontmatter.as_ref())
        .and_then(|fm| fm.title.clone())
        .or_else(|| {
            structure
                .sections
                .iter()
                .find(|s| s.level == 1)
                .or_else(|| structure.sections.first())
                .map(|s| s.heading_text.clone())
        })
        .or_else(|| path_stem(structure.documents.first()?.path.as_deref()))
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

fn path_stem(path: Option<&str>) -> Option<String> {
    let path = path?;
    specsplit_extract::SourceDocument::with_path(path, "")
        .stem()
        .map(str::to_string)
}

/// Sort spans and join ones that touch or overlap
#[must_use]
pub fn coalesce_spans(mut spans: Vec<LineSpan>) -> Vec<LineSpan> {
    spans.sort_unstable();
    let mut out: Vec<LineSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match out.last_mut() {
            Some(last) if last.document == span.document && span.start_line <= last.end_line + 1 => {
                last.end_line = last.end_line.max(span.end_line);
            }
            _ => out.push(span),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsplit_extract::{SourceDocument, StructureExtractor};

    const THREE_FEATURES: &str = "\
# Shop

## Catalog
GET /products
- Given a product when listed then it shows

## Cart
POST /cart
- Given a cart when I add then it grows

## Checkout
- Given a cart when I pay then an order exists
";

    fn detect(text: &str, config: &DecompositionConfig) -> Vec<CandidateDraft> {
        let structure = StructureExtractor::new().extract(text);
        BoundaryDetector::new(config).detect(&structure, None)
    }

    #[test]
    fn splits_at_boundary_level_and_absorbs_preamble() {
        let drafts = detect(THREE_FEATURES, &DecompositionConfig::default());
        let titles: Vec<_> = drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["Catalog", "Cart", "Checkout"]);
        assert_eq!(drafts[0].spans, vec![LineSpan::new(0, 1, 6)]);
        assert_eq!(drafts[1].spans, vec![LineSpan::new(0, 7, 10)]);
        assert_eq!(drafts[2].spans, vec![LineSpan::new(0, 11, 12)]);
        // the H1 above the boundary level is not one of the candidate's sections
        assert_eq!(drafts[0].sections.len(), 1);
        assert_eq!(drafts[0].name, "catalog");
        assert_eq!(drafts[2].id, "c3");
    }

    #[test]
    fn small_input_stays_whole() {
        let text = "## A\nGET /a\n## B\ntext\n## C\n- Given x when y then z\n";
        let config = DecompositionConfig::default();
        let structure = StructureExtractor::new().extract(text);
        let detector = BoundaryDetector::new(&config);
        assert!(detector.is_too_small(&structure));
        assert_eq!(detector.structural_warnings(&structure), vec![Warning::SpecTooSmall]);
        let drafts = detector.detect(&structure, None);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "A");
        assert_eq!(drafts[0].sections.len(), 3);
    }

    #[test]
    fn falls_back_to_shallowest_repeated_level() {
        let text = THREE_FEATURES.replace("## ", "### ");
        let drafts = detect(&text, &DecompositionConfig::default());
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].title, "Catalog");
    }

    #[test]
    fn colliding_headings_get_unique_names() {
        let text = "## Setup\nGET /a\nGET /b\n## Setup\nPOST /c\n";
        let drafts = detect(text, &DecompositionConfig::default());
        let names: Vec<_> = drafts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["setup", "setup-2"]);
    }

    #[test]
    fn group_by_file_makes_one_candidate_per_document() {
        let docs = [
            SourceDocument::with_path("specs/catalog.md", "GET /products\nGET /products/{id}\n"),
            SourceDocument::with_path("specs/cart.md", "---\ntitle: Shopping Cart\ndomain: Sales\n---\nPOST /cart\n"),
        ];
        let structure = StructureExtractor::new().extract_documents(&docs);
        let config = DecompositionConfig::default().with_group_by_file(true);
        let drafts = BoundaryDetector::new(&config).detect(&structure, Some("Shop"));

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "catalog");
        assert_eq!(drafts[0].domain, "Shop");
        assert_eq!(drafts[1].title, "Shopping Cart");
        assert_eq!(drafts[1].domain, "Sales");
        assert_eq!(drafts[1].spans, vec![LineSpan::new(1, 1, 5)]);
    }

    #[test]
    fn frontmatter_type_applies_to_candidates() {
        let text = format!("---\ntype: bugfix\n---\n{THREE_FEATURES}");
        let drafts = detect(&text, &DecompositionConfig::default());
        assert!(drafts.iter().all(|d| d.change_type == ChangeType::Bugfix));
    }

    #[test]
    fn coalesce_joins_adjacent_spans_only() {
        let spans = coalesce_spans(vec![
            LineSpan::new(0, 8, 10),
            LineSpan::new(0, 1, 7),
            LineSpan::new(0, 12, 14),
            LineSpan::new(1, 1, 3),
        ]);
        assert_eq!(
            spans,
            vec![
                LineSpan::new(0, 1, 10),
                LineSpan::new(0, 12, 14),
                LineSpan::new(1, 1, 3)
            ]
        );
    }
}
