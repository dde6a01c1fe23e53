//! Structure extractor
//!
//! Uses pulldown-cmark to locate ATX headings and fenced code, then scans
//! each content line with the recognizers in [`crate::patterns`].

use crate::concepts::{Candidate, ConceptDetector};
use crate::document::{Frontmatter, SourceDocument};
use crate::patterns;
use crate::structure::{
    ConceptMention, DocumentOutline, DocumentStructure, Fragment, FragmentKind, Section,
};
use pulldown_cmark::{Event, Parser as MdParser, Tag, TagEnd};
use std::collections::{BTreeMap, BTreeSet};

/// Heading text that turns checkbox items into acceptance criteria
const ACCEPTANCE_HEADING: &str = "acceptance criteria";

/// Parses raw specification text into a [`DocumentStructure`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureExtractor;

/// Line-level layout of one document, as seen by the markdown parser
#[derive(Debug, Default)]
struct Layout {
    /// heading line -> (level, text)
    headings: BTreeMap<usize, (u8, String)>,
    code_lines: BTreeSet<usize>,
}

impl StructureExtractor {
    /// Create new extractor
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract a single anonymous document
    #[must_use]
    pub fn extract(&self, text: &str) -> DocumentStructure {
        self.extract_documents(&[SourceDocument::new(text)])
    }

    /// Extract an ordered set of documents as one input.
    ///
    /// Domain concepts are counted across all documents; every other signal
    /// stays anchored to the document and line it came from.
    #[must_use]
    pub fn extract_documents(&self, documents: &[SourceDocument]) -> DocumentStructure {
        let mut detector = ConceptDetector::new();
        let mut observed: Vec<(usize, usize, Vec<Candidate>)> = Vec::new();
        let mut structure = DocumentStructure::default();

        for (idx, doc) in documents.iter().enumerate() {
            let frontmatter = Frontmatter::parse(&doc.content);
            let outline = DocumentOutline {
                path: doc.path.clone(),
                line_count: doc.line_count(),
                frontmatter,
            };
            let layout = Self::layout(&doc.content, outline.content_start_line());

            let sections = Self::sections(idx, doc, &layout, outline.line_count);
            let before = structure.fragments.len();
            Self::scan_lines(
                idx,
                &doc.content,
                outline.content_start_line(),
                &layout,
                &mut structure.fragments,
                |line, text, is_heading| {
                    let found = detector.observe_line(text, is_heading);
                    if !found.is_empty() {
                        observed.push((idx, line, found));
                    }
                },
            );

            tracing::debug!(
                document = idx,
                path = doc.path.as_deref().unwrap_or("<inline>"),
                sections = sections.len(),
                fragments = structure.fragments.len() - before,
                "extracted document structure"
            );

            structure.sections.extend(sections);
            structure.documents.push(outline);
        }

        structure.domain_concepts = detector.concepts();
        let mut seen = BTreeSet::new();
        for (document, line, found) in observed {
            for candidate in found {
                if detector.qualifies(&candidate.term)
                    && seen.insert((document, line, candidate.term.clone()))
                {
                    structure.concept_mentions.push(ConceptMention {
                        document,
                        line,
                        term: candidate.term,
                    });
                }
            }
        }

        structure
    }

    /// Find ATX headings and code-block lines
    fn layout(content: &str, content_start: usize) -> Layout {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset);

        let mut layout = Layout::default();
        let mut heading: Option<(u8, usize, String)> = None;

        for (event, range) in MdParser::new(content).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    heading = Some((level as u8, range.start, String::new()));
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, _, ref mut buf)) = heading {
                        buf.push_str(&text);
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, start, text)) = heading.take() {
                        let line = line_of(start);
                        // setext headings and anything inside frontmatter are not boundaries
                        let is_atx = content[start..].trim_start().starts_with('#');
                        if is_atx && line >= content_start {
                            layout.headings.insert(line, (level, text.trim().to_string()));
                        }
                    }
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    let first = line_of(range.start);
                    let last = line_of(range.end.saturating_sub(1).max(range.start));
                    layout.code_lines.extend(first..=last);
                }
                _ => {}
            }
        }

        layout
    }

    fn sections(
        document: usize,
        doc: &SourceDocument,
        layout: &Layout,
        line_count: usize,
    ) -> Vec<Section> {
        let starts: Vec<usize> = layout.headings.keys().copied().collect();
        layout
            .headings
            .iter()
            .enumerate()
            .map(|(i, (&line, (level, text)))| {
                let end = starts
                    .get(i + 1)
                    .map_or(line_count, |next| next - 1)
                    .max(line);
                Section {
                    heading_text: text.clone(),
                    level: *level,
                    start_line: line,
                    end_line: end,
                    source_file: doc.path.clone(),
                    document,
                }
            })
            .collect()
    }

    /// Run the line recognizers and hand every concept-bearing line to `observe`
    fn scan_lines(
        document: usize,
        content: &str,
        content_start: usize,
        layout: &Layout,
        fragments: &mut Vec<Fragment>,
        mut observe: impl FnMut(usize, &str, bool),
    ) {
        let mut heading_stack: Vec<(u8, bool)> = Vec::new();

        for (idx, text) in content.lines().enumerate() {
            let line = idx + 1;
            if line < content_start {
                continue;
            }

            if let Some((level, heading)) = layout.headings.get(&line) {
                while heading_stack.last().is_some_and(|(l, _)| l >= level) {
                    heading_stack.pop();
                }
                let is_acceptance = heading.to_lowercase().contains(ACCEPTANCE_HEADING);
                heading_stack.push((*level, is_acceptance));

                // `### POST /users` style listings
                let kinds = patterns::endpoints(heading)
                    .into_iter()
                    .map(FragmentKind::Endpoint)
                    .chain(
                        patterns::dependency_cues(heading)
                            .into_iter()
                            .map(FragmentKind::DependencyCue),
                    );
                fragments.extend(kinds.map(|kind| Fragment {
                    document,
                    line,
                    kind,
                }));
                observe(line, heading, true);
                continue;
            }

            let mut push = |kind| {
                fragments.push(Fragment {
                    document,
                    line,
                    kind,
                })
            };

            // endpoint listings inside code fences still count
            for endpoint in patterns::endpoints(text) {
                push(FragmentKind::Endpoint(endpoint));
            }
            if layout.code_lines.contains(&line) {
                continue;
            }

            if let Some(story) = patterns::parse_user_story(text) {
                push(FragmentKind::UserStory(story));
            }

            let under_acceptance = heading_stack.iter().any(|(_, is_ac)| *is_ac);
            if patterns::is_gherkin_criterion(text)
                || (under_acceptance && patterns::checkbox_item(text).is_some())
            {
                push(FragmentKind::AcceptanceCriterion(patterns::clean_list_item(
                    text,
                )));
            }

            for cue in patterns::dependency_cues(text) {
                push(FragmentKind::DependencyCue(cue));
            }

            observe(line, text, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SPEC: &str = "\
# Shop

Intro about the Shop and its Catalog.

## Catalog

As a shopper, I want to browse products so that I can pick one.

GET /products

### Acceptance Criteria

- [ ] Products are listed
- [x] Prices are shown
- Given a product when it is out of stock then it is hidden

## Checkout

This requires Catalog.

```http
POST /orders
# not a heading
```
";

    #[test]
    fn headings_have_levels_and_line_spans() {
        let structure = StructureExtractor::new().extract(SPEC);
        let spans: Vec<_> = structure
            .sections
            .iter()
            .map(|s| (s.heading_text.as_str(), s.level, s.start_line, s.end_line))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("Shop", 1, 1, 4),
                ("Catalog", 2, 5, 10),
                ("Acceptance Criteria", 3, 11, 16),
                ("Checkout", 2, 17, 24),
            ]
        );
    }

    #[test]
    fn fragments_are_attached_to_lines() {
        let structure = StructureExtractor::new().extract(SPEC);
        assert_eq!(structure.acceptance_criteria_count(), 3);
        assert_eq!(structure.endpoint_count(), 2);

        let stories: Vec<_> = structure
            .fragments
            .iter()
            .filter_map(|f| match &f.kind {
                FragmentKind::UserStory(s) => Some((f.line, s.role.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(stories, vec![(7, "shopper")]);

        let cues: Vec<_> = structure
            .fragments
            .iter()
            .filter_map(|f| match &f.kind {
                FragmentKind::DependencyCue(c) => Some(c.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(cues, vec!["Catalog"]);
    }

    #[test]
    fn endpoints_and_cues_in_headings_are_kept() {
        let text = "## Users\n\n### POST /users\nCreates one.\n\n### Profile requires Users\n";
        let structure = StructureExtractor::new().extract(text);
        let found: Vec<_> = structure
            .fragments
            .iter()
            .map(|f| match &f.kind {
                FragmentKind::Endpoint(e) => (f.line, e.clone()),
                FragmentKind::DependencyCue(c) => (f.line, format!("cue {c}")),
                other => (f.line, format!("{other:?}")),
            })
            .collect();
        assert_eq!(
            found,
            vec![
                (3, "POST /users".to_string()),
                (6, "cue Users".to_string()),
            ]
        );
        assert_eq!(structure.sections.len(), 3);
    }

    #[test]
    fn checkboxes_outside_acceptance_headings_are_not_criteria() {
        let text = "## Tasks\n\n- [ ] write docs\n- [ ] ship\n";
        let structure = StructureExtractor::new().extract(text);
        assert_eq!(structure.acceptance_criteria_count(), 0);
    }

    #[test]
    fn repeated_capitalized_terms_become_concepts() {
        let structure = StructureExtractor::new().extract(SPEC);
        assert!(structure.domain_concepts.contains("Catalog"));
        assert!(structure.domain_concepts.contains("Shop"));
        assert!(!structure.domain_concepts.contains("Checkout"));
    }

    #[test]
    fn frontmatter_is_skipped_but_lines_keep_numbering() {
        let text = "---\ntitle: Billing\ndomain: Finance\n---\n## Invoices\nPOST /invoices\n";
        let structure = StructureExtractor::new().extract(text);
        assert_eq!(structure.sections.len(), 1);
        assert_eq!(structure.sections[0].start_line, 5);
        assert_eq!(
            structure.documents[0]
                .frontmatter
                .as_ref()
                .and_then(|f| f.domain.as_deref()),
            Some("Finance")
        );
        assert_eq!(structure.fragments[0].line, 6);
    }

    #[test]
    fn multi_document_input_tracks_files() {
        let docs = vec![
            SourceDocument::with_path("a.md", "## Alpha\nThe Ledger is shared.\n"),
            SourceDocument::with_path("b.md", "## Beta\nBeta writes the Ledger.\n"),
        ];
        let structure = StructureExtractor::new().extract_documents(&docs);
        assert_eq!(structure.documents.len(), 2);
        assert_eq!(structure.sections[1].document, 1);
        assert_eq!(structure.sections[1].source_file.as_deref(), Some("b.md"));
        assert!(structure.domain_concepts.contains("Ledger"));
    }

    #[test]
    fn empty_input_yields_empty_structure() {
        let structure = StructureExtractor::new().extract("");
        assert!(!structure.has_headings());
        assert!(structure.fragments.is_empty());
        assert_eq!(structure.documents.len(), 1);
    }
}
