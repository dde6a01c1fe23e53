//! Structural model produced by extraction

use crate::document::Frontmatter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A heading and the contiguous lines it governs
///
/// `end_line` is the line before the next heading of any level, or the
/// last line of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text without markup
    pub heading_text: String,
    /// Heading level (1-6)
    pub level: u8,
    /// Line of the heading (1-based)
    pub start_line: usize,
    /// Last line governed by the heading (inclusive)
    pub end_line: usize,
    /// Source file, for multi-document input
    pub source_file: Option<String>,
    /// Index of the document within the analyzed input
    pub document: usize,
}

impl Section {
    /// Position key for document ordering
    #[inline]
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        (self.document, self.start_line)
    }
}

/// An inclusive line range within one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    /// Index of the document within the analyzed input
    pub document: usize,
    /// First line (1-based, inclusive)
    pub start_line: usize,
    /// Last line (inclusive)
    pub end_line: usize,
}

impl LineSpan {
    /// Create a span
    #[inline]
    #[must_use]
    pub fn new(document: usize, start_line: usize, end_line: usize) -> Self {
        Self {
            document,
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// Whether a line of a document falls inside this span
    #[inline]
    #[must_use]
    pub fn contains(&self, document: usize, line: usize) -> bool {
        self.document == document && (self.start_line..=self.end_line).contains(&line)
    }
}

/// `As a <role>, I want <capability> so that <benefit>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserStory {
    pub role: String,
    pub capability: String,
    pub benefit: String,
}

/// What a matched line contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FragmentKind {
    /// A user story triple
    UserStory(UserStory),
    /// Acceptance criterion text
    AcceptanceCriterion(String),
    /// `METHOD /path`
    Endpoint(String),
    /// Term named by a `requires ...` / `after ... is complete` phrase
    DependencyCue(String),
}

/// A signal fragment anchored to a document line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub document: usize,
    pub line: usize,
    pub kind: FragmentKind,
}

/// One occurrence of a qualifying domain concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptMention {
    pub document: usize,
    pub line: usize,
    pub term: String,
}

/// Per-document facts recorded during extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub path: Option<String>,
    pub line_count: usize,
    pub frontmatter: Option<Frontmatter>,
}

impl DocumentOutline {
    /// First line that carries content (after frontmatter)
    #[inline]
    #[must_use]
    pub fn content_start_line(&self) -> usize {
        self.frontmatter.as_ref().map_or(1, |fm| fm.end_line + 1)
    }

    /// Span covering the whole document
    #[inline]
    #[must_use]
    pub fn full_span(&self, document: usize) -> LineSpan {
        LineSpan::new(document, 1, self.line_count.max(1))
    }
}

/// Everything extracted from one analysis input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// One outline per input document, in input order
    pub documents: Vec<DocumentOutline>,
    /// All headings, in document order
    pub sections: Vec<Section>,
    /// Signal fragments, in document order
    pub fragments: Vec<Fragment>,
    /// Mentions of qualifying domain concepts, in document order
    pub concept_mentions: Vec<ConceptMention>,
    /// Concepts that qualified across the whole input
    pub domain_concepts: BTreeSet<String>,
}

impl DocumentStructure {
    /// Whether the input has any heading at all
    #[inline]
    #[must_use]
    pub fn has_headings(&self) -> bool {
        !self.sections.is_empty()
    }

    /// Headings at exactly `level`
    pub fn sections_at_level(&self, level: u8) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.level == level)
    }

    /// Headings whose heading line lies inside any of `spans`
    pub fn sections_in<'a>(&'a self, spans: &'a [LineSpan]) -> impl Iterator<Item = &'a Section> {
        self.sections.iter().filter(move |s| {
            spans
                .iter()
                .any(|span| span.contains(s.document, s.start_line))
        })
    }

    /// Fragments anchored inside any of `spans`
    pub fn fragments_in<'a>(
        &'a self,
        spans: &'a [LineSpan],
    ) -> impl Iterator<Item = &'a Fragment> {
        self.fragments
            .iter()
            .filter(move |f| spans.iter().any(|span| span.contains(f.document, f.line)))
    }

    /// Distinct concepts mentioned inside any of `spans`
    #[must_use]
    pub fn concepts_in(&self, spans: &[LineSpan]) -> BTreeSet<String> {
        self.concept_mentions
            .iter()
            .filter(|m| spans.iter().any(|span| span.contains(m.document, m.line)))
            .map(|m| m.term.clone())
            .collect()
    }

    /// Total acceptance criteria across the input
    #[must_use]
    pub fn acceptance_criteria_count(&self) -> usize {
        self.fragments
            .iter()
            .filter(|f| matches!(f.kind, FragmentKind::AcceptanceCriterion(_)))
            .count()
    }

    /// Total endpoint mentions across the input (distinct per document)
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.fragments
            .iter()
            .filter_map(|f| match &f.kind {
                FragmentKind::Endpoint(e) => Some((f.document, e.as_str())),
                _ => None,
            })
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Span covering every document, one per document
    #[must_use]
    pub fn whole_input_spans(&self) -> Vec<LineSpan> {
        self.documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| doc.full_span(idx))
            .collect()
    }
}
