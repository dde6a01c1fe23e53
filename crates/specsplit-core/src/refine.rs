//! Refinement edits
//!
//! Each edit takes the current result by reference and returns a complete
//! new one. On error the input is untouched. Merge and split rebuild the
//! whole result from the stored documents; rename and retype only touch
//! display fields.

use crate::boundary::{coalesce_spans, CandidateDraft};
use crate::engine::{EdgeDerivation, SpecDecomposer};
use crate::error::{DecompositionError, Result};
use crate::naming::{validate_name, NameAllocator};
use crate::types::{ChangeId, ChangeType, DecomposedChange, DecompositionResult};
use specsplit_extract::patterns::clean_list_item;
use specsplit_extract::{DocumentStructure, LineSpan, Section};
use std::collections::BTreeSet;

/// Longest title taken from a split phrase line
const MAX_PART_TITLE_CHARS: usize = 60;

/// Optional identity for a merged change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOverride {
    pub name: Option<String>,
    pub title: Option<String>,
}

impl MergeOverride {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Where a split cuts a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitHint {
    /// Cut at every heading of this level
    Level(u8),
    /// Cut one level below the change's own headings
    NextLevel,
    /// Cut at every line containing this text (case-insensitive)
    Phrase(String),
}

impl SplitHint {
    /// `"3"`, `"h3"`, `"H3"` and `"###"` select a level; empty selects the
    /// next level down; anything else is a phrase
    #[must_use]
    pub fn parse(hint: &str) -> Self {
        let hint = hint.trim();
        if hint.is_empty() {
            return Self::NextLevel;
        }
        let digits = hint
            .strip_prefix(['h', 'H'])
            .unwrap_or(hint);
        if let Ok(level) = digits.parse::<u8>() {
            if (1..=6).contains(&level) {
                return Self::Level(level);
            }
        }
        if hint.len() <= 6 && hint.chars().all(|c| c == '#') {
            return Self::Level(hint.len() as u8);
        }
        Self::Phrase(hint.to_string())
    }
}

/// A line where a new part starts
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cut {
    document: usize,
    line: usize,
    title: String,
}

/// A split part being assembled
#[derive(Debug, Default)]
struct Part {
    title: String,
    spans: Vec<LineSpan>,
}

impl SpecDecomposer {
    /// Merge two or more changes into the first-listed one
    pub fn merge<S: AsRef<str>>(
        &self,
        result: &DecompositionResult,
        ids: &[S],
    ) -> Result<DecompositionResult> {
        self.merge_with(result, ids, MergeOverride::default())
    }

    /// Merge, optionally renaming and retitling the merged change
    pub fn merge_with<S: AsRef<str>>(
        &self,
        result: &DecompositionResult,
        ids: &[S],
        overrides: MergeOverride,
    ) -> Result<DecompositionResult> {
        if ids.len() < 2 {
            return Err(DecompositionError::invalid_operation(format!(
                "merge needs at least two change ids, got {}",
                ids.len()
            )));
        }
        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            let index = lookup(result, id.as_ref())?;
            if members.contains(&index) {
                return Err(DecompositionError::invalid_operation(format!(
                    "change id '{}' listed twice in merge",
                    id.as_ref()
                )));
            }
            members.push(index);
        }

        let first = &result.changes[members[0]];
        let member_ids: BTreeSet<&ChangeId> = members.iter().map(|&i| &result.changes[i].id).collect();

        if let Some(name) = overrides.name.as_deref() {
            validate_name(name)?;
            let taken = result
                .changes
                .iter()
                .any(|c| c.name == name && !member_ids.contains(&c.id));
            if taken {
                return Err(DecompositionError::invalid_name(
                    name,
                    "already used by another change",
                ));
            }
        }
        let title = match overrides.title.as_deref().map(str::trim) {
            Some("") => {
                return Err(DecompositionError::invalid_operation(
                    "merged title cannot be empty",
                ));
            }
            Some(title) => title.to_string(),
            None => first.title.clone(),
        };

        let mut spans = Vec::new();
        let mut sections: Vec<Section> = Vec::new();
        for &i in &members {
            spans.extend(result.changes[i].spans.iter().copied());
            sections.extend(result.changes[i].sections.iter().cloned());
        }
        sections.sort_by_key(Section::position);
        sections.dedup_by_key(|s| s.position());

        let merged = CandidateDraft {
            id: first.id.clone(),
            name: overrides.name.unwrap_or_else(|| first.name.clone()),
            title,
            change_type: first.change_type,
            domain: first.domain.clone(),
            spans: coalesce_spans(spans),
            sections,
        };

        let anchor = members.iter().copied().min().unwrap_or(members[0]);
        let mut merged = Some(merged);
        let drafts: Vec<CandidateDraft> = result
            .changes
            .iter()
            .enumerate()
            .filter_map(|(i, change)| {
                if i == anchor {
                    merged.take()
                } else if members.contains(&i) {
                    None
                } else {
                    Some(CandidateDraft::from_change(change))
                }
            })
            .collect();

        let carried: Vec<(ChangeId, ChangeId)> = result
            .edges()
            .into_iter()
            .map(|(from, to)| {
                let remap = |id: ChangeId| if member_ids.contains(&id) { first.id.clone() } else { id };
                (remap(from), remap(to))
            })
            .filter(|(from, to)| from != to)
            .collect();

        tracing::debug!(merged = ?member_ids, into = %first.id, "merging changes");
        Ok(self.rebuild(result, drafts, &carried))
    }

    /// Split a change into two or more parts at the boundaries `hint` names
    pub fn split(
        &self,
        result: &DecompositionResult,
        id: &str,
        hint: &str,
    ) -> Result<DecompositionResult> {
        let index = lookup(result, id)?;
        let target = &result.changes[index];
        let structure = self.extract(&result.documents);

        let hint = SplitHint::parse(hint);
        let cuts = match &hint {
            SplitHint::Level(level) => heading_cuts(&structure, &target.spans, *level),
            SplitHint::NextLevel => {
                let level = target
                    .sections
                    .iter()
                    .map(|s| s.level)
                    .min()
                    .unwrap_or(self.config().boundary_level)
                    .saturating_add(1)
                    .min(6);
                heading_cuts(&structure, &target.spans, level)
            }
            SplitHint::Phrase(phrase) => {
                phrase_cuts(&structure, &result.documents, &target.spans, phrase)
            }
        };

        let parts = partition(&target.spans, &cuts);
        if parts.len() < 2 {
            return Err(DecompositionError::invalid_operation(format!(
                "split hint {hint:?} yields {} part(s) for change {id}; need at least two",
                parts.len()
            )));
        }

        let mut taken_ids: BTreeSet<ChangeId> = result
            .changes
            .iter()
            .filter(|c| c.id != target.id)
            .map(|c| c.id.clone())
            .collect();
        let mut names = NameAllocator::with_taken(
            result
                .changes
                .iter()
                .filter(|c| c.id != target.id)
                .map(|c| c.name.clone()),
        );

        let mut suffix = 0;
        let mut part_drafts = Vec::with_capacity(parts.len());
        for (n, part) in parts.into_iter().enumerate() {
            let mut part_id = target.id.part(suffix);
            while taken_ids.contains(&part_id) {
                suffix += 1;
                part_id = target.id.part(suffix);
            }
            suffix += 1;
            taken_ids.insert(part_id.clone());

            let title = if part.title.is_empty() {
                format!("{} part {}", target.title, n + 1)
            } else {
                part.title
            };
            let spans = coalesce_spans(part.spans);
            let sections = target
                .sections
                .iter()
                .filter(|s| spans.iter().any(|span| span.contains(s.document, s.start_line)))
                .cloned()
                .collect();
            part_drafts.push(CandidateDraft {
                id: part_id,
                name: names.allocate(&title),
                title,
                change_type: target.change_type,
                domain: target.domain.clone(),
                spans,
                sections,
            });
        }
        let part_ids: Vec<ChangeId> = part_drafts.iter().map(|d| d.id.clone()).collect();

        let mut drafts = Vec::with_capacity(result.changes.len() + part_drafts.len());
        let mut part_drafts = Some(part_drafts);
        for (i, change) in result.changes.iter().enumerate() {
            if i == index {
                drafts.extend(part_drafts.take().unwrap_or_default());
            } else {
                drafts.push(CandidateDraft::from_change(change));
            }
        }

        // edges touching the original are duplicated onto every part
        let expand = |id: ChangeId| -> Vec<ChangeId> {
            if id == target.id {
                part_ids.clone()
            } else {
                vec![id]
            }
        };
        let mut carried = Vec::new();
        for (from, to) in result.edges() {
            let targets = expand(to);
            for from in expand(from) {
                for to in &targets {
                    if &from != to {
                        carried.push((from.clone(), to.clone()));
                    }
                }
            }
        }

        tracing::debug!(change = %target.id, parts = ?part_ids, "splitting change");
        Ok(self.rebuild_with(result, &structure, drafts, &carried))
    }

    /// Give a change a new slug name
    pub fn rename(
        &self,
        result: &DecompositionResult,
        id: &str,
        new_name: &str,
    ) -> Result<DecompositionResult> {
        let index = lookup(result, id)?;
        validate_name(new_name)?;
        if let Some(other) = result
            .changes
            .iter()
            .find(|c| c.name == new_name && c.id != id)
        {
            return Err(DecompositionError::invalid_name(
                new_name,
                format!("already used by change {}", other.id),
            ));
        }

        let mut next = result.clone();
        next.changes[index].name = new_name.to_string();
        Ok(next)
    }

    /// Change the type of a change
    pub fn retype(
        &self,
        result: &DecompositionResult,
        id: &str,
        new_type: ChangeType,
    ) -> Result<DecompositionResult> {
        let index = lookup(result, id)?;
        let mut next = result.clone();
        next.changes[index].change_type = new_type;
        Ok(next)
    }

    fn rebuild(
        &self,
        result: &DecompositionResult,
        drafts: Vec<CandidateDraft>,
        carried: &[(ChangeId, ChangeId)],
    ) -> DecompositionResult {
        let structure = self.extract(&result.documents);
        self.rebuild_with(result, &structure, drafts, carried)
    }

    fn rebuild_with(
        &self,
        result: &DecompositionResult,
        structure: &DocumentStructure,
        drafts: Vec<CandidateDraft>,
        carried: &[(ChangeId, ChangeId)],
    ) -> DecompositionResult {
        self.assemble(
            result.documents.clone(),
            structure,
            drafts,
            carried,
            EdgeDerivation::Refinement,
            result.analysis_date,
        )
    }
}

fn lookup(result: &DecompositionResult, id: &str) -> Result<usize> {
    result
        .index_of(id)
        .ok_or_else(|| DecompositionError::invalid_operation(format!("unknown change id '{id}'")))
}

/// Headings of `level` inside `spans`
fn heading_cuts(structure: &DocumentStructure, spans: &[LineSpan], level: u8) -> Vec<Cut> {
    structure
        .sections_in(spans)
        .filter(|s| s.level == level)
        .map(|s| Cut {
            document: s.document,
            line: s.start_line,
            title: s.heading_text.clone(),
        })
        .collect()
}

/// Content lines inside `spans` containing `phrase`, case-insensitively
fn phrase_cuts(
    structure: &DocumentStructure,
    documents: &[specsplit_extract::SourceDocument],
    spans: &[LineSpan],
    phrase: &str,
) -> Vec<Cut> {
    let needle = phrase.to_lowercase();
    let mut cuts = Vec::new();
    for span in spans {
        let (Some(document), Some(outline)) = (
            documents.get(span.document),
            structure.documents.get(span.document),
        ) else {
            continue;
        };
        let first = span.start_line.max(outline.content_start_line());
        for (idx, text) in document.content.lines().enumerate() {
            let line = idx + 1;
            if line < first || line > span.end_line || !text.to_lowercase().contains(&needle) {
                continue;
            }
            let title = structure
                .sections
                .iter()
                .find(|s| s.document == span.document && s.start_line == line)
                .map_or_else(|| part_title(text), |s| s.heading_text.clone());
            cuts.push(Cut {
                document: span.document,
                line,
                title,
            });
        }
    }
    cuts
}

fn part_title(line: &str) -> String {
    let text = clean_list_item(line);
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '#');
    match text.char_indices().nth(MAX_PART_TITLE_CHARS) {
        Some((end, _)) => text[..end].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Cut `spans` into parts; lines before the first cut join the first part
fn partition(spans: &[LineSpan], cuts: &[Cut]) -> Vec<Part> {
    let mut spans = spans.to_vec();
    spans.sort_unstable();
    let mut parts: Vec<Part> = Vec::new();
    let mut lead: Vec<LineSpan> = Vec::new();

    for span in spans {
        let mut start = span.start_line;
        let mut span_cuts: Vec<&Cut> = cuts
            .iter()
            .filter(|c| span.contains(c.document, c.line))
            .collect();
        span_cuts.sort_by_key(|c| c.line);
        span_cuts.dedup_by_key(|c| c.line);

        for cut in span_cuts {
            if cut.line > start {
                current(&mut parts, &mut lead).push(LineSpan::new(span.document, start, cut.line - 1));
            }
            parts.push(Part {
                title: cut.title.clone(),
                spans: Vec::new(),
            });
            start = cut.line;
        }
        current(&mut parts, &mut lead).push(LineSpan::new(span.document, start, span.end_line));
    }

    if let Some(first) = parts.first_mut() {
        lead.append(&mut first.spans);
        first.spans = lead;
    }
    parts
}

fn current<'a>(parts: &'a mut [Part], lead: &'a mut Vec<LineSpan>) -> &'a mut Vec<LineSpan> {
    match parts.last_mut() {
        Some(part) => &mut part.spans,
        None => lead,
    }
}

/// Whether the result still satisfies its structural invariants.
///
/// Returns a description of every violation found.
#[must_use]
pub fn invariant_violations(result: &DecompositionResult) -> Vec<String> {
    let mut violations = Vec::new();
    let ids: BTreeSet<&ChangeId> = result.changes.iter().map(|c| &c.id).collect();
    if ids.len() != result.changes.len() {
        violations.push("duplicate change ids".to_string());
    }
    let names: BTreeSet<&str> = result.changes.iter().map(|c| c.name.as_str()).collect();
    if names.len() != result.changes.len() {
        violations.push("duplicate change names".to_string());
    }

    for change in &result.changes {
        check_change(change, &ids, &mut violations);
    }

    let ordered: BTreeSet<&ChangeId> = result.suggested_order.iter().collect();
    if ordered != ids || result.suggested_order.len() != result.changes.len() {
        violations.push("suggested order is not a permutation of the change ids".to_string());
    }
    if !result.has_cycle() {
        let position = |id: &ChangeId| result.suggested_order.iter().position(|o| o == id);
        for (from, to) in result.edges() {
            if position(&to) > position(&from) {
                violations.push(format!("{to} is ordered after its dependent {from}"));
            }
        }
    }
    for concept in &result.shared_concepts {
        if result.concept_owners(concept).len() < 2 {
            violations.push(format!("shared concept '{concept}' has fewer than two owners"));
        }
    }
    if result.is_decomposable != (result.changes.len() >= 2) {
        violations.push("is_decomposable disagrees with the change count".to_string());
    }
    violations
}

fn check_change(change: &DecomposedChange, ids: &BTreeSet<&ChangeId>, violations: &mut Vec<String>) {
    if !(0.0..=1.0).contains(&change.independence_score) {
        violations.push(format!(
            "{} has score {} outside [0, 1]",
            change.id, change.independence_score
        ));
    }
    if change.dependencies.contains(&change.id) {
        violations.push(format!("{} depends on itself", change.id));
    }
    for dep in &change.dependencies {
        if !ids.contains(dep) {
            violations.push(format!("{} depends on unknown change {dep}", change.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_parsing() {
        assert_eq!(SplitHint::parse("3"), SplitHint::Level(3));
        assert_eq!(SplitHint::parse("h4"), SplitHint::Level(4));
        assert_eq!(SplitHint::parse(" H2 "), SplitHint::Level(2));
        assert_eq!(SplitHint::parse("###"), SplitHint::Level(3));
        assert_eq!(SplitHint::parse(""), SplitHint::NextLevel);
        assert_eq!(SplitHint::parse("h9"), SplitHint::Phrase("h9".into()));
        assert_eq!(
            SplitHint::parse("Admin view"),
            SplitHint::Phrase("Admin view".into())
        );
    }

    #[test]
    fn partition_absorbs_lead_into_first_part() {
        let cut = |line: usize, title: &str| Cut {
            document: 0,
            line,
            title: title.into(),
        };
        let parts = partition(&[LineSpan::new(0, 10, 30)], &[cut(14, "A"), cut(22, "B")]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].title, "A");
        assert_eq!(
            parts[0].spans,
            vec![LineSpan::new(0, 10, 13), LineSpan::new(0, 14, 21)]
        );
        assert_eq!(parts[1].spans, vec![LineSpan::new(0, 22, 30)]);
    }

    #[test]
    fn partition_without_cuts_is_empty() {
        assert!(partition(&[LineSpan::new(0, 1, 5)], &[]).is_empty());
    }

    #[test]
    fn part_titles_are_trimmed() {
        assert_eq!(part_title("- [ ] Admin view of orders"), "Admin view of orders");
        let long = "x".repeat(80);
        assert_eq!(part_title(&long).len(), MAX_PART_TITLE_CHARS);
    }
}
