//! Epic grouping recommendation

use crate::naming::slugify;
use specsplit_extract::DocumentStructure;

/// Recommends grouping once a result has enough changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpicThresholdEvaluator {
    threshold: usize,
}

impl EpicThresholdEvaluator {
    #[inline]
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Whether `change_count` changes warrant an epic
    #[inline]
    #[must_use]
    pub fn recommend(&self, change_count: usize) -> bool {
        change_count >= self.threshold
    }

    /// Suggested epic slug: frontmatter title, first H1, or path stem
    #[must_use]
    pub fn epic_name(&self, structure: &DocumentStructure) -> Option<String> {
        let first = structure.documents.first()?;
        first
            .frontmatter
            .as_ref()
            .and_then(|fm| fm.title.clone())
            .or_else(|| {
                structure
                    .sections
                    .iter()
                    .find(|s| s.level == 1)
                    .map(|s| s.heading_text.clone())
            })
            .or_else(|| {
                let path = first.path.as_deref()?;
                specsplit_extract::SourceDocument::with_path(path, "")
                    .stem()
                    .map(str::to_string)
            })
            .map(|title| slugify(&title))
    }
}

impl Default for EpicThresholdEvaluator {
    fn default() -> Self {
        Self::new(3)
    }
}
