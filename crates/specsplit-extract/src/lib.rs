//! Specsplit Structure Extraction
//!
//! Turns raw specification text into a structural model the decomposition
//! engine can reason about:
//!
//! - Headings with level and line span (CommonMark-aware, so `#` inside a
//!   fenced code block is never a boundary)
//! - User stories (`As a <role>, I want <capability> so that <benefit>`)
//! - Acceptance criteria (Given/When/Then lines, checkbox items under an
//!   "Acceptance Criteria" heading)
//! - API endpoint mentions (`METHOD /path`)
//! - Explicit dependency cues (`requires <term>`, `after <term> is complete`)
//! - Repeated Title Case domain concepts
//!
//! Extraction never fails: text that matches nothing yields empty
//! collections.
//!
//! # Example
//!
//! ```rust
//! use specsplit_extract::StructureExtractor;
//!
//! let text = "## Orders\n\nPOST /orders\n\n- Given a cart when I pay then an Order exists\n";
//! let structure = StructureExtractor::new().extract(text);
//!
//! assert_eq!(structure.sections.len(), 1);
//! assert_eq!(structure.endpoint_count(), 1);
//! assert_eq!(structure.acceptance_criteria_count(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod concepts;
pub mod document;
pub mod extractor;
pub mod patterns;
pub mod structure;

pub use concepts::ConceptDetector;
pub use document::{Frontmatter, SourceDocument};
pub use extractor::StructureExtractor;
pub use structure::{
    ConceptMention, DocumentOutline, DocumentStructure, Fragment, FragmentKind, LineSpan,
    Section, UserStory,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
