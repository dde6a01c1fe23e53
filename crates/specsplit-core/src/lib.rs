//! Specsplit Core - specification decomposition engine
//!
//! Decides whether a specification should be split into independently
//! implementable changes, and how:
//! - Cuts the document into candidates at a heading level
//! - Aggregates endpoints, acceptance criteria, user stories and concepts
//! - Infers dependencies and a suggested implementation order
//! - Scores how independent each candidate is
//! - Applies merge / split / rename / retype edits, returning new results
//!
//! The engine is deterministic and side-effect free. Structural problems
//! become warnings on the result; only malformed edit requests are errors.
//!
//! # Example
//!
//! ```rust
//! use specsplit_core::{DecompositionConfig, SpecDecomposer};
//!
//! let spec = "\
//! ## Catalog
//! GET /products
//! - Given a product when listed then it is shown
//!
//! ## Cart
//! POST /cart
//! - Given a cart when I add a product then it grows
//! - Given a cart when I empty it then it has no items
//! ";
//!
//! let decomposer = SpecDecomposer::new(DecompositionConfig::default());
//! let result = decomposer.analyze(spec, Some("shop.md"), None);
//!
//! assert!(result.is_decomposable);
//! assert_eq!(result.changes.len(), 2);
//!
//! let merged = decomposer.merge(&result, &["c1", "c2"]).unwrap();
//! assert_eq!(merged.changes.len(), 1);
//! assert_eq!(merged.total_endpoints(), 2);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod boundary;
pub mod config;
pub mod dependency;
pub mod engine;
pub mod epic;
pub mod error;
pub mod naming;
pub mod refine;
pub mod scoring;
pub mod signals;
pub mod types;

pub use boundary::{BoundaryDetector, CandidateDraft};
pub use config::{ComplexityThresholds, DecompositionConfig, DependencyRules, ScoringWeights};
pub use dependency::{CandidateProfile, DependencyAnalyzer, DerivedEdge, EdgeReason};
pub use engine::SpecDecomposer;
pub use epic::EpicThresholdEvaluator;
pub use error::DecompositionError;
pub use refine::{invariant_violations, MergeOverride, SplitHint};
pub use scoring::{IndependenceScorer, ScoreInputs};
pub use signals::SignalCollector;
pub use types::{
    ChangeId, ChangeType, Complexity, DecomposedChange, DecompositionResult, Signal, Warning,
};

pub use specsplit_extract::{LineSpan, Section, SourceDocument, UserStory};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the decomposition engine
    pub use crate::{
        ChangeId, ChangeType, DecomposedChange, DecompositionConfig, DecompositionError,
        DecompositionResult, MergeOverride, SpecDecomposer, Warning,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
