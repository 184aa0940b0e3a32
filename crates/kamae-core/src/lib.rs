//! # Kamae Core
//!
//! Entity-conditioned stance detection. Resolves entity mentions in free
//! text, marks them for the model, reshapes annotated tables into training
//! examples, and predicts stance either with a fine-tuned classifier or
//! zero-shot through natural-language inference.
//!
//! ## Quick Start
//!
//! ```rust
//! use kamae_core::{EntityCatalog, EntityResolver, TextAnnotator};
//! use kamae_core::zero_shot::expand_text;
//!
//! let catalog = EntityCatalog::default();
//! let resolver = EntityResolver::from_catalog(&catalog).unwrap();
//! let annotator = TextAnnotator::default();
//!
//! let rows = expand_text("The insurance CEO is awful", &resolver, &annotator).unwrap();
//!
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].entity, "Brian Thompson");
//! assert_eq!(
//!     rows[1].text_with_entity,
//!     "<entity>United Healthcare</entity> The insurance CEO is awful"
//! );
//! ```
pub mod dataset;
pub mod entity;
pub mod error;
pub mod io;
pub mod model;
pub mod types;
pub mod zero_shot;

// Re-export primary API
pub use dataset::{
    DropReason, DropStats, LengthFilter, Reshaped, Split, TokenCounter, Verdict, WideTable,
    reshape, stratified_split,
};
pub use entity::{AliasTable, EntityCatalog, EntityResolver, EntitySpec, Markers, TextAnnotator};
pub use error::{KamaeError, Result};
pub use model::{SequenceClassifier, StanceClassifier, StancePrediction};
pub use types::{AnnotatedRecord, ExpandedRow, NO_ENTITY, Stance};
pub use zero_shot::{EntailmentScorer, Hypotheses, NliScorer, ZeroShotRunner};
