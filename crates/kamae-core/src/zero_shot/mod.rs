//! Zero-shot stance prediction through natural-language inference.

pub mod expand;
pub mod hypothesis;
pub mod nli;
pub mod runner;

pub use expand::{expand_text, expand_texts};
pub use hypothesis::Hypotheses;
pub use nli::NliScorer;
pub use runner::{
    DEFAULT_BATCH_SIZE, EntailmentScorer, HypothesisGroup, RankedHypothesis, ZeroShotRunner,
};
