//! # Drop Predicates
//!
//! Silent-drop policies (missing or unrecognized stance, token overflow)
//! expressed as explicit verdicts so callers can count and log what was
//! removed without treating it as an error.

use std::fmt;

use serde::Serialize;
use tokenizers::Tokenizer as HfTokenizer;

use crate::error::{KamaeError, Result};
use crate::types::{AnnotatedRecord, Stance};

/// Default token budget of the downstream encoder.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The stance cell was empty.
    MissingStance,
    /// The stance cell held something other than favor/neutral/against.
    UnrecognizedStance(String),
    /// The marked text encodes to more tokens than the budget allows.
    TooManyTokens { tokens: usize, max_length: usize },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStance => write!(f, "missing stance"),
            Self::UnrecognizedStance(v) => write!(f, "unrecognized stance {v:?}"),
            Self::TooManyTokens { tokens, max_length } => {
                write!(f, "{tokens} tokens exceeds limit of {max_length}")
            }
        }
    }
}

/// Outcome of a drop predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<T> {
    Keep(T),
    Drop(DropReason),
}

impl<T> Verdict<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep(_))
    }
}

/// Stance cell predicate: keeps exact `favor|neutral|against` values.
pub fn check_stance(cell: Option<&str>) -> Verdict<Stance> {
    match cell {
        None => Verdict::Drop(DropReason::MissingStance),
        Some(value) => match Stance::parse(value) {
            Some(stance) => Verdict::Keep(stance),
            None => Verdict::Drop(DropReason::UnrecognizedStance(value.to_string())),
        },
    }
}

/// Per-reason drop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropStats {
    pub missing_stance: usize,
    pub unrecognized_stance: usize,
    pub too_many_tokens: usize,
}

impl DropStats {
    pub fn record(&mut self, reason: &DropReason) {
        match reason {
            DropReason::MissingStance => self.missing_stance += 1,
            DropReason::UnrecognizedStance(_) => self.unrecognized_stance += 1,
            DropReason::TooManyTokens { .. } => self.too_many_tokens += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_stance + self.unrecognized_stance + self.too_many_tokens
    }

    pub fn merge(&mut self, other: &DropStats) {
        self.missing_stance += other.missing_stance;
        self.unrecognized_stance += other.unrecognized_stance;
        self.too_many_tokens += other.too_many_tokens;
    }
}

/// Counts tokens the way the downstream encoder will see them.
pub trait TokenCounter {
    /// Number of tokens for `text`, special tokens included, no truncation.
    fn count_tokens(&self, text: &str) -> Result<usize>;
}

/// Counts with the tokenizer's own settings; load it through
/// [`crate::model::load_tokenizer`] so truncation is disabled.
impl TokenCounter for HfTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .encode(text, true)
            .map_err(|e| KamaeError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().len())
    }
}

/// Drops records whose marked text exceeds the token budget.
///
/// Guards against silent truncation cutting away the marked entity span.
pub struct LengthFilter<'a, C: TokenCounter + ?Sized> {
    counter: &'a C,
    max_length: usize,
}

impl<'a, C: TokenCounter + ?Sized> LengthFilter<'a, C> {
    pub fn new(counter: &'a C, max_length: usize) -> Self {
        Self {
            counter,
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn check(&self, text: &str) -> Result<Verdict<usize>> {
        let tokens = self.counter.count_tokens(text)?;
        Ok(if tokens <= self.max_length {
            Verdict::Keep(tokens)
        } else {
            Verdict::Drop(DropReason::TooManyTokens {
                tokens,
                max_length: self.max_length,
            })
        })
    }

    /// Keeps records within budget; surviving records are returned untouched.
    pub fn apply(
        &self,
        records: Vec<AnnotatedRecord>,
        stats: &mut DropStats,
    ) -> Result<Vec<AnnotatedRecord>> {
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            match self.check(&record.text_with_entity)? {
                Verdict::Keep(_) => kept.push(record),
                Verdict::Drop(reason) => {
                    tracing::debug!(entity = %record.entity, %reason, "dropping record");
                    stats.record(&reason);
                }
            }
        }
        Ok(kept)
    }
}
