//! # Zero-Shot Runner
//!
//! Scores expanded rows against their entity's stance hypotheses in
//! fixed-size chunks and keeps the top-ranked stance.

use crate::error::{KamaeError, Result};
use crate::types::{ExpandedRow, Stance};
use crate::zero_shot::hypothesis::Hypotheses;

/// Rows scored per scorer call.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// One premise with its candidate hypotheses.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisGroup<'a> {
    pub premise: &'a str,
    pub hypotheses: Vec<&'a str>,
}

/// Entailment model seam.
///
/// Implementations return, for every group, one score per hypothesis in the
/// same order. Groups must be scored independently of each other.
pub trait EntailmentScorer {
    fn score_batch(&self, groups: &[HypothesisGroup<'_>]) -> Result<Vec<Vec<f32>>>;
}

impl<S: EntailmentScorer + ?Sized> EntailmentScorer for &S {
    fn score_batch(&self, groups: &[HypothesisGroup<'_>]) -> Result<Vec<Vec<f32>>> {
        (**self).score_batch(groups)
    }
}

/// A hypothesis with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHypothesis {
    pub stance: Stance,
    pub hypothesis: String,
    pub score: f32,
}

fn rank_scores(hypotheses: &Hypotheses, scores: &[f32]) -> Result<Vec<RankedHypothesis>> {
    let candidates = hypotheses.candidates();
    if scores.len() != candidates.len() {
        return Err(KamaeError::InferenceError(format!(
            "expected {} scores, got {}",
            candidates.len(),
            scores.len()
        )));
    }

    let mut ranked: Vec<RankedHypothesis> = candidates
        .iter()
        .zip(scores)
        .map(|((stance, hypothesis), &score)| RankedHypothesis {
            stance: *stance,
            hypothesis: hypothesis.to_string(),
            score,
        })
        .collect();
    // Stable sort keeps candidate order on ties.
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(ranked)
}

/// Drives an [`EntailmentScorer`] over expanded rows.
pub struct ZeroShotRunner<S> {
    scorer: S,
    batch_size: usize,
}

impl<S: EntailmentScorer> ZeroShotRunner<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            scorer,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the chunk size (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Ranks the stance hypotheses for one premise.
    pub fn rank(&self, premise: &str, entity: &str) -> Result<Vec<RankedHypothesis>> {
        let hypotheses = Hypotheses::for_entity(entity);
        let group = HypothesisGroup {
            premise,
            hypotheses: hypotheses.candidates().iter().map(|(_, h)| *h).collect(),
        };
        let mut scores = self.scorer.score_batch(std::slice::from_ref(&group))?;
        let scores = scores
            .pop()
            .ok_or_else(|| KamaeError::InferenceError("scorer returned no scores".into()))?;
        rank_scores(&hypotheses, &scores)
    }

    /// Fills `predicted_stance` for every row with a detected entity.
    ///
    /// Passthrough rows are left unscored. Any scorer failure aborts the
    /// whole run.
    pub fn predict(&self, mut rows: Vec<ExpandedRow>) -> Result<Vec<ExpandedRow>> {
        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_passthrough())
            .map(|(i, _)| i)
            .collect();
        let total_batches = targets.len().div_ceil(self.batch_size);

        for (batch_idx, chunk) in targets.chunks(self.batch_size).enumerate() {
            let hypotheses: Vec<Hypotheses> = chunk
                .iter()
                .map(|&i| Hypotheses::for_entity(&rows[i].entity))
                .collect();
            let groups: Vec<HypothesisGroup<'_>> = chunk
                .iter()
                .zip(&hypotheses)
                .map(|(&i, h)| HypothesisGroup {
                    premise: rows[i].text_with_entity.as_str(),
                    hypotheses: h.candidates().iter().map(|(_, text)| *text).collect(),
                })
                .collect();

            let scores = self.scorer.score_batch(&groups)?;
            if scores.len() != groups.len() {
                return Err(KamaeError::InferenceError(format!(
                    "scorer returned {} results for {} inputs",
                    scores.len(),
                    groups.len()
                )));
            }

            let mut predicted = Vec::with_capacity(chunk.len());
            for (h, s) in hypotheses.iter().zip(&scores) {
                let ranked = rank_scores(h, s)?;
                predicted.push(ranked[0].stance);
            }

            for (&i, stance) in chunk.iter().zip(predicted) {
                rows[i].predicted_stance = Some(stance);
            }

            tracing::debug!(
                batch = batch_idx + 1,
                total = total_batches,
                size = chunk.len(),
                "scored zero-shot batch"
            );
        }

        tracing::info!(
            scored = targets.len(),
            unscored = rows.len() - targets.len(),
            "zero-shot prediction complete"
        );
        Ok(rows)
    }
}
