//! # NLI Scorer
//!
//! Entailment scoring with an NLI-finetuned DistilBERT checkpoint.

use std::path::Path;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use tokenizers::{Tokenizer, TruncationStrategy};

use crate::dataset::DEFAULT_MAX_LENGTH;
use crate::error::{KamaeError, Result};
use crate::model::{
    ModelConfig, ModelDir, SequenceClassifier, encode_batch, load_tokenizer, truncate_to,
};
use crate::zero_shot::runner::{EntailmentScorer, HypothesisGroup};

/// Scores hypotheses by their entailment logit, softmaxed within each group.
pub struct NliScorer {
    model: SequenceClassifier,
    tokenizer: Tokenizer,
    entailment_id: usize,
    device: Device,
}

impl NliScorer {
    /// Loads an NLI model directory whose config names an `entailment` label.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = ModelDir::new(dir.as_ref());
        dir.ensure_complete()?;

        let config = ModelConfig::from_file(dir.config())?;
        let entailment_id = config.entailment_id()?;
        let num_labels = config.num_labels();

        // Premises are truncated, hypotheses never.
        let mut tokenizer = load_tokenizer(dir.tokenizer())?;
        truncate_to(&mut tokenizer, DEFAULT_MAX_LENGTH, TruncationStrategy::OnlyFirst)?;

        let device = Device::Cpu;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[dir.weights()], DType::F32, &device) }
            .map_err(|e| KamaeError::ModelLoadError(e.to_string()))?;
        let model = SequenceClassifier::load(vb, &config, num_labels)
            .map_err(|e| KamaeError::ModelLoadError(e.to_string()))?;

        tracing::info!(
            dir = %dir.root().display(),
            num_labels,
            entailment_id,
            "loaded NLI model"
        );
        Self::from_parts(model, tokenizer, entailment_id, device)
    }

    pub fn from_parts(
        model: SequenceClassifier,
        tokenizer: Tokenizer,
        entailment_id: usize,
        device: Device,
    ) -> Result<Self> {
        if entailment_id >= model.num_labels() {
            return Err(KamaeError::ModelLoadError(format!(
                "entailment id {entailment_id} outside {} labels",
                model.num_labels()
            )));
        }
        Ok(Self {
            model,
            tokenizer,
            entailment_id,
            device,
        })
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl EntailmentScorer for NliScorer {
    fn score_batch(&self, groups: &[HypothesisGroup<'_>]) -> Result<Vec<Vec<f32>>> {
        let pairs: Vec<(&str, &str)> = groups
            .iter()
            .flat_map(|g| g.hypotheses.iter().map(move |h| (g.premise, *h)))
            .collect();
        if pairs.is_empty() {
            return Ok(vec![Vec::new(); groups.len()]);
        }

        let batch = encode_batch(&self.tokenizer, pairs, &self.device)?;
        let logits = self
            .model
            .forward(&batch.input_ids, &batch.pad_mask)?
            .to_vec2::<f32>()?;

        let mut rows = logits.into_iter();
        let mut scores = Vec::with_capacity(groups.len());
        for group in groups {
            let entailment: Vec<f32> = rows
                .by_ref()
                .take(group.hypotheses.len())
                .map(|row| row[self.entailment_id])
                .collect();
            if entailment.len() != group.hypotheses.len() {
                return Err(KamaeError::InferenceError(
                    "model returned fewer rows than pairs".into(),
                ));
            }
            scores.push(softmax(&entailment));
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::tests::tiny_classifier;
    use crate::model::encoding::tests::tiny_tokenizer;
    use crate::zero_shot::Hypotheses;

    fn scorer() -> NliScorer {
        let (_varmap, model) = tiny_classifier(3);
        NliScorer::from_parts(model, tiny_tokenizer(), 0, Device::Cpu).unwrap()
    }

    #[test]
    fn softmax_is_normalized_and_ordered() {
        let p = softmax(&[1.0, 3.0, 2.0]);
        assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(p[1] > p[2] && p[2] > p[0]);
    }

    #[test]
    fn one_distribution_per_group() {
        let scorer = scorer();
        let a = Hypotheses::for_entity("Luigi Mangione");
        let b = Hypotheses::for_entity("United Healthcare");
        let groups = vec![
            HypothesisGroup {
                premise: "<entity>Luigi Mangione</entity> is a hero",
                hypotheses: a.candidates().iter().map(|(_, h)| *h).collect(),
            },
            HypothesisGroup {
                premise: "<entity>United Healthcare</entity> is awful",
                hypotheses: b.candidates().iter().map(|(_, h)| *h).collect(),
            },
        ];

        let scores = scorer.score_batch(&groups).unwrap();
        assert_eq!(scores.len(), 2);
        for s in &scores {
            assert_eq!(s.len(), 3);
            assert!((s.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }

        // Groups are independent of their batch neighbours.
        let alone = scorer.score_batch(&groups[1..]).unwrap();
        for (x, y) in alone[0].iter().zip(&scores[1]) {
            assert!((x - y).abs() < 1e-4);
        }
    }

    #[test]
    fn entailment_id_must_be_in_range() {
        let (_varmap, model) = tiny_classifier(3);
        assert!(NliScorer::from_parts(model, tiny_tokenizer(), 3, Device::Cpu).is_err());
    }
}
