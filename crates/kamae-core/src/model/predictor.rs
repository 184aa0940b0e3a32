//! # Stance Classifier
//!
//! Inference with a fine-tuned stance model directory.

use std::path::Path;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use serde::Serialize;
use tokenizers::{Tokenizer, TruncationStrategy};

use crate::dataset::DEFAULT_MAX_LENGTH;
use crate::entity::TextAnnotator;
use crate::error::{KamaeError, Result};
use crate::model::checkpoint::{ModelConfig, ModelDir, load_tokenizer, truncate_to};
use crate::model::classifier::{SequenceClassifier, probabilities};
use crate::model::encoding::encode_batch;
use crate::types::Stance;

/// Argmax stance plus the full distribution in label order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StancePrediction {
    pub stance: Stance,
    pub probabilities: [f32; Stance::NUM_LABELS],
}

impl StancePrediction {
    fn from_row(row: &[f32]) -> Result<Self> {
        let probabilities: [f32; Stance::NUM_LABELS] = row.try_into().map_err(|_| {
            KamaeError::InferenceError(format!(
                "expected {} class scores, got {}",
                Stance::NUM_LABELS,
                row.len()
            ))
        })?;
        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map_or(0, |(i, _)| i);
        let stance = Stance::from_label(best).ok_or(KamaeError::UnknownLabel(best))?;
        Ok(Self {
            stance,
            probabilities,
        })
    }

    pub fn probability(&self, stance: Stance) -> f32 {
        self.probabilities[stance.label()]
    }
}

/// A fine-tuned stance classifier over marked text.
pub struct StanceClassifier {
    model: SequenceClassifier,
    tokenizer: Tokenizer,
    device: Device,
}

impl StanceClassifier {
    /// Loads a fine-tuned model directory.
    ///
    /// The config's `id2label` must match the stance codec.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = ModelDir::new(dir.as_ref());
        dir.ensure_complete()?;

        let config = ModelConfig::from_file(dir.config())?;
        config.check_stance_labels()?;

        let mut tokenizer = load_tokenizer(dir.tokenizer())?;
        truncate_to(&mut tokenizer, DEFAULT_MAX_LENGTH, TruncationStrategy::LongestFirst)?;

        let device = Device::Cpu;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[dir.weights()], DType::F32, &device) }
            .map_err(|e| KamaeError::ModelLoadError(e.to_string()))?;
        let model = SequenceClassifier::load(vb, &config, Stance::NUM_LABELS)
            .map_err(|e| KamaeError::ModelLoadError(e.to_string()))?;

        tracing::info!(dir = %dir.root().display(), "loaded stance classifier");
        Ok(Self::from_parts(model, tokenizer, device))
    }

    pub fn from_parts(model: SequenceClassifier, tokenizer: Tokenizer, device: Device) -> Self {
        Self {
            model,
            tokenizer,
            device,
        }
    }

    /// Classifies texts that already carry entity markers.
    pub fn predict_marked(&self, texts: &[&str]) -> Result<Vec<StancePrediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch = encode_batch(&self.tokenizer, texts.iter().copied(), &self.device)?;
        let logits = self.model.forward(&batch.input_ids, &batch.pad_mask)?;
        probabilities(&logits)?
            .iter()
            .map(|row| StancePrediction::from_row(row))
            .collect()
    }

    /// Marks `entity` in `text` and classifies the result.
    pub fn predict(
        &self,
        text: &str,
        entity: &str,
        annotator: &TextAnnotator,
    ) -> Result<StancePrediction> {
        if text.trim().is_empty() {
            return Err(KamaeError::EmptyInput);
        }
        let marked = annotator.annotate(text, entity)?;
        tracing::debug!(%marked, "classifying marked text");
        self.predict_marked(&[marked.as_str()])?
            .pop()
            .ok_or_else(|| KamaeError::InferenceError("no prediction returned".into()))
    }
}
