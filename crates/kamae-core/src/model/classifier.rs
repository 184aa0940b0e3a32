use candle_core::{D, IndexOp, Module, ModuleT, Result, Tensor};
use candle_nn::{Dropout, Linear, VarBuilder};
use candle_transformers::models::distilbert::DistilBertModel;

use crate::model::checkpoint::ModelConfig;

/// Dropout before the output layer during fine-tuning.
pub const CLASSIFIER_DROPOUT: f32 = 0.2;

/// A DistilBERT sequence classifier (encoder + pre-classifier + classifier).
///
/// Weight names follow the Hugging Face layout: `distilbert.*`,
/// `pre_classifier.*`, `classifier.*`.
pub struct SequenceClassifier {
    pub distilbert: DistilBertModel,
    pub pre_classifier: Linear,
    pub classifier: Linear,
    dropout: Dropout,
    num_labels: usize,
}

impl SequenceClassifier {
    /// Load the model from a var builder.
    pub fn load(vb: VarBuilder, config: &ModelConfig, num_labels: usize) -> Result<Self> {
        let distilbert = DistilBertModel::load(vb.pp("distilbert"), &config.encoder)?;
        let pre_classifier = candle_nn::linear(config.dim, config.dim, vb.pp("pre_classifier"))?;
        let classifier = candle_nn::linear(config.dim, num_labels, vb.pp("classifier"))?;

        Ok(Self {
            distilbert,
            pre_classifier,
            classifier,
            dropout: Dropout::new(CLASSIFIER_DROPOUT),
            num_labels,
        })
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Logits `[batch, num_labels]` read from the first token.
    ///
    /// `input_ids`: `[batch, seq]`, `pad_mask`: `[batch, 1, 1, seq]` with 1 at padding.
    pub fn forward_t(&self, input_ids: &Tensor, pad_mask: &Tensor, train: bool) -> Result<Tensor> {
        let hidden = self.distilbert.forward(input_ids, pad_mask)?;
        let pooled = hidden.i((.., 0))?;
        let pooled = self.pre_classifier.forward(&pooled)?.relu()?;
        let pooled = self.dropout.forward_t(&pooled, train)?;
        self.classifier.forward(&pooled)
    }

    /// Inference forward pass.
    pub fn forward(&self, input_ids: &Tensor, pad_mask: &Tensor) -> Result<Tensor> {
        self.forward_t(input_ids, pad_mask, false)
    }
}

/// Row-wise softmax of `[batch, classes]` logits.
pub fn probabilities(logits: &Tensor) -> Result<Vec<Vec<f32>>> {
    candle_nn::ops::softmax(logits, D::Minus1)?.to_vec2::<f32>()
}
