//! Fine-tuning loop for the stance classifier.

use std::path::Path;

use anyhow::{Context, bail};
use candle_core::{D, DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use kamae_core::dataset::{DropStats, WideTable, shuffle};
use kamae_core::model::{
    ModelConfig, ModelDir, SequenceClassifier, encode_batch, load_tokenizer,
};
use kamae_core::{AnnotatedRecord, EntityCatalog, Stance, TextAnnotator};
use serde::Serialize;
use tokenizers::Tokenizer;

use crate::config::TrainingConfig;
use crate::data::{LabelDistribution, PreparedDataset, prepare_dataset};
use crate::metrics::EvalReport;

/// File written next to the weights with the run's metrics.
pub const REPORT_FILE: &str = "training_report.json";

const ENCODER_PREFIX: &str = "distilbert.";

/// Metrics for one epoch.
#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub train_loss: f64,
    pub validation: EvalReport,
}

/// Everything a run produced besides the weights.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub config: TrainingConfig,
    pub drops: DropStats,
    pub train_distribution: LabelDistribution,
    pub validation_distribution: LabelDistribution,
    pub newly_initialized: Vec<String>,
    pub epochs: Vec<EpochReport>,
}

impl TrainingReport {
    pub fn final_validation(&self) -> Option<&EvalReport> {
        self.epochs.last().map(|e| &e.validation)
    }
}

/// Copies every tensor the checkpoint has into `varmap`.
///
/// Encoder weights saved without the `distilbert.` prefix are accepted.
/// Returns the variables left at their initial values, sorted.
fn load_pretrained(varmap: &VarMap, weights: &Path, device: &Device) -> anyhow::Result<Vec<String>> {
    use candle_core::safetensors::Load;

    let bytes = std::fs::read(weights)
        .with_context(|| format!("failed to read {}", weights.display()))?;
    let checkpoint = safetensors::SafeTensors::deserialize(&bytes)
        .with_context(|| format!("failed to parse {}", weights.display()))?;

    let vars = varmap
        .data()
        .lock()
        .map_err(|_| anyhow::anyhow!("variable map lock poisoned"))?;

    let mut missing = Vec::new();
    let mut encoder_loaded = 0usize;
    for (name, var) in vars.iter() {
        let view = checkpoint.tensor(name).or_else(|_| {
            name.strip_prefix(ENCODER_PREFIX)
                .ok_or(safetensors::SafeTensorError::TensorNotFound(name.clone()))
                .and_then(|bare| checkpoint.tensor(bare))
        });
        let Ok(view) = view else {
            missing.push(name.clone());
            continue;
        };

        let tensor = view.load(device)?.to_dtype(DType::F32)?;
        if tensor.shape() != var.shape() {
            tracing::warn!(
                name = %name,
                expected = ?var.shape(),
                found = ?tensor.shape(),
                "shape mismatch, keeping fresh weights"
            );
            missing.push(name.clone());
            continue;
        }
        var.set(&tensor)?;
        if name.starts_with(ENCODER_PREFIX) {
            encoder_loaded += 1;
        }
    }

    if encoder_loaded == 0 {
        bail!("{} contains no encoder weights", weights.display());
    }

    missing.sort();
    Ok(missing)
}

/// Fine-tunes a DistilBERT checkpoint into a three-way stance classifier.
pub struct Trainer {
    model: SequenceClassifier,
    varmap: VarMap,
    tokenizer: Tokenizer,
    model_config: ModelConfig,
    config: TrainingConfig,
    newly_initialized: Vec<String>,
    device: Device,
}

impl Trainer {
    /// Loads the base model directory; the classification head may be absent.
    pub fn from_pretrained(base_dir: impl AsRef<Path>, config: TrainingConfig) -> anyhow::Result<Self> {
        let dir = ModelDir::new(base_dir.as_ref());
        dir.ensure_complete()?;

        let model_config = ModelConfig::from_file(dir.config())?;
        let tokenizer = load_tokenizer(dir.tokenizer())?;

        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = SequenceClassifier::load(vb, &model_config, Stance::NUM_LABELS)?;

        let newly_initialized = load_pretrained(&varmap, &dir.weights(), &device)?;
        if !newly_initialized.is_empty() {
            tracing::warn!(
                count = newly_initialized.len(),
                names = ?newly_initialized,
                "weights not in base checkpoint were newly initialized"
            );
        }
        tracing::info!(base = %dir.root().display(), "loaded base model");

        Ok(Self {
            model,
            varmap,
            tokenizer,
            model_config,
            config,
            newly_initialized,
            device,
        })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn newly_initialized(&self) -> &[String] {
        &self.newly_initialized
    }

    fn batch_tensors(&self, records: &[&AnnotatedRecord]) -> anyhow::Result<(Tensor, Tensor, Tensor)> {
        let batch = encode_batch(
            &self.tokenizer,
            records.iter().map(|r| r.text_with_entity.as_str()),
            &self.device,
        )?;
        let labels: Vec<u32> = records.iter().map(|r| r.label as u32).collect();
        let targets = Tensor::new(labels.as_slice(), &self.device)?;
        Ok((batch.input_ids, batch.pad_mask, targets))
    }

    /// Runs every epoch, evaluating on the validation split after each.
    pub fn train(&mut self, data: &PreparedDataset) -> anyhow::Result<TrainingReport> {
        if data.train.is_empty() {
            bail!("training split is empty");
        }

        let params = ParamsAdamW {
            lr: self.config.learning_rate,
            weight_decay: self.config.weight_decay,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(self.varmap.all_vars(), params)?;
        let mut rng = oorandom::Rand64::new(u128::from(self.config.seed));
        let batch_size = self.config.batch_size.max(1);
        let total_steps = data.train.len().div_ceil(batch_size);

        tracing::info!(
            train = data.train.len(),
            validation = data.validation.len(),
            epochs = self.config.epochs,
            batch_size,
            "starting fine-tuning"
        );

        let mut epochs = Vec::with_capacity(self.config.epochs);
        for epoch in 1..=self.config.epochs {
            let mut order: Vec<usize> = (0..data.train.len()).collect();
            shuffle(&mut order, &mut rng);

            let mut loss_sum = 0.0f64;
            for (step, chunk) in order.chunks(batch_size).enumerate() {
                let records: Vec<&AnnotatedRecord> = chunk.iter().map(|&i| &data.train[i]).collect();
                let (input_ids, pad_mask, targets) = self.batch_tensors(&records)?;

                let logits = self.model.forward_t(&input_ids, &pad_mask, true)?;
                let loss = candle_nn::loss::cross_entropy(&logits, &targets)?;
                optimizer.backward_step(&loss)?;

                let loss = f64::from(loss.to_scalar::<f32>()?);
                loss_sum += loss * chunk.len() as f64;
                tracing::debug!(epoch, step = step + 1, total_steps, loss, "train step");
            }
            let train_loss = loss_sum / data.train.len() as f64;

            let validation = self.evaluate(&data.validation)?;
            tracing::info!(
                epoch,
                train_loss,
                validation_loss = validation.loss,
                accuracy = validation.accuracy,
                macro_f1 = validation.macro_f1,
                "epoch complete"
            );
            epochs.push(EpochReport {
                epoch,
                train_loss,
                validation,
            });
        }

        Ok(TrainingReport {
            config: self.config.clone(),
            drops: data.drops,
            train_distribution: data.train_distribution(),
            validation_distribution: data.validation_distribution(),
            newly_initialized: self.newly_initialized.clone(),
            epochs,
        })
    }

    /// Loss and classification metrics without updating weights.
    pub fn evaluate(&self, records: &[AnnotatedRecord]) -> anyhow::Result<EvalReport> {
        let mut loss_sum = 0.0f64;
        let mut predictions = Vec::with_capacity(records.len());
        let mut targets = Vec::with_capacity(records.len());

        let refs: Vec<&AnnotatedRecord> = records.iter().collect();
        for chunk in refs.chunks(self.config.batch_size.max(1)) {
            let (input_ids, pad_mask, labels) = self.batch_tensors(chunk)?;
            let logits = self.model.forward(&input_ids, &pad_mask)?;
            let loss = candle_nn::loss::cross_entropy(&logits, &labels)?.to_scalar::<f32>()?;
            loss_sum += f64::from(loss) * chunk.len() as f64;

            let predicted = logits.argmax(D::Minus1)?.to_vec1::<u32>()?;
            predictions.extend(predicted.into_iter().map(|p| p as usize));
            targets.extend(chunk.iter().map(|r| r.label));
        }

        let loss = if records.is_empty() {
            0.0
        } else {
            loss_sum / records.len() as f64
        };
        Ok(EvalReport::from_predictions(loss, &predictions, &targets))
    }

    /// Writes weights, relabelled config, tokenizer and the run report.
    pub fn save(&self, out_dir: impl AsRef<Path>, report: &TrainingReport) -> anyhow::Result<()> {
        let dir = ModelDir::new(out_dir.as_ref());
        std::fs::create_dir_all(dir.root())
            .with_context(|| format!("failed to create {}", dir.root().display()))?;

        self.varmap.save(dir.weights())?;
        self.model_config
            .clone()
            .with_stance_labels()
            .write(dir.config())?;
        self.tokenizer
            .save(dir.tokenizer(), false)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("failed to write {}", dir.tokenizer().display()))?;

        let report_path = dir.root().join(REPORT_FILE);
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("failed to write {}", report_path.display()))?;

        tracing::info!(dir = %dir.root().display(), "saved fine-tuned model");
        Ok(())
    }
}

/// Reads the annotated CSV, fine-tunes the base model and saves the result.
pub fn run_training(
    input: &Path,
    base_model: &Path,
    output_dir: &Path,
    catalog: &EntityCatalog,
    annotator: &TextAnnotator,
    config: TrainingConfig,
) -> anyhow::Result<TrainingReport> {
    let table = WideTable::from_csv_path(input)?;
    let mut trainer = Trainer::from_pretrained(base_model, config)?;
    let data = prepare_dataset(&table, catalog, annotator, trainer.tokenizer(), trainer.config())?;

    let report = trainer.train(&data)?;
    trainer.save(output_dir, &report)?;
    Ok(report)
}
