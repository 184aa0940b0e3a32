//! Model directory layout and configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use candle_transformers::models::distilbert::Config as EncoderConfig;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

use crate::error::{KamaeError, Result};
use crate::types::Stance;

pub const WEIGHTS_FILE: &str = "model.safetensors";
pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// A directory holding `model.safetensors`, `config.json` and `tokenizer.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDir {
    root: PathBuf,
}

impl ModelDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn weights(&self) -> PathBuf {
        self.root.join(WEIGHTS_FILE)
    }

    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn tokenizer(&self) -> PathBuf {
        self.root.join(TOKENIZER_FILE)
    }

    /// Fails with the first missing file.
    pub fn ensure_complete(&self) -> Result<()> {
        for path in [self.config(), self.tokenizer(), self.weights()] {
            if !path.is_file() {
                return Err(KamaeError::ModelLoadError(format!(
                    "{} not found",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Fields of `config.json` the encoder config keeps private.
#[derive(Debug, Deserialize)]
struct HeadFields {
    dim: usize,
    #[serde(default)]
    id2label: BTreeMap<String, String>,
    #[serde(default)]
    label2id: BTreeMap<String, usize>,
}

/// Parsed `config.json`: the DistilBERT encoder config plus the label maps.
///
/// The raw document is retained so unknown keys survive a rewrite.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub encoder: EncoderConfig,
    pub dim: usize,
    pub id2label: BTreeMap<usize, String>,
    pub label2id: BTreeMap<String, usize>,
    raw: serde_json::Value,
}

impl ModelConfig {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        let encoder: EncoderConfig = serde_json::from_value(raw.clone())?;
        let head: HeadFields = serde_json::from_value(raw.clone())?;

        let id2label = head
            .id2label
            .into_iter()
            .filter_map(|(id, label)| id.parse::<usize>().ok().map(|id| (id, label)))
            .collect();

        Ok(Self {
            encoder,
            dim: head.dim,
            id2label,
            label2id: head.label2id,
            raw,
        })
    }

    /// Reads and parses a `config.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| KamaeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json).map_err(|source| KamaeError::Json {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        })
    }

    /// Number of output classes declared by the label maps.
    pub fn num_labels(&self) -> usize {
        let from_ids = self.id2label.keys().max().map_or(0, |max| max + 1);
        let from_labels = self.label2id.values().max().map_or(0, |max| max + 1);
        from_ids.max(from_labels)
    }

    /// Class id of the `entailment` label, matched case-insensitively.
    pub fn entailment_id(&self) -> Result<usize> {
        self.label2id
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case("entailment"))
            .map(|(_, &id)| id)
            .or_else(|| {
                self.id2label
                    .iter()
                    .find(|(_, label)| label.eq_ignore_ascii_case("entailment"))
                    .map(|(&id, _)| id)
            })
            .ok_or_else(|| {
                let available: Vec<&str> = self.label2id.keys().map(String::as_str).collect();
                KamaeError::ModelLoadError(format!(
                    "no 'entailment' label in config, available: [{}]",
                    available.join(", ")
                ))
            })
    }

    /// Replaces the label maps with the stance codec.
    pub fn with_stance_labels(mut self) -> Self {
        self.id2label = Stance::all()
            .iter()
            .map(|s| (s.label(), s.as_str().to_string()))
            .collect();
        self.label2id = Stance::all()
            .iter()
            .map(|s| (s.as_str().to_string(), s.label()))
            .collect();

        if let serde_json::Value::Object(map) = &mut self.raw {
            let id2label: serde_json::Map<String, serde_json::Value> = self
                .id2label
                .iter()
                .map(|(id, label)| (id.to_string(), label.clone().into()))
                .collect();
            let label2id: serde_json::Map<String, serde_json::Value> = self
                .label2id
                .iter()
                .map(|(label, id)| (label.clone(), (*id).into()))
                .collect();
            map.insert("id2label".into(), id2label.into());
            map.insert("label2id".into(), label2id.into());
        }
        self
    }

    /// Checks that `id2label` matches the stance codec exactly.
    pub fn check_stance_labels(&self) -> Result<()> {
        if self.id2label.len() != Stance::NUM_LABELS {
            return Err(KamaeError::ModelLoadError(format!(
                "expected {} stance labels, config declares {}",
                Stance::NUM_LABELS,
                self.id2label.len()
            )));
        }
        for (&id, label) in &self.id2label {
            let stance = Stance::from_label(id).ok_or(KamaeError::UnknownLabel(id))?;
            if !label.eq_ignore_ascii_case(stance.as_str()) {
                return Err(KamaeError::ModelLoadError(format!(
                    "label {id} is {label:?}, expected {stance:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.raw)
    }

    /// Writes the (possibly relabelled) config document.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty().map_err(|source| KamaeError::Json {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| KamaeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loads a tokenizer with truncation and padding disabled.
///
/// Batches are padded by [`encode_batch`](crate::model::encode_batch), and
/// untruncated counts keep the length filter honest.
pub fn load_tokenizer(path: impl AsRef<Path>) -> Result<Tokenizer> {
    let path = path.as_ref();
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| KamaeError::Tokenizer(format!("{}: {e}", path.display())))?;
    tokenizer
        .with_truncation(None)
        .map_err(|e| KamaeError::Tokenizer(e.to_string()))?;
    tokenizer.with_padding(None);
    Ok(tokenizer)
}

/// Enables truncation at `max_length` tokens.
pub fn truncate_to(
    tokenizer: &mut Tokenizer,
    max_length: usize,
    strategy: TruncationStrategy,
) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            strategy,
            ..Default::default()
        }))
        .map_err(|e| KamaeError::Tokenizer(e.to_string()))?;
    Ok(())
}
