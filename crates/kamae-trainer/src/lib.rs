//! # Kamae Trainer
//!
//! Fine-tunes a DistilBERT checkpoint into a three-way stance classifier
//! over entity-marked text: data preparation, the AdamW training loop and
//! validation metrics.

pub mod config;
pub mod data;
pub mod metrics;
pub mod trainer;

pub use config::TrainingConfig;
pub use data::{LabelDistribution, PreparedDataset, prepare_dataset};
pub use metrics::{ClassMetrics, EvalReport};
pub use trainer::{EpochReport, REPORT_FILE, Trainer, TrainingReport, run_training};
