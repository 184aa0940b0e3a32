use clap::Args;
use kamae_core::dataset::{DEFAULT_MAX_LENGTH, DEFAULT_SEED, DEFAULT_TEST_SIZE};
use serde::{Deserialize, Serialize};

/// Hyperparameters for a fine-tuning run.
#[derive(Debug, Clone, PartialEq, Args, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Passes over the training split
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Examples per optimizer step
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// AdamW learning rate
    #[arg(long, default_value_t = 2e-5)]
    pub learning_rate: f64,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Token budget for marked texts; longer examples are dropped
    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// Fraction of each class held out for validation
    #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
    pub test_size: f64,

    /// Seed for the split and epoch shuffles
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 3,
            batch_size: 16,
            learning_rate: 2e-5,
            weight_decay: 0.01,
            max_length: DEFAULT_MAX_LENGTH,
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the batch size (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: TrainingConfig,
    }

    #[test]
    fn cli_defaults_match_default() {
        let cli = Cli::parse_from(["train"]);
        assert_eq!(cli.config, TrainingConfig::default());
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::parse_from(["train", "--epochs", "5", "--learning-rate", "3e-5"]);
        assert_eq!(cli.config.epochs, 5);
        assert_eq!(cli.config.learning_rate, 3e-5);
        assert_eq!(cli.config.batch_size, 16);
    }

    #[test]
    fn builder_clamps_batch_size() {
        let config = TrainingConfig::new().with_batch_size(0).with_seed(7);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.seed, 7);
    }
}
