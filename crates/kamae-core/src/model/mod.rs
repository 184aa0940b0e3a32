//! DistilBERT sequence classification on candle.

pub mod checkpoint;
pub mod classifier;
pub mod encoding;
pub mod predictor;

pub use checkpoint::{
    CONFIG_FILE, ModelConfig, ModelDir, TOKENIZER_FILE, WEIGHTS_FILE, load_tokenizer, truncate_to,
};
pub use classifier::{CLASSIFIER_DROPOUT, SequenceClassifier, probabilities};
pub use encoding::{EncodedBatch, encode_batch, pad_token_id};
pub use predictor::{StanceClassifier, StancePrediction};
