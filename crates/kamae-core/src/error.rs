use std::path::PathBuf;

use thiserror::Error;

use crate::types::Stance;

/// Errors that can occur during Kamae core operations.
#[derive(Debug, Error)]
pub enum KamaeError {
    /// The input string is empty or contains only whitespace.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// An entity name to mark or resolve is empty.
    #[error("entity name is empty or whitespace-only")]
    EmptyEntity,

    /// A stance string outside `favor|neutral|against`.
    #[error("unrecognized stance value: {0:?}")]
    UnknownStance(String),

    /// A label id outside the stance codec's domain.
    #[error("unknown label id: {0}")]
    UnknownLabel(usize),

    /// A regex pattern failed to compile.
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// The entity catalog is inconsistent.
    #[error("invalid entity catalog: {0}")]
    InvalidCatalog(String),

    /// A declared stance column is absent from the input table.
    #[error("missing column: {0:?}")]
    MissingColumn(String),

    /// An input or output file could not be accessed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A delimited file could not be read or written.
    #[error("failed to process CSV {}: {source}", path.display())]
    Csv {
        /// The file that failed.
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A JSON document or JSON-lines record could not be parsed.
    #[error("failed to parse JSON in {} (line {line}): {source}", path.display())]
    Json {
        /// The file that failed.
        path: PathBuf,
        /// 1-based line number of the failure.
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// No records were left to operate on.
    #[error("dataset is empty")]
    EmptyDataset,

    /// The validation fraction is outside `(0, 1)`.
    #[error("split fraction must lie strictly between 0 and 1, got {0}")]
    InvalidSplitFraction(f64),

    /// A stance class has too few members to be stratified.
    #[error("cannot stratify: label {stance} has {count} member(s), at least 2 required")]
    UnderpopulatedClass {
        /// The offending class.
        stance: Stance,
        /// How many records carry it.
        count: usize,
    },

    /// The tokenizer failed to load or encode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// The model directory or its weights could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoadError(String),

    /// The model inference failed.
    #[error("inference error: {0}")]
    InferenceError(String),

    /// Candle ML framework error.
    #[error("ML inference error: {0}")]
    CandleError(#[from] candle_core::Error),
}

/// Result type alias for Kamae operations.
pub type Result<T> = std::result::Result<T, KamaeError>;
