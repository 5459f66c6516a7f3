use thiserror::Error;

/// Failures raised while building the search models.
///
/// None of these are surfaced to a search request: the engine converts them
/// into a degraded-but-working state at startup.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("corpus is empty")]
    EmptyCorpus,
    #[error("not enough training data for embeddings: {0}")]
    InsufficientTrainingData(String),
    #[error("invalid embedding table at line {line}: {reason}")]
    InvalidEmbeddings { line: usize, reason: String },
    #[error("unrecognized corpus layout: {0}")]
    CorpusFormat(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
