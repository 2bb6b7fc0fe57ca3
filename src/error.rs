//! Error handling for the resume recommender

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    /// The embedding backend is missing or failed. `EmbeddingProvider`
    /// recovers from this with the deterministic fallback.
    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Scoring failed for job {job_id}: {reason}")]
    Scoring { job_id: i64, reason: String },

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, RecommenderError>;

/// Backend libraries (model2vec) report through anyhow
impl From<anyhow::Error> for RecommenderError {
    fn from(err: anyhow::Error) -> Self {
        RecommenderError::EmbeddingUnavailable(err.to_string())
    }
}

impl RecommenderError {
    /// Build a per-job scoring error
    pub fn scoring(job_id: i64, reason: impl Into<String>) -> Self {
        RecommenderError::Scoring {
            job_id,
            reason: reason.into(),
        }
    }
}
