//! Error types for heartmula-worker.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Job input rejected before any model work.
    #[error("validation: {0}")]
    Validation(String),

    /// Pipeline construction failure during cold start.
    #[error("model load: {0}")]
    ModelLoad(String),

    /// Failure inside the generation call.
    #[error("generation: {0}")]
    Generation(String),

    /// Audio output error (WAV encoding).
    #[error("audio: {0}")]
    Audio(String),

    /// I/O error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// HuggingFace Hub error.
    #[error("hf-hub: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),
}

impl From<hound::Error> for Error {
    fn from(error: hound::Error) -> Self {
        Error::Audio(error.to_string())
    }
}
