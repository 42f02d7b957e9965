//! Error kinds surfaced by the assessment core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictError>;

#[derive(Error, Debug)]
pub enum PredictError {
    /// Classifier invoked before it was trained or loaded. Fatal to the request.
    #[error("{0} model not loaded")]
    ModelNotLoaded(&'static str),

    /// Scan payload could not be decoded (or has an unsupported extension).
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// Missing or mistyped form field; rejected before any model call.
    #[error("invalid feature `{field}`: {reason}")]
    InvalidFeature { field: String, reason: String },

    #[error("fusion requires at least one classifier result")]
    EmptyFusion,

    #[error("inference error: {0}")]
    Inference(String),

    #[error("model artifact error: {0}")]
    Artifact(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl From<ort::OrtError> for PredictError {
    fn from(e: ort::OrtError) -> Self {
        PredictError::Inference(e.to_string())
    }
}

impl PredictError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PredictError::InvalidFeature {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
