use thiserror::Error;

/// Client input errors raised while normalising a submission. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("invalid JSON payload")]
    InvalidJson,
    #[error("request body too large")]
    BodyTooLarge,
    #[error("missing or invalid 'game' field")]
    MissingGame,
    #[error("invalid 'game' value '{0}'")]
    InvalidGame(String),
    #[error("invalid '{field}' value")]
    InvalidField { field: &'static str },
    #[error("entries array is empty")]
    EmptyBatch,
    #[error("batch size {size} exceeds maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },
    #[error("invalid entry at index {index}")]
    InvalidEntry { index: usize },
}

impl IngestError {
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::InvalidJson => "INVALID_JSON",
            IngestError::BodyTooLarge => "BODY_TOO_LARGE",
            IngestError::MissingGame => "MISSING_FIELD",
            IngestError::InvalidGame(_) => "INVALID_GAME",
            IngestError::InvalidField { .. } => "INVALID_FIELD",
            IngestError::EmptyBatch => "EMPTY_ENTRIES",
            IngestError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            IngestError::InvalidEntry { .. } => "INVALID_ENTRY",
        }
    }
}
