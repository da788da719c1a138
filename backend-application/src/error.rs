use backend_domain::IngestError;
use thiserror::Error;

pub const INSERT_FAILED: &str = "INSERT_FAILED";
pub const QUERY_FAILED: &str = "QUERY_FAILED";
pub const DELETE_FAILED: &str = "DELETE_FAILED";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Rejected(#[from] IngestError),
    #[error("missing required parameter: {0}")]
    MissingParam(&'static str),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid log id '{0}'")]
    InvalidId(String),
    #[error("{context}")]
    Storage {
        code: &'static str,
        context: String,
        cause: anyhow::Error,
    },
    #[error("operation timed out")]
    Timeout,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn storage(code: &'static str, context: impl Into<String>, cause: anyhow::Error) -> Self {
        AppError::Storage {
            code,
            context: context.into(),
            cause,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Rejected(err) => err.code(),
            AppError::MissingParam(_) => "MISSING_PARAM",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InvalidId(_) => "INVALID_ID",
            AppError::Storage { code, .. } => code,
            AppError::Timeout => "TIMEOUT",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}
