use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use backend_application::AppError;
use backend_domain::IngestError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest { code: &'static str, message: String },
    PayloadTooLarge(String),
    NotFound,
    Internal { code: &'static str, message: String },
    Timeout,
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        let code = value.code();
        let message = value.to_string();
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::Rejected(IngestError::BodyTooLarge) => HttpError::PayloadTooLarge(message),
            AppError::Rejected(_)
            | AppError::MissingParam(_)
            | AppError::BadRequest(_)
            | AppError::InvalidId(_) => HttpError::BadRequest { code, message },
            AppError::Storage { .. } => HttpError::Internal { code, message },
            AppError::Timeout => HttpError::Timeout,
            // Details stay in the server log.
            AppError::Internal(_) => HttpError::Internal {
                code,
                message: "internal error".to_string(),
            },
        }
    }
}

impl From<IngestError> for HttpError {
    fn from(value: IngestError) -> Self {
        AppError::from(value).into()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            HttpError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".to_string(),
            ),
            HttpError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            HttpError::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "BODY_TOO_LARGE", message)
            }
            HttpError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", "not found".to_string()),
            HttpError::Internal { code, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, code, message)
            }
            HttpError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                "operation timed out".to_string(),
            ),
        };
        (status, Json(ErrorBody { error: message, code })).into_response()
    }
}
