use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::{debug, warn};

use backend_application::commands::ingest_commands;
use backend_application::dtos::IngestResponse;
use backend_application::AppState;
use backend_domain::IngestError;

use crate::error::HttpError;
use crate::middleware::{authorize, maybe_gunzip};

/// Single entry or `{game, entries: [...]}` batch.
pub async fn submit_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let body = body.map_err(|rejection| {
        state.metrics.record_rejection();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            debug!("rejected oversized log submission");
            IngestError::BodyTooLarge
        } else {
            warn!("failed to read log submission body: {}", rejection.body_text());
            IngestError::InvalidJson
        }
    })?;
    let body = maybe_gunzip(&headers, &body, state.config.ingest_max_body_bytes).map_err(|err| {
        state.metrics.record_rejection();
        err
    })?;

    let response = ingest_commands::ingest_body(&state, &body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
