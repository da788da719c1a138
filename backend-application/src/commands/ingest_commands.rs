use std::time::Duration;

use backend_domain::{EntryValidator, SubmissionKind};
use backend_domain::utils::now_millis;
use chrono::SecondsFormat;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::dtos::IngestResponse;
use crate::error::INSERT_FAILED;
use crate::{AppError, AppState};

/// Accepts a raw request body (already size-checked and decompressed).
pub async fn ingest_body(state: &AppState, body: &[u8]) -> Result<IngestResponse, AppError> {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(err) => {
            state.metrics.record_rejection();
            debug!(error = %err, "rejected unparseable log submission");
            return Err(backend_domain::IngestError::InvalidJson.into());
        }
    };
    ingest_payload(state, payload).await
}

pub async fn ingest_payload(state: &AppState, payload: Value) -> Result<IngestResponse, AppError> {
    let validator = EntryValidator::new(state.config.max_batch_size);
    let submission = match validator.validate(payload) {
        Ok(submission) => submission,
        Err(err) => {
            state.metrics.record_rejection();
            debug!(code = err.code(), "rejected log submission: {}", err);
            return Err(err.into());
        }
    };

    let game = submission.game.to_string();
    let count = submission.entries.len();
    let stored = match state.log_repo.insert_entries(submission.entries).await {
        Ok(stored) => stored,
        Err(err) => {
            state.metrics.record_ingest_error();
            error!(game = %game, count, "failed to insert log entries: {:#}", err);
            let context = match submission.kind {
                SubmissionKind::Single => "failed to save log entry",
                SubmissionKind::Batch => "failed to save log entries",
            };
            return Err(AppError::storage(INSERT_FAILED, context, err));
        }
    };

    for entry in &stored {
        state.broadcaster.broadcast(entry.to_event());
    }
    spawn_index_maintenance(state);
    state.metrics.record_ingest(stored.len());
    debug!(game = %game, count = stored.len(), "log entries saved");

    let received_at = stored
        .first()
        .map(|entry| entry.server_timestamp)
        .unwrap_or_else(now_millis);
    Ok(IngestResponse {
        status: "success",
        received_at: received_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        accepted: stored.len(),
    })
}

/// Detached; the outcome only reaches the log.
pub fn spawn_index_maintenance(state: &AppState) {
    let repo = state.log_repo.clone();
    let budget = Duration::from_secs(state.config.index_timeout_seconds.max(1));
    tokio::spawn(async move {
        match tokio::time::timeout(budget, repo.ensure_indexes()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("failed to ensure log indexes: {:#}", err),
            Err(_) => warn!(timeout_secs = budget.as_secs(), "log index maintenance timed out"),
        }
    });
}
