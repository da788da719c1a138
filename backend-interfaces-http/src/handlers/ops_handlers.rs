use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use tracing::error;

use backend_application::deadline::{with_deadline, Deadline};
use backend_application::{AppError, AppState};

use crate::middleware::authorize;

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let ping = with_deadline(&state.config, Deadline::Short, async {
        state.log_repo.ping().await.map_err(AppError::from)
    })
    .await;
    match ping {
        Ok(()) => StatusCode::OK,
        Err(AppError::Timeout) => {
            error!(
                timeout_secs = state.config.short_timeout_seconds,
                "ready check timed out"
            );
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(err) => {
            error!("ready check failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus(&state.hub);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
