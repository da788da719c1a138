use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, MethodRouter};
use axum::Router;

use backend_application::AppState;

use crate::error::HttpError;
use crate::handlers::{
    admin_handlers, browse_handlers, ingest_handlers, log_handlers, ops_handlers, stream_handlers,
};

/// The ingestion body cap is tighter than the global one.
fn submit_route(limit: usize) -> MethodRouter<AppState> {
    post(ingest_handlers::submit_logs).layer(DefaultBodyLimit::max(limit))
}

pub fn build_router(state: AppState) -> Router {
    let ingest_limit = usize::try_from(state.config.ingest_max_body_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route("/api/log/submit", submit_route(ingest_limit))
        .route("/api/log/list", get(log_handlers::list_logs))
        .route("/logs", submit_route(ingest_limit).get(log_handlers::list_logs))
        .route("/logs/view", get(log_handlers::view_logs))
        .route("/logs/download", get(log_handlers::download_logs))
        .route(
            "/api/log/browse/overview",
            get(browse_handlers::browse_overview),
        )
        .route("/api/log/browse/games", get(browse_handlers::browse_games))
        .route(
            "/api/log/browse/players",
            get(browse_handlers::browse_players),
        )
        .route(
            "/api/log/browse/event-types",
            get(browse_handlers::browse_event_types),
        )
        .route(
            "/api/log/browse/entries",
            get(browse_handlers::browse_entries),
        )
        .route("/api/log/browse/recent", get(browse_handlers::browse_recent))
        .route(
            "/api/log/browse/recent/stream",
            get(stream_handlers::stream_logs),
        )
        .route(
            "/api/log/browse/download",
            get(browse_handlers::browse_download),
        )
        .route(
            "/api/log/admin/games/:game/entries",
            delete(admin_handlers::delete_game_entries),
        )
        .route(
            "/api/log/admin/games/:game/entries/:id",
            delete(admin_handlers::delete_entry),
        )
        .route(
            "/api/log/admin/games/:game/players/:player_id/entries",
            delete(admin_handlers::delete_player_entries),
        )
        .route("/ops/health/live", get(ops_handlers::health_live))
        .route("/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .fallback(|| async { HttpError::NotFound })
        .with_state(state)
}
