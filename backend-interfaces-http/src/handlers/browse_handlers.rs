use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;

use backend_application::dtos::{BrowseOverview, CursorPage, FacetPage, GamePicker, RecentFeed};
use backend_application::queries::browse_queries;
use backend_application::AppState;
use backend_domain::{
    BrowseEntriesQuery, BrowseOverviewQuery, ExportQuery, FacetPageQuery, GamePickerQuery,
    RecentQuery,
};

use crate::error::HttpError;
use crate::handlers::log_handlers::json_attachment;
use crate::middleware::authorize_admin;

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), HttpError> {
    if authorize_admin(&state.config, headers, None) {
        Ok(())
    } else {
        Err(HttpError::Unauthorized)
    }
}

pub async fn browse_overview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BrowseOverviewQuery>,
) -> Result<Json<BrowseOverview>, HttpError> {
    require_admin(&state, &headers)?;
    Ok(Json(browse_queries::browse_overview(&state, query).await?))
}

pub async fn browse_games(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GamePickerQuery>,
) -> Result<Json<GamePicker>, HttpError> {
    require_admin(&state, &headers)?;
    Ok(Json(browse_queries::game_picker(&state, query).await?))
}

pub async fn browse_players(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FacetPageQuery>,
) -> Result<Json<FacetPage>, HttpError> {
    require_admin(&state, &headers)?;
    Ok(Json(browse_queries::player_facets(&state, query).await?))
}

pub async fn browse_event_types(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FacetPageQuery>,
) -> Result<Json<FacetPage>, HttpError> {
    require_admin(&state, &headers)?;
    Ok(Json(browse_queries::event_type_facets(&state, query).await?))
}

pub async fn browse_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BrowseEntriesQuery>,
) -> Result<Json<CursorPage>, HttpError> {
    require_admin(&state, &headers)?;
    Ok(Json(browse_queries::browse_entries(&state, query).await?))
}

pub async fn browse_recent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentFeed>, HttpError> {
    require_admin(&state, &headers)?;
    Ok(Json(browse_queries::recent_logs(&state, query).await?))
}

pub async fn browse_download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Result<Response, HttpError> {
    require_admin(&state, &headers)?;
    let export = browse_queries::export_logs(&state, query).await?;
    json_attachment(&export.filename, &export.documents)
}
