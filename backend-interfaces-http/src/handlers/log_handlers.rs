use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use backend_application::dtos::LogListResponse;
use backend_application::queries::{
    list_logs as query_logs, public_download_filename, public_logs, PUBLIC_DOWNLOAD_LIMIT,
    PUBLIC_VIEW_LIMIT,
};
use backend_application::AppState;
use backend_domain::{LogEntry, LogListQuery, PublicLogQuery};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn list_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LogListQuery>,
) -> Result<Json<LogListResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(query_logs(&state, query).await?))
}

pub async fn view_logs(
    State(state): State<AppState>,
    Query(query): Query<PublicLogQuery>,
) -> Result<Html<String>, HttpError> {
    let logs = public_logs(&state, query, PUBLIC_VIEW_LIMIT).await?;
    Ok(Html(render_log_page(&logs.game, &logs.entries)))
}

pub async fn download_logs(
    State(state): State<AppState>,
    Query(query): Query<PublicLogQuery>,
) -> Result<Response, HttpError> {
    let logs = public_logs(&state, query, PUBLIC_DOWNLOAD_LIMIT).await?;
    let filename = public_download_filename(&logs.game, Utc::now());
    json_attachment(&filename, &logs.entries)
}

/// Pretty-printed JSON served as a file download.
pub(crate) fn json_attachment<T: Serialize>(filename: &str, payload: &T) -> Result<Response, HttpError> {
    let body = serde_json::to_vec_pretty(payload).map_err(|err| {
        error!(filename, "failed to serialize download: {}", err);
        HttpError::Internal {
            code: "INTERNAL",
            message: "failed to encode logs".to_string(),
        }
    })?;
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, body).into_response())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_log_page(game: &str, entries: &[LogEntry]) -> String {
    let game = escape_html(game);
    let mut rows = String::new();
    for entry in entries {
        let data = serde_json::to_string(&entry.data).unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td><code>{}</code></td></tr>\n",
            entry.server_timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            escape_html(entry.player_id.as_deref().unwrap_or("-")),
            escape_html(entry.event_type.as_deref().unwrap_or("-")),
            escape_html(&data),
        ));
    }
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{game} logs</title></head>\n\
<body><h1>{game} logs</h1><p>{count} entries</p>\n\
<table><thead><tr><th>Time</th><th>Player</th><th>Event</th><th>Data</th></tr></thead>\n\
<tbody>\n{rows}</tbody></table></body></html>\n",
        game = game,
        count = entries.len(),
        rows = rows,
    )
}
