use backend_domain::{
    parse_number_param, parse_rfc3339, EntryQuery, LogFilter, LogListQuery, PlayerFilter,
    PublicLogQuery,
};
use chrono::{DateTime, Utc};
use tracing::error;

use crate::deadline::{with_deadline, Deadline};
use crate::dtos::{LogListResponse, PublicLogs};
use crate::error::QUERY_FAILED;
use crate::{AppError, AppState};

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const PUBLIC_VIEW_LIMIT: usize = 100;
pub const PUBLIC_DOWNLOAD_LIMIT: usize = 1000;

pub(crate) fn required_game(game: Option<String>) -> Result<String, AppError> {
    game.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::MissingParam("game"))
}

/// Non-negative integer or the default; `0` is kept and means unbounded.
fn non_negative_or(raw: Option<&str>, default: usize) -> usize {
    match parse_number_param(raw) {
        Some(value) if value >= 0 => value as usize,
        _ => default,
    }
}

fn unbounded_if_zero(limit: usize) -> Option<usize> {
    (limit > 0).then_some(limit)
}

/// Offset listing, newest first.
pub async fn list_logs(state: &AppState, query: LogListQuery) -> Result<LogListResponse, AppError> {
    let game = required_game(query.game)?;
    let limit = non_negative_or(query.limit.as_deref(), DEFAULT_LIST_LIMIT);
    let offset = non_negative_or(query.offset.as_deref(), 0);
    let start_time = query.start_time.as_deref().and_then(parse_rfc3339);
    let end_time = query.end_time.as_deref().and_then(parse_rfc3339);

    let filter = LogFilter::for_game(game.clone())
        .with_player(PlayerFilter::from_param(query.player_id.as_deref()))
        .with_event_type(query.event_type)
        .with_time_range(start_time, end_time);

    with_deadline(&state.config, Deadline::Medium, async {
        let total = state.log_repo.count_entries(&filter).await.map_err(|err| {
            error!(game = %game, "failed to count log entries: {:#}", err);
            AppError::storage(QUERY_FAILED, "failed to query logs", err)
        })?;
        let entries = state
            .log_repo
            .find_entries(
                &EntryQuery::new(filter.clone())
                    .with_limit(unbounded_if_zero(limit))
                    .with_offset(offset),
            )
            .await
            .map_err(|err| {
                error!(game = %game, "failed to query log entries: {:#}", err);
                AppError::storage(QUERY_FAILED, "failed to query logs", err)
            })?;
        Ok(LogListResponse {
            entries,
            total,
            limit,
            offset,
        })
    })
    .await
}

/// Unauthenticated read of one tenant's newest entries.
pub async fn public_logs(
    state: &AppState,
    query: PublicLogQuery,
    default_limit: usize,
) -> Result<PublicLogs, AppError> {
    let game = required_game(query.game)?;
    let limit = non_negative_or(query.limit.as_deref(), default_limit);
    let entries = with_deadline(&state.config, Deadline::Medium, async {
        state
            .log_repo
            .find_entries(
                &EntryQuery::new(LogFilter::for_game(game.clone()))
                    .with_limit(unbounded_if_zero(limit)),
            )
            .await
            .map_err(|err| {
                error!(game = %game, "failed to query log entries for public view: {:#}", err);
                AppError::storage(QUERY_FAILED, "failed to query logs", err)
            })
    })
    .await?;
    Ok(PublicLogs { game, entries })
}

pub fn public_download_filename(game: &str, now: DateTime<Utc>) -> String {
    format!("{}_logs_{}.json", game, now.format("%Y%m%d_%H%M%S"))
}
