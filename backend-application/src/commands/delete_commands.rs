use backend_domain::{GameId, LogId, PlayerFilter};
use tracing::{error, info};

use crate::deadline::{with_deadline, Deadline};
use crate::dtos::DeleteResponse;
use crate::error::DELETE_FAILED;
use crate::{AppError, AppState};

pub async fn delete_entry(
    state: &AppState,
    game: &str,
    raw_id: &str,
) -> Result<DeleteResponse, AppError> {
    let game = GameId::parse(game)?;
    let id = LogId::parse(raw_id).ok_or_else(|| AppError::InvalidId(raw_id.to_string()))?;
    let deleted = with_deadline(&state.config, Deadline::Short, async {
        state
            .log_repo
            .delete_entry(game.as_str(), id)
            .await
            .map_err(|err| {
                error!(game = %game, id = %id, "failed to delete log entry: {:#}", err);
                AppError::storage(DELETE_FAILED, "failed to delete log entry", err)
            })
    })
    .await?;
    info!(game = %game, id = %id, deleted, "log entry deleted");
    Ok(DeleteResponse {
        status: "deleted",
        deleted,
    })
}

/// `player` may be the empty-player sentinel; an empty value is rejected.
pub async fn delete_player_entries(
    state: &AppState,
    game: &str,
    player: &str,
) -> Result<DeleteResponse, AppError> {
    let game = GameId::parse(game)?;
    let filter = PlayerFilter::from_param(Some(player));
    if filter == PlayerFilter::Any {
        return Err(AppError::MissingParam("player"));
    }
    let deleted = with_deadline(&state.config, Deadline::Medium, async {
        state
            .log_repo
            .delete_player_entries(game.as_str(), &filter)
            .await
            .map_err(|err| {
                error!(game = %game, player_id = player, "failed to delete player logs: {:#}", err);
                AppError::storage(DELETE_FAILED, "failed to delete logs", err)
            })
    })
    .await?;
    info!(game = %game, player_id = player, deleted, "player logs deleted");
    Ok(DeleteResponse {
        status: "deleted",
        deleted,
    })
}

pub async fn delete_game_entries(state: &AppState, game: &str) -> Result<DeleteResponse, AppError> {
    let game = GameId::parse(game)?;
    let deleted = with_deadline(&state.config, Deadline::Medium, async {
        state
            .log_repo
            .delete_game_entries(game.as_str())
            .await
            .map_err(|err| {
                error!(game = %game, "failed to delete game logs: {:#}", err);
                AppError::storage(DELETE_FAILED, "failed to delete logs", err)
            })
    })
    .await?;
    info!(game = %game, deleted, "game logs deleted");
    Ok(DeleteResponse {
        status: "deleted",
        deleted,
    })
}
