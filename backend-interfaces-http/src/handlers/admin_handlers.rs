use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::delete_commands;
use backend_application::dtos::DeleteResponse;
use backend_application::AppState;

use crate::error::HttpError;
use crate::middleware::authorize_admin;

pub async fn delete_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((game, id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, HttpError> {
    if !authorize_admin(&state.config, &headers, None) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(delete_commands::delete_entry(&state, &game, &id).await?))
}

/// `player_id` may be `__empty__` to remove entries that have no player.
pub async fn delete_player_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((game, player_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, HttpError> {
    if !authorize_admin(&state.config, &headers, None) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(
        delete_commands::delete_player_entries(&state, &game, &player_id).await?,
    ))
}

pub async fn delete_game_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(game): Path<String>,
) -> Result<Json<DeleteResponse>, HttpError> {
    if !authorize_admin(&state.config, &headers, None) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(delete_commands::delete_game_entries(&state, &game).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use backend_application::commands::ingest_payload;
    use backend_domain::RuntimeConfig;
    use backend_infrastructure::MemoryLogRepository;
    use serde_json::json;

    #[tokio::test]
    async fn deletes_report_counts() {
        let state = AppState::new(RuntimeConfig::default(), Arc::new(MemoryLogRepository::new()));
        ingest_payload(
            &state,
            json!({"game": "mhs", "entries": [{"playerId": "p1"}, {"playerId": "p1"}, {}]}),
        )
        .await
        .expect("seed");
        let first = state
            .log_repo
            .list_recent(1)
            .await
            .expect("recent")
            .remove(0);

        let Json(single) = delete_entry(
            State(state.clone()),
            HeaderMap::new(),
            Path(("mhs".to_string(), first.id.to_hex())),
        )
        .await
        .expect("delete one");
        assert_eq!(single.deleted, 1);

        let Json(by_player) = delete_player_entries(
            State(state.clone()),
            HeaderMap::new(),
            Path(("mhs".to_string(), "p1".to_string())),
        )
        .await
        .expect("delete player");
        assert_eq!(by_player.deleted, 2);
        assert_eq!(state.log_repo.count_all().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn malformed_id_is_a_bad_request() {
        let state = AppState::new(RuntimeConfig::default(), Arc::new(MemoryLogRepository::new()));
        let err = delete_entry(
            State(state),
            HeaderMap::new(),
            Path(("mhs".to_string(), "xyz".to_string())),
        )
        .await
        .expect_err("bad id");
        assert!(matches!(err, HttpError::BadRequest { code: "INVALID_ID", .. }));
    }
}
