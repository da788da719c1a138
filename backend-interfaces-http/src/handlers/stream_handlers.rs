use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream};
use tracing::{debug, warn};

use backend_application::ops::LogSubscription;
use backend_application::AppState;
use backend_domain::{LogEvent, StreamQuery};

use crate::error::HttpError;
use crate::middleware::authorize_admin;

struct StreamCursor {
    subscription: LogSubscription,
    game: Option<String>,
    connected: bool,
}

impl StreamCursor {
    /// Next event for this viewer's game; `None` once the hub has dropped the subscriber.
    async fn next_event(&mut self) -> Option<LogEvent> {
        loop {
            let event = self.subscription.recv().await?;
            if self.game.as_deref().is_some_and(|game| game != event.game) {
                continue;
            }
            return Some(event);
        }
    }

    async fn next_frame(mut self) -> Option<(Result<Event, Infallible>, Self)> {
        if !self.connected {
            self.connected = true;
            let frame = Event::default()
                .event("connected")
                .data(r#"{"status":"connected"}"#);
            return Some((Ok(frame), self));
        }
        loop {
            let event = self.next_event().await?;
            match log_frame(&event) {
                Ok(frame) => return Some((Ok(frame), self)),
                Err(err) => warn!(id = %event.id, "failed to serialize log event: {}", err),
            }
        }
    }
}

fn log_frame(event: &LogEvent) -> Result<Event, axum::Error> {
    Event::default().event("log").json_data(event)
}

/// Live feed of accepted entries, optionally limited to one game.
pub async fn stream_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HttpError> {
    if !authorize_admin(&state.config, &headers, query.access_token.as_deref()) {
        return Err(HttpError::Unauthorized);
    }

    let subscription = state.hub.subscribe();
    let game = query.game.filter(|game| !game.is_empty());
    debug!(
        subscriber = subscription.id(),
        game = ?game,
        subscribers = state.hub.subscriber_count(),
        "log stream connected"
    );

    let cursor = StreamCursor {
        subscription,
        game,
        connected: false,
    };
    let frames = stream::unfold(cursor, StreamCursor::next_frame);
    let keep_alive =
        KeepAlive::new().interval(Duration::from_secs(state.config.stream_keepalive_seconds.max(1)));
    Ok(Sse::new(frames).keep_alive(keep_alive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use backend_application::commands::ingest_payload;
    use backend_domain::RuntimeConfig;
    use backend_infrastructure::MemoryLogRepository;
    use serde_json::json;

    fn cursor(state: &AppState, game: Option<&str>) -> StreamCursor {
        StreamCursor {
            subscription: state.hub.subscribe(),
            game: game.map(str::to_string),
            connected: false,
        }
    }

    #[tokio::test]
    async fn stream_acknowledges_then_forwards_matching_events() {
        let state = AppState::new(RuntimeConfig::default(), Arc::new(MemoryLogRepository::new()));
        let cursor = cursor(&state, Some("mhs"));

        let (_, mut cursor) = cursor.next_frame().await.expect("connected frame");
        assert!(cursor.connected);

        ingest_payload(&state, json!({"game": "other", "eventType": "skip"}))
            .await
            .expect("other game");
        ingest_payload(&state, json!({"game": "mhs", "eventType": "keep", "level": 2}))
            .await
            .expect("mhs");

        let event = cursor.next_event().await.expect("log event");
        assert_eq!(event.game, "mhs");
        assert_eq!(event.event_type.as_deref(), Some("keep"));
        assert_eq!(event.data["level"], json!(2));
        assert!(log_frame(&event).is_ok());
        assert!(cursor.subscription.try_recv().is_err());

        assert_eq!(state.hub.subscriber_count(), 1);
        drop(cursor);
        assert_eq!(state.hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unfiltered_stream_forwards_every_game() {
        let state = AppState::new(RuntimeConfig::default(), Arc::new(MemoryLogRepository::new()));
        let mut cursor = cursor(&state, None);

        ingest_payload(&state, json!({"game": "other", "playerId": "p9"}))
            .await
            .expect("other game");

        let event = cursor.next_event().await.expect("log event");
        assert_eq!(event.game, "other");
        assert_eq!(event.player_id.as_deref(), Some("p9"));
    }

    #[tokio::test]
    async fn stream_ends_when_the_hub_drops_the_subscriber() {
        let state = AppState::new(RuntimeConfig::default(), Arc::new(MemoryLogRepository::new()));
        let cursor = cursor(&state, None);
        let (_, cursor) = cursor.next_frame().await.expect("connected frame");

        assert!(state.hub.unsubscribe(cursor.subscription.id()));
        assert!(cursor.next_frame().await.is_none());
        assert_eq!(state.hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_accepts_access_token_query() {
        let config = RuntimeConfig {
            admin_token: Some("root".to_string()),
            ..RuntimeConfig::default()
        };
        let state = AppState::new(config, Arc::new(MemoryLogRepository::new()));

        let denied = stream_logs(
            State(state.clone()),
            HeaderMap::new(),
            Query(StreamQuery::default()),
        )
        .await;
        assert!(matches!(denied, Err(HttpError::Unauthorized)));

        let allowed = stream_logs(
            State(state.clone()),
            HeaderMap::new(),
            Query(StreamQuery {
                game: None,
                access_token: Some("root".to_string()),
            }),
        )
        .await;
        assert!(allowed.is_ok());
        assert_eq!(state.hub.subscriber_count(), 1);
        drop(allowed);
        assert_eq!(state.hub.subscriber_count(), 0);
    }
}
