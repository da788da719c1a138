use std::sync::Arc;

use serde_json::json;

use backend_application::commands::ingest_payload;
use backend_application::queries::{browse_entries, browse_overview, player_facets};
use backend_application::AppState;
use backend_domain::{
    BrowseEntriesQuery, BrowseOverviewQuery, EntryValidator, FacetPageQuery, LogRepository,
    RuntimeConfig, EMPTY_PLAYER_SENTINEL,
};
use backend_infrastructure::MemoryLogRepository;

async fn seeded_state(game: &str, count: usize) -> AppState {
    let state = AppState::new(
        RuntimeConfig::default(),
        Arc::new(MemoryLogRepository::new()),
    );
    let entries = (0..count)
        .map(|i| json!({"playerId": format!("p{}", i % 3), "eventType": "tick", "n": i}))
        .collect::<Vec<_>>();
    for chunk in entries.chunks(100) {
        ingest_payload(&state, json!({"game": game, "entries": chunk}))
            .await
            .expect("seed");
    }
    state
}

fn page_query(game: &str, limit: usize) -> BrowseEntriesQuery {
    BrowseEntriesQuery {
        game: Some(game.to_string()),
        limit: Some(limit.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn following_next_cursor_walks_all_entries_once() {
    let state = seeded_state("x", 150).await;

    let first = browse_entries(&state, page_query("x", 50)).await.expect("page 1");
    assert_eq!(first.entries.len(), 50);
    assert!(first.has_next);
    assert!(!first.has_prev);
    assert_eq!(first.total, Some(150));

    let mut seen = first.entries.iter().map(|e| e.id).collect::<Vec<_>>();
    let mut cursor = first.next_cursor.clone();
    for expected_has_next in [true, false] {
        let page = browse_entries(
            &state,
            BrowseEntriesQuery {
                after: cursor.clone(),
                ..page_query("x", 50)
            },
        )
        .await
        .expect("next page");
        assert_eq!(page.entries.len(), 50);
        assert!(page.has_prev);
        assert_eq!(page.has_next, expected_has_next);
        seen.extend(page.entries.iter().map(|e| e.id));
        cursor = page.next_cursor.clone();
    }

    let past_end = browse_entries(
        &state,
        BrowseEntriesQuery {
            after: cursor,
            ..page_query("x", 50)
        },
    )
    .await
    .expect("past the end");
    assert!(past_end.entries.is_empty());
    assert!(!past_end.has_next);

    assert_eq!(seen.len(), 150);
    assert!(seen.windows(2).all(|pair| pair[0] > pair[1]));
}

#[tokio::test]
async fn before_cursor_returns_the_previous_page_newest_first() {
    let state = seeded_state("x", 150).await;
    let first = browse_entries(&state, page_query("x", 50)).await.expect("page 1");
    let second = browse_entries(
        &state,
        BrowseEntriesQuery {
            after: first.next_cursor.clone(),
            ..page_query("x", 50)
        },
    )
    .await
    .expect("page 2");

    let back = browse_entries(
        &state,
        BrowseEntriesQuery {
            before: second.prev_cursor.clone(),
            ..page_query("x", 50)
        },
    )
    .await
    .expect("back to page 1");

    let ids = |entries: &[backend_domain::LogEntry]| entries.iter().map(|e| e.id).collect::<Vec<_>>();
    assert_eq!(ids(&back.entries), ids(&first.entries));
    assert!(!back.has_prev);
    assert!(back.has_next);
    assert_eq!(back.next_cursor, first.next_cursor);
}

#[tokio::test]
async fn entries_stored_out_of_acceptance_order_are_all_reachable() {
    let repo = Arc::new(MemoryLogRepository::new());
    let state = AppState::new(RuntimeConfig::default(), repo.clone());
    let validator = EntryValidator::default();

    let accepted_first = validator
        .validate(json!({"game": "x", "eventType": "a"}))
        .expect("a");
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let accepted_second = validator
        .validate(json!({"game": "x", "eventType": "b"}))
        .expect("b");

    let b = repo
        .insert_entries(accepted_second.entries)
        .await
        .expect("insert b");
    let a = repo
        .insert_entries(accepted_first.entries)
        .await
        .expect("insert a");
    assert!(a[0].id > b[0].id);
    assert!(a[0].server_timestamp >= b[0].server_timestamp);

    let first = browse_entries(&state, page_query("x", 1)).await.expect("page 1");
    assert_eq!(first.entries[0].event_type.as_deref(), Some("a"));
    assert!(first.has_next);

    let second = browse_entries(
        &state,
        BrowseEntriesQuery {
            after: first.next_cursor.clone(),
            ..page_query("x", 1)
        },
    )
    .await
    .expect("page 2");
    assert_eq!(second.entries.len(), 1);
    assert_eq!(second.entries[0].event_type.as_deref(), Some("b"));
    assert!(!second.has_next);
}

#[tokio::test]
async fn malformed_cursor_starts_from_the_newest_page() {
    let state = seeded_state("x", 10).await;
    let page = browse_entries(
        &state,
        BrowseEntriesQuery {
            after: Some("not-a-cursor".to_string()),
            ..page_query("x", 5)
        },
    )
    .await
    .expect("page");
    assert!(!page.has_prev);
    assert!(page.has_next);
    assert_eq!(page.entries.len(), 5);
}

#[tokio::test]
async fn player_facets_page_through_counts() {
    let state = seeded_state("x", 30).await;
    ingest_payload(&state, json!({"game": "x", "eventType": "orphan"}))
        .await
        .expect("orphan entry");

    let facets = player_facets(
        &state,
        FacetPageQuery {
            game: Some("x".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("facets");
    assert_eq!(facets.total, 4);
    assert_eq!(facets.items.len(), 4);
    assert_eq!(facets.items[0].count, 10);
    assert_eq!(facets.items[3].value, "");
    assert_eq!((facets.range_start, facets.range_end), (1, 4));
    assert!(!facets.has_next);

    let filtered = browse_entries(
        &state,
        BrowseEntriesQuery {
            player: Some(EMPTY_PLAYER_SENTINEL.to_string()),
            ..page_query("x", 50)
        },
    )
    .await
    .expect("empty player bucket");
    assert_eq!(filtered.entries.len(), 1);
    assert_eq!(filtered.entries[0].event_type.as_deref(), Some("orphan"));
}

#[tokio::test]
async fn overview_combines_games_facets_and_logs() {
    let state = seeded_state("x", 12).await;
    ingest_payload(&state, json!({"game": "y", "eventType": "boot"}))
        .await
        .expect("second game");

    let overview = browse_overview(
        &state,
        BrowseOverviewQuery {
            game: Some("x".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("overview");
    assert_eq!(overview.games, vec!["x", "y"]);
    assert_eq!(overview.selected_game.as_deref(), Some("x"));
    assert_eq!(overview.event_types, vec!["tick"]);
    assert_eq!(overview.players.as_ref().map(|page| page.total), Some(3));
    assert_eq!(overview.logs.entries.len(), 12);
    assert_eq!(overview.total_all_logs, 13);
}
