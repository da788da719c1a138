// Browse engine: cursor pages over the log store plus faceted counts

use backend_domain::{
    parse_number_param, BrowseEntriesQuery, BrowseOverviewQuery, EntryQuery, ExportQuery,
    FacetDimension, FacetPageQuery, FacetQuery, GamePickerQuery, IdBound, LogEntry, LogFilter,
    LogId, PlayerFilter, RecentQuery, SortOrder, EMPTY_PLAYER_SENTINEL,
};
use chrono::{DateTime, Utc};
use tracing::{error, warn};

use crate::deadline::{with_deadline, Deadline};
use crate::dtos::{
    BrowseOverview, CursorPage, ExportFile, FacetPage, GamePicker, GamePickerItem, RecentFeed,
};
use crate::error::QUERY_FAILED;
use crate::queries::log_queries::required_game;
use crate::{AppError, AppState};

pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_RECENT_LIMIT: usize = 100;
pub const MAX_RECENT_LIMIT: usize = 1000;
const EVENT_TYPE_LIST_CAP: usize = 1000;

/// Position relative to an entry id. `Before` pages towards newer entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    After(LogId),
    Before(LogId),
}

impl Cursor {
    /// `before` wins over `after`; malformed values count as absent.
    pub fn from_params(after: Option<&str>, before: Option<&str>) -> Option<Self> {
        before
            .and_then(LogId::parse)
            .map(Cursor::Before)
            .or_else(|| after.and_then(LogId::parse).map(Cursor::After))
    }
}

/// One row more than `limit` is fetched to learn whether another page exists.
pub fn cursor_query(filter: LogFilter, cursor: Option<Cursor>, limit: usize) -> EntryQuery {
    let (bound, order) = match cursor {
        None => (None, SortOrder::NewestFirst),
        Some(Cursor::After(id)) => (Some(IdBound::LessThan(id)), SortOrder::NewestFirst),
        Some(Cursor::Before(id)) => (Some(IdBound::GreaterThan(id)), SortOrder::OldestFirst),
    };
    EntryQuery::new(filter)
        .with_id_bound(bound)
        .with_order(order)
        .with_limit(Some(limit + 1))
}

pub fn assemble_page(mut rows: Vec<LogEntry>, cursor: Option<Cursor>, limit: usize) -> CursorPage {
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    if matches!(cursor, Some(Cursor::Before(_))) {
        rows.reverse();
    }
    let (has_prev, has_next) = match cursor {
        None => (false, has_more),
        Some(Cursor::After(_)) => (true, has_more),
        Some(Cursor::Before(_)) => (has_more, true),
    };
    CursorPage {
        prev_cursor: rows.first().map(|entry| entry.id.to_hex()),
        next_cursor: rows.last().map(|entry| entry.id.to_hex()),
        entries: rows,
        limit,
        has_prev,
        has_next,
        total: None,
    }
}

/// 1..=100, otherwise the default.
pub fn resolve_page_size(raw: Option<&str>, default: usize) -> usize {
    match parse_number_param(raw) {
        Some(value) if value > 0 && value as usize <= MAX_PAGE_SIZE => value as usize,
        _ => default.clamp(1, MAX_PAGE_SIZE),
    }
}

pub fn resolve_page(raw: Option<&str>) -> usize {
    match parse_number_param(raw) {
        Some(value) if value > 0 => value as usize,
        _ => 1,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn entry_filter(game: &str, player: Option<&str>, event_type: Option<String>) -> LogFilter {
    LogFilter::for_game(game)
        .with_player(PlayerFilter::from_param(player))
        .with_event_type(event_type)
}

async fn load_cursor_page(
    state: &AppState,
    filter: LogFilter,
    cursor: Option<Cursor>,
    limit: usize,
) -> anyhow::Result<CursorPage> {
    let rows = state
        .log_repo
        .find_entries(&cursor_query(filter.clone(), cursor, limit))
        .await?;
    let mut page = assemble_page(rows, cursor, limit);
    page.total = match state.log_repo.count_entries(&filter).await {
        Ok(total) => Some(total),
        Err(err) => {
            warn!(game = ?filter.game, "failed to count log entries: {:#}", err);
            None
        }
    };
    Ok(page)
}

pub async fn browse_entries(
    state: &AppState,
    query: BrowseEntriesQuery,
) -> Result<CursorPage, AppError> {
    let game = required_game(query.game)?;
    let limit = resolve_page_size(query.limit.as_deref(), state.config.browse_page_size);
    let cursor = Cursor::from_params(query.after.as_deref(), query.before.as_deref());
    let filter = entry_filter(&game, query.player.as_deref(), query.event_type);

    with_deadline(&state.config, Deadline::Medium, async {
        load_cursor_page(state, filter, cursor, limit)
            .await
            .map_err(|err| {
                error!(game = %game, "failed to list logs: {:#}", err);
                AppError::storage(QUERY_FAILED, "failed to query logs", err)
            })
    })
    .await
}

async fn load_facet_page(
    state: &AppState,
    game: &str,
    dimension: FacetDimension,
    search: Option<String>,
    page: usize,
    page_size: usize,
) -> anyhow::Result<FacetPage> {
    let query = FacetQuery {
        game: game.to_string(),
        dimension,
        search: search.clone(),
        page,
        page_size,
    };
    let counts = state.log_repo.group_count(&query).await?;

    let shown = counts.items.len() as u64;
    let (range_start, range_end) = if counts.total == 0 {
        (0, 0)
    } else {
        let start = query.skip() as u64 + 1;
        (start, (start + shown).saturating_sub(1).min(counts.total))
    };
    Ok(FacetPage {
        game: game.to_string(),
        dimension,
        search,
        has_prev: page > 1,
        has_next: (page.saturating_mul(page_size) as u64) < counts.total,
        items: counts.items,
        total: counts.total,
        page,
        page_size,
        range_start,
        range_end,
    })
}

async fn facet_page(
    state: &AppState,
    query: FacetPageQuery,
    dimension: FacetDimension,
) -> Result<FacetPage, AppError> {
    let game = required_game(query.game)?;
    let page = resolve_page(query.page.as_deref());
    let search = non_empty(query.search);
    let page_size = state.config.facet_page_size.max(1);

    with_deadline(&state.config, Deadline::Medium, async {
        load_facet_page(state, &game, dimension, search, page, page_size)
            .await
            .map_err(|err| {
                error!(game = %game, ?dimension, "failed to group log entries: {:#}", err);
                AppError::storage(QUERY_FAILED, "failed to query logs", err)
            })
    })
    .await
}

pub async fn player_facets(state: &AppState, query: FacetPageQuery) -> Result<FacetPage, AppError> {
    facet_page(state, query, FacetDimension::Player).await
}

pub async fn event_type_facets(
    state: &AppState,
    query: FacetPageQuery,
) -> Result<FacetPage, AppError> {
    facet_page(state, query, FacetDimension::EventType).await
}

async fn load_event_type_names(state: &AppState, game: &str) -> anyhow::Result<Vec<String>> {
    let counts = state
        .log_repo
        .group_count(&FacetQuery {
            game: game.to_string(),
            dimension: FacetDimension::EventType,
            search: None,
            page: 1,
            page_size: EVENT_TYPE_LIST_CAP,
        })
        .await?;
    Ok(counts
        .items
        .into_iter()
        .map(|facet| facet.value)
        .filter(|value| !value.is_empty())
        .collect())
}

/// Everything a browsing screen needs in one call. Only the tenant list is mandatory;
/// the other sections degrade to empty on failure.
pub async fn browse_overview(
    state: &AppState,
    query: BrowseOverviewQuery,
) -> Result<BrowseOverview, AppError> {
    with_deadline(&state.config, Deadline::Medium, async move {
        let games = state.log_repo.distinct_games().await.map_err(|err| {
            error!("failed to list games: {:#}", err);
            AppError::storage(QUERY_FAILED, "failed to load games", err)
        })?;
        let total_all_logs = state.log_repo.count_all().await.unwrap_or_else(|err| {
            warn!("failed to count all logs: {:#}", err);
            0
        });

        let selected_game = non_empty(query.game).or_else(|| games.first().cloned());
        let selected_player = non_empty(query.player);
        let selected_event_type = non_empty(query.event_type);
        let limit = resolve_page_size(query.limit.as_deref(), state.config.browse_page_size);

        let mut overview = BrowseOverview {
            games,
            selected_game: selected_game.clone(),
            selected_player: selected_player.clone(),
            selected_event_type: selected_event_type.clone(),
            players: None,
            event_types: Vec::new(),
            logs: CursorPage {
                limit,
                ..CursorPage::default()
            },
            total_all_logs,
        };
        let Some(game) = selected_game else {
            return Ok(overview);
        };

        let page = resolve_page(query.page.as_deref());
        match load_facet_page(
            state,
            &game,
            FacetDimension::Player,
            non_empty(query.search),
            page,
            state.config.facet_page_size.max(1),
        )
        .await
        {
            Ok(players) => overview.players = Some(players),
            Err(err) => warn!(game = %game, "failed to list players with counts: {:#}", err),
        }

        match load_event_type_names(state, &game).await {
            Ok(event_types) => overview.event_types = event_types,
            Err(err) => warn!(game = %game, "failed to list event types: {:#}", err),
        }

        let filter = entry_filter(&game, selected_player.as_deref(), selected_event_type);
        match load_cursor_page(state, filter, None, limit).await {
            Ok(logs) => overview.logs = logs,
            Err(err) => warn!(game = %game, "failed to list logs: {:#}", err),
        }

        Ok(overview)
    })
    .await
}

pub async fn game_picker(state: &AppState, query: GamePickerQuery) -> Result<GamePicker, AppError> {
    let games = with_deadline(&state.config, Deadline::Medium, async {
        Ok(state.log_repo.distinct_games().await.unwrap_or_else(|err| {
            warn!("failed to list games: {:#}", err);
            Vec::new()
        }))
    })
    .await?;

    let needle = query.q.as_deref().unwrap_or_default().to_lowercase();
    let selected = non_empty(query.selected);
    let games = games
        .into_iter()
        .filter(|game| needle.is_empty() || game.to_lowercase().contains(&needle))
        .map(|name| GamePickerItem {
            selected: selected.as_deref() == Some(name.as_str()),
            name,
        })
        .collect();
    Ok(GamePicker {
        games,
        selected,
        query: non_empty(query.q),
    })
}

pub async fn recent_logs(state: &AppState, query: RecentQuery) -> Result<RecentFeed, AppError> {
    let limit = match parse_number_param(query.limit.as_deref()) {
        Some(value) if value > 0 && value as usize <= MAX_RECENT_LIMIT => value as usize,
        _ => DEFAULT_RECENT_LIMIT,
    };
    with_deadline(&state.config, Deadline::Medium, async {
        let entries = state.log_repo.list_recent(limit).await.map_err(|err| {
            error!(limit, "failed to list recent logs: {:#}", err);
            AppError::storage(QUERY_FAILED, "failed to load recent logs", err)
        })?;
        let total = state.log_repo.count_all().await.unwrap_or_else(|err| {
            warn!("failed to count all logs: {:#}", err);
            0
        });
        Ok(RecentFeed {
            entries,
            total,
            limit,
        })
    })
    .await
}

pub fn export_filename(game: &str, player: Option<&str>, now: DateTime<Utc>) -> String {
    let mut filename = format!("logs-{}", game);
    if let Some(player) = player.filter(|p| !p.is_empty() && *p != EMPTY_PLAYER_SENTINEL) {
        filename.push('-');
        filename.push_str(player);
    }
    filename.push('-');
    filename.push_str(&now.format("%Y-%m-%d-%H%M%S").to_string());
    filename.push_str(".json");
    filename
}

/// Newest-first flat documents for one tenant, optionally one player.
pub async fn export_logs(state: &AppState, query: ExportQuery) -> Result<ExportFile, AppError> {
    let game = required_game(query.game)?;
    let player = non_empty(query.player);
    let filter = LogFilter::for_game(game.clone())
        .with_player(PlayerFilter::from_param(player.as_deref()));
    let cap = state.config.export_max_entries.max(1);

    let entries = with_deadline(&state.config, Deadline::Long, async {
        state
            .log_repo
            .find_entries(&EntryQuery::new(filter).with_limit(Some(cap)))
            .await
            .map_err(|err| {
                error!(game = %game, player_id = ?player, "failed to list logs for download: {:#}", err);
                AppError::storage(QUERY_FAILED, "failed to load logs", err)
            })
    })
    .await?;

    Ok(ExportFile {
        filename: export_filename(&game, player.as_deref(), Utc::now()),
        documents: entries.iter().map(LogEntry::to_document).collect(),
    })
}
