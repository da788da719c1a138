// Read-side query shapes shared by every log store

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::log_entry::{compare_chronological, LogEntry};
use crate::value_objects::{LogId, EMPTY_PLAYER_SENTINEL};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlayerFilter {
    #[default]
    Any,
    /// Entries whose player is missing, null or empty.
    Missing,
    Exact(String),
}

impl PlayerFilter {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            None | Some("") => PlayerFilter::Any,
            Some(EMPTY_PLAYER_SENTINEL) => PlayerFilter::Missing,
            Some(player) => PlayerFilter::Exact(player.to_string()),
        }
    }

    pub fn matches(&self, player_id: Option<&str>) -> bool {
        let bucket = player_id.unwrap_or_default();
        match self {
            PlayerFilter::Any => true,
            PlayerFilter::Missing => bucket.is_empty(),
            PlayerFilter::Exact(expected) => bucket == expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogFilter {
    /// `None` spans all tenants.
    pub game: Option<String>,
    pub player: PlayerFilter,
    pub event_type: Option<String>,
    /// Inclusive lower bound on `server_timestamp`.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `server_timestamp`.
    pub end_time: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn all_games() -> Self {
        Self::default()
    }

    pub fn for_game(game: impl Into<String>) -> Self {
        Self {
            game: Some(game.into()),
            ..Self::default()
        }
    }

    pub fn with_player(mut self, player: PlayerFilter) -> Self {
        self.player = player;
        self
    }

    pub fn with_event_type(mut self, event_type: Option<String>) -> Self {
        self.event_type = event_type.filter(|value| !value.is_empty());
        self
    }

    pub fn with_time_range(
        mut self,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(game) = &self.game {
            if entry.game != *game {
                return false;
            }
        }
        if !self.player.matches(entry.player_id.as_deref()) {
            return false;
        }
        if let Some(event_type) = &self.event_type {
            if entry.event_type.as_deref() != Some(event_type.as_str()) {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if entry.server_timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if entry.server_timestamp > end {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn compare(self, a: &LogEntry, b: &LogEntry) -> Ordering {
        match self {
            SortOrder::NewestFirst => compare_chronological(b, a),
            SortOrder::OldestFirst => compare_chronological(a, b),
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "DESC",
            SortOrder::OldestFirst => "ASC",
        }
    }
}

/// Restriction on `id` relative to a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdBound {
    LessThan(LogId),
    GreaterThan(LogId),
}

impl IdBound {
    pub fn admits(self, id: LogId) -> bool {
        match self {
            IdBound::LessThan(cursor) => id < cursor,
            IdBound::GreaterThan(cursor) => id > cursor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryQuery {
    pub filter: LogFilter,
    pub id_bound: Option<IdBound>,
    pub order: SortOrder,
    /// `None` means unbounded.
    pub limit: Option<usize>,
    pub offset: usize,
}

impl EntryQuery {
    pub fn new(filter: LogFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_id_bound(mut self, id_bound: Option<IdBound>) -> Self {
        self.id_bound = id_bound;
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.filter.matches(entry)
            && self
                .id_bound
                .map(|bound| bound.admits(entry.id))
                .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetDimension {
    Player,
    EventType,
}

impl FacetDimension {
    pub fn bucket<'a>(&self, entry: &'a LogEntry) -> &'a str {
        match self {
            FacetDimension::Player => entry.player_bucket(),
            FacetDimension::EventType => entry.event_type_bucket(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetQuery {
    pub game: String,
    pub dimension: FacetDimension,
    /// Case-insensitive substring match on the bucket value.
    pub search: Option<String>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl FacetQuery {
    pub fn skip(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn matches_search(&self, value: &str) -> bool {
        match self.search.as_deref() {
            None | Some("") => true,
            Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FacetCounts {
    pub items: Vec<FacetCount>,
    /// Distinct bucket count across all pages.
    pub total: u64,
}

/// Descending by count, then ascending by value.
pub fn compare_facets(a: &FacetCount, b: &FacetCount) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value))
}
