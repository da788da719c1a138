// Response shapes

use backend_domain::{FacetCount, FacetDimension, LogEntry};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub received_at: String,
    #[serde(skip)]
    pub accepted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogListResponse {
    pub entries: Vec<LogEntry>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct PublicLogs {
    pub game: String,
    pub entries: Vec<LogEntry>,
}

/// One cursor page, always newest first.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage {
    pub entries: Vec<LogEntry>,
    pub limit: usize,
    pub has_prev: bool,
    pub has_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Filtered total; absent when counting failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetPage {
    pub game: String,
    pub dimension: FacetDimension,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub items: Vec<FacetCount>,
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
    pub has_prev: bool,
    pub has_next: bool,
    /// 1-based position of the first item, 0 when empty.
    pub range_start: u64,
    pub range_end: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseOverview {
    pub games: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_game: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_player: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<FacetPage>,
    pub event_types: Vec<String>,
    pub logs: CursorPage,
    pub total_all_logs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GamePickerItem {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePicker {
    pub games: Vec<GamePickerItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentFeed {
    pub entries: Vec<LogEntry>,
    pub total: u64,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub documents: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
    pub deleted: u64,
}
