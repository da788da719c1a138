use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Clickhouse,
    Memory,
}

impl StorageBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "clickhouse" => Some(StorageBackend::Clickhouse),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::Clickhouse => "clickhouse",
            StorageBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub admin_token: Option<String>,
    pub max_body_bytes: u64,
    pub ingest_max_body_bytes: u64,
    pub max_batch_size: usize,
    pub request_timeout_seconds: u64,
    pub short_timeout_seconds: u64,
    pub medium_timeout_seconds: u64,
    pub long_timeout_seconds: u64,
    pub index_timeout_seconds: u64,
    pub stream_buffer: usize,
    pub stream_keepalive_seconds: u64,
    pub browse_page_size: usize,
    pub facet_page_size: usize,
    pub export_max_entries: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3234".to_string(),
            api_token: None,
            admin_token: None,
            max_body_bytes: 8 * 1024 * 1024,
            ingest_max_body_bytes: 1024 * 1024,
            max_batch_size: 100,
            request_timeout_seconds: 90,
            short_timeout_seconds: 5,
            medium_timeout_seconds: 15,
            long_timeout_seconds: 60,
            index_timeout_seconds: 30,
            stream_buffer: 16,
            stream_keepalive_seconds: 15,
            browse_page_size: 25,
            facet_page_size: 20,
            export_max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}

// Query parameters. Numbers and cursors stay strings so a bad value falls back
// to the default instead of failing extraction.

#[derive(Debug, Deserialize, Default)]
pub struct LogListQuery {
    pub game: Option<String>,
    #[serde(rename = "playerId")]
    pub player_id: Option<String>,
    #[serde(rename = "eventType")]
    pub event_type: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PublicLogQuery {
    pub game: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BrowseOverviewQuery {
    pub game: Option<String>,
    pub player: Option<String>,
    #[serde(rename = "eventType")]
    pub event_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GamePickerQuery {
    pub q: Option<String>,
    pub selected: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FacetPageQuery {
    pub game: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BrowseEntriesQuery {
    pub game: Option<String>,
    pub player: Option<String>,
    #[serde(rename = "eventType")]
    pub event_type: Option<String>,
    pub limit: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecentQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StreamQuery {
    pub game: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    pub game: Option<String>,
    pub player: Option<String>,
}

/// Lenient numeric parameter: missing, blank or malformed all yield `None`.
pub fn parse_number_param(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!(StorageBackend::parse(" Memory "), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::parse("clickhouse"), Some(StorageBackend::Clickhouse));
        assert_eq!(StorageBackend::parse("mongo"), None);
    }

    #[test]
    fn number_param_ignores_garbage() {
        assert_eq!(parse_number_param(Some("25")), Some(25));
        assert_eq!(parse_number_param(Some("-3")), Some(-3));
        assert_eq!(parse_number_param(Some("abc")), None);
        assert_eq!(parse_number_param(Some("  ")), None);
        assert_eq!(parse_number_param(None), None);
    }
}
