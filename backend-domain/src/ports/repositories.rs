use async_trait::async_trait;

use crate::entities::{
    EntryQuery, FacetCounts, FacetQuery, LogEntry, LogFilter, NewLogEntry, PlayerFilter,
};
use crate::value_objects::LogId;

/// Append-mostly store of log entries. Entries are inserted or deleted, never updated.
#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;

    /// Idempotent; safe to run concurrently from detached tasks.
    async fn ensure_indexes(&self) -> anyhow::Result<()>;

    /// Assigns ids and persists the whole batch as one unit.
    async fn insert_entries(&self, entries: Vec<NewLogEntry>) -> anyhow::Result<Vec<LogEntry>>;

    async fn find_entries(&self, query: &EntryQuery) -> anyhow::Result<Vec<LogEntry>>;

    async fn count_entries(&self, filter: &LogFilter) -> anyhow::Result<u64>;

    /// Sorted, de-duplicated tenants with at least one entry.
    async fn distinct_games(&self) -> anyhow::Result<Vec<String>>;

    async fn group_count(&self, query: &FacetQuery) -> anyhow::Result<FacetCounts>;

    async fn delete_entry(&self, game: &str, id: LogId) -> anyhow::Result<u64>;

    async fn delete_player_entries(&self, game: &str, player: &PlayerFilter)
        -> anyhow::Result<u64>;

    async fn delete_game_entries(&self, game: &str) -> anyhow::Result<u64>;

    async fn ping(&self) -> anyhow::Result<()>;

    async fn list_recent(&self, limit: usize) -> anyhow::Result<Vec<LogEntry>> {
        self.find_entries(&EntryQuery::new(LogFilter::all_games()).with_limit(Some(limit)))
            .await
    }

    async fn count_all(&self) -> anyhow::Result<u64> {
        self.count_entries(&LogFilter::all_games()).await
    }
}
