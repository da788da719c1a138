use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clickhouse::query::Query;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use backend_domain::{
    EntryQuery, FacetCount, FacetCounts, FacetDimension, FacetQuery, IdBound, LogEntry, LogFilter,
    LogId, LogIdGenerator, LogRepository, NewLogEntry, PlayerFilter, stamp_batch,
};

use crate::utils::{chrono_to_offset, millis_to_utc, offset_to_chrono};

const TABLE: &str = "log_entries";
const COLUMNS: &str =
    "id, game, player_id, event_type, client_timestamp, server_timestamp, data";

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
struct LogRow {
    id: u64,
    game: String,
    /// '' when the entry has no player.
    player_id: String,
    event_type: String,
    client_timestamp: Option<i64>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    server_timestamp: OffsetDateTime,
    /// Open attributes as a JSON object.
    data: String,
}

impl LogRow {
    fn from_entry(entry: &LogEntry) -> Result<Self> {
        Ok(Self {
            id: entry.id.value(),
            game: entry.game.to_string(),
            player_id: entry.player_id.clone().unwrap_or_default(),
            event_type: entry.event_type.clone().unwrap_or_default(),
            client_timestamp: entry.client_timestamp.map(|ts| ts.timestamp_millis()),
            server_timestamp: chrono_to_offset(entry.server_timestamp),
            data: serde_json::to_string(&entry.data).context("serialize log data")?,
        })
    }

    fn into_entry(self) -> LogEntry {
        let id = LogId::new(self.id);
        let data = match serde_json::from_str::<Map<String, Value>>(&self.data) {
            Ok(data) => data,
            Err(err) => {
                warn!(id = %id, "stored log data is not a JSON object: {}", err);
                Map::new()
            }
        };
        LogEntry {
            id,
            game: self.game,
            player_id: Some(self.player_id).filter(|value| !value.is_empty()),
            event_type: Some(self.event_type).filter(|value| !value.is_empty()),
            client_timestamp: self
                .client_timestamp
                .and_then(millis_to_utc)
                .map(offset_to_chrono),
            server_timestamp: offset_to_chrono(self.server_timestamp),
            data,
        }
    }
}

enum BindValue {
    Str(String),
    U64(u64),
    I64(i64),
}

/// WHERE clause with positional `?` placeholders and their values in order.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    binds: Vec<BindValue>,
}

impl Conditions {
    fn from_filter(filter: &LogFilter) -> Self {
        let mut conditions = Self::default();
        if let Some(game) = &filter.game {
            conditions.push("game = ?", BindValue::Str(game.clone()));
        }
        match &filter.player {
            PlayerFilter::Any => {}
            PlayerFilter::Missing => conditions.clauses.push("player_id = ''".to_string()),
            PlayerFilter::Exact(player) => {
                conditions.push("player_id = ?", BindValue::Str(player.clone()))
            }
        }
        if let Some(event_type) = &filter.event_type {
            conditions.push("event_type = ?", BindValue::Str(event_type.clone()));
        }
        if let Some(start) = filter.start_time {
            conditions.push(
                "server_timestamp >= fromUnixTimestamp64Milli(toInt64(?), 'UTC')",
                BindValue::I64(start.timestamp_millis()),
            );
        }
        if let Some(end) = filter.end_time {
            conditions.push(
                "server_timestamp <= fromUnixTimestamp64Milli(toInt64(?), 'UTC')",
                BindValue::I64(end.timestamp_millis()),
            );
        }
        conditions
    }

    fn push(&mut self, clause: &str, value: BindValue) {
        self.clauses.push(clause.to_string());
        self.binds.push(value);
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            "1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }

    fn bind(self, mut query: Query) -> Query {
        for value in self.binds {
            query = match value {
                BindValue::Str(value) => query.bind(value),
                BindValue::U64(value) => query.bind(value),
                BindValue::I64(value) => query.bind(value),
            };
        }
        query
    }
}

pub struct ClickhouseLogRepository {
    client: Client,
    database: String,
    ids: LogIdGenerator,
    indexes_ready: AtomicBool,
}

impl ClickhouseLogRepository {
    pub fn new(client: Client, database: String) -> Self {
        Self {
            client,
            database,
            ids: LogIdGenerator::new(),
            indexes_ready: AtomicBool::new(false),
        }
    }

    /// Raises the id floor to the stored maximum so ids keep increasing across restarts.
    pub async fn seed_id_generator(&self) -> Result<()> {
        let max_id: u64 = self
            .client
            .query(&format!("SELECT max(id) FROM {}", TABLE))
            .fetch_one()
            .await?;
        self.ids.observe(LogId::new(max_id));
        debug!(max_id, "log id generator seeded");
        Ok(())
    }

    fn facet_column(dimension: FacetDimension) -> &'static str {
        match dimension {
            FacetDimension::Player => "player_id",
            FacetDimension::EventType => "event_type",
        }
    }

    fn facet_conditions(query: &FacetQuery) -> Conditions {
        let mut conditions = Conditions::from_filter(&LogFilter::for_game(query.game.clone()));
        if let Some(search) = query.search.as_deref().filter(|value| !value.is_empty()) {
            conditions.push(
                &format!(
                    "positionCaseInsensitiveUTF8({}, ?) > 0",
                    Self::facet_column(query.dimension)
                ),
                BindValue::Str(search.to_string()),
            );
        }
        conditions
    }

    async fn count_where(&self, conditions: Conditions) -> Result<u64> {
        let sql = format!("SELECT count() FROM {} WHERE {}", TABLE, conditions.sql());
        let count = conditions.bind(self.client.query(&sql)).fetch_one().await?;
        Ok(count)
    }

    async fn delete_where(&self, conditions: Conditions, count: u64) -> Result<u64> {
        if count == 0 {
            return Ok(0);
        }
        let sql = format!("DELETE FROM {} WHERE {}", TABLE, conditions.sql());
        conditions.bind(self.client.query(&sql)).execute().await?;
        Ok(count)
    }
}

#[async_trait]
impl LogRepository for ClickhouseLogRepository {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_entries = r#"
CREATE TABLE IF NOT EXISTS log_entries (
    id UInt64,
    game LowCardinality(String),
    player_id String,
    event_type String,
    client_timestamp Nullable(Int64),
    server_timestamp DateTime64(3, 'UTC'),
    data String
) ENGINE = MergeTree
ORDER BY (game, server_timestamp, id)
"#;
        self.client.query(create_entries).execute().await?;
        Ok(())
    }

    async fn ensure_indexes(&self) -> Result<()> {
        if self.indexes_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        // The sorting key already covers (game, server_timestamp).
        let statements = [
            "ALTER TABLE log_entries ADD INDEX IF NOT EXISTS idx_server_timestamp server_timestamp TYPE minmax GRANULARITY 1",
            "ALTER TABLE log_entries ADD INDEX IF NOT EXISTS idx_player_id player_id TYPE bloom_filter GRANULARITY 4",
            "ALTER TABLE log_entries ADD INDEX IF NOT EXISTS idx_event_type event_type TYPE bloom_filter GRANULARITY 4",
        ];
        for statement in statements {
            self.client.query(statement).execute().await?;
        }
        if !self.indexes_ready.swap(true, Ordering::AcqRel) {
            info!("log entry indexes ensured");
        }
        Ok(())
    }

    async fn insert_entries(&self, entries: Vec<NewLogEntry>) -> Result<Vec<LogEntry>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let stored = stamp_batch(self.ids.next_block(entries.len()), entries);
        let rows = stored
            .iter()
            .map(LogRow::from_entry)
            .collect::<Result<Vec<_>>>()?;

        // One INSERT statement per call; ClickHouse applies it as a single block.
        let mut insert = self.client.insert(TABLE)?;
        for row in &rows {
            insert.write(row).await?;
        }
        insert.end().await?;
        Ok(stored)
    }

    async fn find_entries(&self, query: &EntryQuery) -> Result<Vec<LogEntry>> {
        let mut conditions = Conditions::from_filter(&query.filter);
        match query.id_bound {
            Some(IdBound::LessThan(id)) => conditions.push("id < ?", BindValue::U64(id.value())),
            Some(IdBound::GreaterThan(id)) => {
                conditions.push("id > ?", BindValue::U64(id.value()))
            }
            None => {}
        }
        let direction = query.order.sql();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY server_timestamp {}, id {}",
            COLUMNS,
            TABLE,
            conditions.sql(),
            direction,
            direction
        );
        match (query.limit, query.offset) {
            (Some(limit), offset) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (None, 0) => {}
            (None, offset) => sql.push_str(&format!(" LIMIT {} OFFSET {}", u64::MAX, offset)),
        }

        let rows = conditions
            .bind(self.client.query(&sql))
            .fetch_all::<LogRow>()
            .await?;
        Ok(rows.into_iter().map(LogRow::into_entry).collect())
    }

    async fn count_entries(&self, filter: &LogFilter) -> Result<u64> {
        self.count_where(Conditions::from_filter(filter)).await
    }

    async fn distinct_games(&self) -> Result<Vec<String>> {
        let sql = format!("SELECT DISTINCT game FROM {} ORDER BY game", TABLE);
        let games = self.client.query(&sql).fetch_all::<String>().await?;
        Ok(games)
    }

    async fn group_count(&self, query: &FacetQuery) -> Result<FacetCounts> {
        let column = Self::facet_column(query.dimension);

        let conditions = Self::facet_conditions(query);
        let total_sql = format!(
            "SELECT uniqExact({}) FROM {} WHERE {}",
            column,
            TABLE,
            conditions.sql()
        );
        let total: u64 = conditions
            .bind(self.client.query(&total_sql))
            .fetch_one()
            .await?;

        let conditions = Self::facet_conditions(query);
        let page_sql = format!(
            "SELECT {} AS value, count() AS cnt FROM {} WHERE {} GROUP BY value ORDER BY cnt DESC, value ASC LIMIT {} OFFSET {}",
            column,
            TABLE,
            conditions.sql(),
            query.page_size,
            query.skip()
        );
        let rows = conditions
            .bind(self.client.query(&page_sql))
            .fetch_all::<(String, u64)>()
            .await?;

        Ok(FacetCounts {
            items: rows
                .into_iter()
                .map(|(value, count)| FacetCount { value, count })
                .collect(),
            total,
        })
    }

    async fn delete_entry(&self, game: &str, id: LogId) -> Result<u64> {
        let conditions = || {
            let mut conditions = Conditions::from_filter(&LogFilter::for_game(game));
            conditions.push("id = ?", BindValue::U64(id.value()));
            conditions
        };
        let count = self.count_where(conditions()).await?;
        self.delete_where(conditions(), count).await
    }

    async fn delete_player_entries(&self, game: &str, player: &PlayerFilter) -> Result<u64> {
        if *player == PlayerFilter::Any {
            anyhow::bail!("refusing to delete by player without a player filter");
        }
        let filter = LogFilter::for_game(game).with_player(player.clone());
        let count = self.count_where(Conditions::from_filter(&filter)).await?;
        self.delete_where(Conditions::from_filter(&filter), count).await
    }

    async fn delete_game_entries(&self, game: &str) -> Result<u64> {
        let filter = LogFilter::for_game(game);
        let count = self.count_where(Conditions::from_filter(&filter)).await?;
        self.delete_where(Conditions::from_filter(&filter), count).await
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn filter_conditions_bind_in_placeholder_order() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let filter = LogFilter::for_game("mhs")
            .with_player(PlayerFilter::Missing)
            .with_event_type(Some("start".to_string()))
            .with_time_range(Some(start), None);
        let conditions = Conditions::from_filter(&filter);
        assert_eq!(
            conditions.sql(),
            "game = ? AND player_id = '' AND event_type = ? AND server_timestamp >= fromUnixTimestamp64Milli(toInt64(?), 'UTC')"
        );
        assert_eq!(conditions.binds.len(), 3);
        assert!(matches!(conditions.binds[2], BindValue::I64(ms) if ms == start.timestamp_millis()));
    }

    #[test]
    fn unfiltered_conditions_match_everything() {
        assert_eq!(Conditions::from_filter(&LogFilter::all_games()).sql(), "1");
    }

    #[test]
    fn row_round_trip_restores_empty_buckets_as_none() {
        let row = LogRow {
            id: 9,
            game: "mhs".to_string(),
            player_id: String::new(),
            event_type: "start".to_string(),
            client_timestamp: Some(1_700_000_000_000),
            server_timestamp: chrono_to_offset(
                Utc.timestamp_millis_opt(1_700_000_000_500).unwrap(),
            ),
            data: r#"{"level":3}"#.to_string(),
        };
        let entry = row.into_entry();
        assert_eq!(entry.player_id, None);
        assert_eq!(entry.event_type.as_deref(), Some("start"));
        assert_eq!(entry.server_timestamp.timestamp_millis(), 1_700_000_000_500);
        assert_eq!(
            entry.client_timestamp.map(|ts| ts.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert_eq!(entry.data["level"], serde_json::json!(3));
    }

    #[test]
    fn out_of_range_client_timestamp_reads_back_as_none() {
        let row = LogRow {
            id: 10,
            game: "mhs".to_string(),
            player_id: "p1".to_string(),
            event_type: String::new(),
            client_timestamp: Some(i64::MAX),
            server_timestamp: chrono_to_offset(
                Utc.timestamp_millis_opt(1_700_000_000_500).unwrap(),
            ),
            data: "{}".to_string(),
        };
        let entry = row.into_entry();
        assert_eq!(entry.client_timestamp, None);
        assert_eq!(entry.player_id.as_deref(), Some("p1"));
    }
}
