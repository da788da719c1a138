use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::{
    compare_facets, EntryQuery, FacetCount, FacetCounts, FacetQuery, LogEntry, LogFilter, LogId,
    LogIdGenerator, LogRepository, NewLogEntry, PlayerFilter, stamp_batch,
};

/// Process-local store used for tests and `storage = "memory"` deployments.
#[derive(Default)]
pub struct MemoryLogRepository {
    entries: RwLock<BTreeMap<LogId, LogEntry>>,
    ids: LogIdGenerator,
    index_runs: AtomicU64,
}

impl MemoryLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times index maintenance has run.
    pub fn index_runs(&self) -> u64 {
        self.index_runs.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn remove_matching(&self, filter: &LogFilter) -> u64 {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !filter.matches(entry));
        (before - entries.len()) as u64
    }
}

#[async_trait]
impl LogRepository for MemoryLogRepository {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_indexes(&self) -> Result<()> {
        self.index_runs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn insert_entries(&self, entries: Vec<NewLogEntry>) -> Result<Vec<LogEntry>> {
        let mut store = self.entries.write().await;
        let stored = stamp_batch(self.ids.next_block(entries.len()), entries);
        for entry in &stored {
            store.insert(entry.id, entry.clone());
        }
        Ok(stored)
    }

    async fn find_entries(&self, query: &EntryQuery) -> Result<Vec<LogEntry>> {
        let store = self.entries.read().await;
        let mut matched = store
            .values()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| query.order.compare(a, b));
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(query.offset).take(limit).collect())
    }

    async fn count_entries(&self, filter: &LogFilter) -> Result<u64> {
        let store = self.entries.read().await;
        Ok(store.values().filter(|entry| filter.matches(entry)).count() as u64)
    }

    async fn distinct_games(&self) -> Result<Vec<String>> {
        let store = self.entries.read().await;
        let mut games = store
            .values()
            .map(|entry| entry.game.clone())
            .collect::<Vec<_>>();
        games.sort();
        games.dedup();
        Ok(games)
    }

    async fn group_count(&self, query: &FacetQuery) -> Result<FacetCounts> {
        let store = self.entries.read().await;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for entry in store.values().filter(|entry| entry.game == query.game) {
            let bucket = query.dimension.bucket(entry);
            if query.matches_search(bucket) {
                *counts.entry(bucket).or_default() += 1;
            }
        }
        let mut items = counts
            .into_iter()
            .map(|(value, count)| FacetCount {
                value: value.to_string(),
                count,
            })
            .collect::<Vec<_>>();
        items.sort_by(compare_facets);
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(query.skip())
            .take(query.page_size)
            .collect();
        Ok(FacetCounts { items, total })
    }

    async fn delete_entry(&self, game: &str, id: LogId) -> Result<u64> {
        let mut store = self.entries.write().await;
        match store.get(&id) {
            Some(entry) if entry.game == game => {
                store.remove(&id);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_player_entries(&self, game: &str, player: &PlayerFilter) -> Result<u64> {
        if *player == PlayerFilter::Any {
            anyhow::bail!("refusing to delete by player without a player filter");
        }
        let filter = LogFilter::for_game(game).with_player(player.clone());
        Ok(self.remove_matching(&filter).await)
    }

    async fn delete_game_entries(&self, game: &str) -> Result<u64> {
        Ok(self.remove_matching(&LogFilter::for_game(game)).await)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
