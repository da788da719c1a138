// Log entry identifier and its generator

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Store-assigned entry id. Strictly increasing in insertion order, which makes it
/// both the primary key and the pagination cursor. Rendered as 16 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogId(u64);

impl LogId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parses a cursor/id string. Anything that is not 1..=16 hex digits yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > 16 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(raw, 16).ok().map(Self)
    }

    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }

    /// The clock reading the id was minted from, truncated to milliseconds.
    pub fn timestamp(self) -> DateTime<Utc> {
        let millis = i64::try_from(self.0 / 1_000).unwrap_or(i64::MAX);
        Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
    }

    /// The id `offset` places after this one.
    pub fn offset(self, offset: u64) -> Self {
        Self(self.0.saturating_add(offset))
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for LogId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("invalid log id '{}'", s))
    }
}

impl Serialize for LogId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for LogId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid log id '{}'", raw)))
    }
}

/// Hands out ids from a monotonic microsecond clock: `max(now_us, last + 1)`.
#[derive(Debug, Default)]
pub struct LogIdGenerator {
    last: AtomicU64,
}

impl LogIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the floor so later ids are greater than `id` (used to resume after restart).
    pub fn observe(&self, id: LogId) {
        self.last.fetch_max(id.value(), Ordering::SeqCst);
    }

    pub fn next_id(&self) -> LogId {
        self.next_block(1)
    }

    /// Reserves `count` consecutive ids and returns the first one.
    pub fn next_block(&self, count: usize) -> LogId {
        let span = u64::try_from(count.max(1)).unwrap_or(u64::MAX) - 1;
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default();
        let first = |last: u64| last.saturating_add(1).max(now);
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(first(last).saturating_add(span))
            })
            .unwrap_or_else(|last| last);
        LogId(first(prev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn ids_render_as_fixed_width_hex() {
        let id = LogId::new(0xab);
        assert_eq!(id.to_string(), "00000000000000ab");
        assert_eq!(LogId::parse("00000000000000ab"), Some(id));
        assert_eq!(LogId::parse("AB"), Some(id));
    }

    #[test]
    fn malformed_ids_parse_to_none() {
        assert_eq!(LogId::parse(""), None);
        assert_eq!(LogId::parse("zz"), None);
        assert_eq!(LogId::parse("65a1f0c2e4b0a1b2c3d4e5f6"), None);
        assert_eq!(LogId::parse("-1"), None);
    }

    #[test]
    fn generator_is_strictly_increasing() {
        let generator = LogIdGenerator::new();
        let mut last = generator.next_id();
        for _ in 0..10_000 {
            let next = generator.next_id();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn generator_respects_observed_floor() {
        let generator = LogIdGenerator::new();
        let far_future = LogId::new(u64::MAX / 2);
        generator.observe(far_future);
        assert_eq!(generator.next_id(), LogId::new(u64::MAX / 2 + 1));
    }

    #[test]
    fn blocks_are_contiguous_and_do_not_overlap() {
        let generator = LogIdGenerator::new();
        let floor = LogId::new(u64::MAX / 4);
        generator.observe(floor);
        let first = generator.next_block(3);
        assert_eq!(first, floor.offset(1));
        assert_eq!(generator.next_id(), floor.offset(4));
        assert_eq!(generator.next_block(0), floor.offset(5));
    }

    #[test]
    fn id_timestamp_is_the_minting_millisecond() {
        let id = LogId::new(1_767_225_600_123_456);
        assert_eq!(id.timestamp().timestamp_millis(), 1_767_225_600_123);
        let generator = LogIdGenerator::new();
        let before = Utc::now().timestamp_millis();
        let minted = generator.next_id().timestamp().timestamp_millis();
        assert!(minted >= before && minted <= Utc::now().timestamp_millis());
    }

    #[test]
    fn generator_never_repeats_across_threads() {
        let generator = Arc::new(LogIdGenerator::new());
        let handles = (0..4)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || (0..2_000).map(|_| generator.next_id()).collect::<Vec<_>>())
            })
            .collect::<Vec<_>>();
        let mut all = handles
            .into_iter()
            .flat_map(|handle| handle.join().expect("join"))
            .collect::<Vec<_>>();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
