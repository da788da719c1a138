// Log entry entity
// A fixed known-field envelope plus an open attribute map

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value_objects::{GameId, LogId};

pub const FIELD_ID: &str = "id";
pub const FIELD_LEGACY_ID: &str = "_id";
pub const FIELD_GAME: &str = "game";
pub const FIELD_PLAYER_ID: &str = "playerId";
pub const FIELD_EVENT_TYPE: &str = "eventType";
pub const FIELD_CLIENT_TIMESTAMP: &str = "clientTimestamp";
pub const FIELD_LEGACY_TIMESTAMP: &str = "timestamp";
pub const FIELD_SERVER_TIMESTAMP: &str = "serverTimestamp";

/// Top-level keys that never end up in `data`.
pub const KNOWN_FIELDS: [&str; 8] = [
    FIELD_ID,
    FIELD_LEGACY_ID,
    FIELD_GAME,
    FIELD_PLAYER_ID,
    FIELD_EVENT_TYPE,
    FIELD_CLIENT_TIMESTAMP,
    FIELD_LEGACY_TIMESTAMP,
    FIELD_SERVER_TIMESTAMP,
];

pub fn is_known_field(key: &str) -> bool {
    KNOWN_FIELDS.contains(&key)
}

/// A validated entry that has not been persisted yet. The store stamps the id and
/// `server_timestamp` together when it accepts the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub game: GameId,
    pub player_id: Option<String>,
    pub event_type: Option<String>,
    pub client_timestamp: Option<DateTime<Utc>>,
    pub data: Map<String, Value>,
}

impl NewLogEntry {
    pub fn into_entry(self, id: LogId, server_timestamp: DateTime<Utc>) -> LogEntry {
        LogEntry {
            id,
            game: self.game.into_inner(),
            player_id: self.player_id,
            event_type: self.event_type,
            client_timestamp: self.client_timestamp,
            server_timestamp,
            data: self.data,
        }
    }
}

/// Stamps a batch the way both stores do: consecutive ids from `first`, all sharing
/// the millisecond `first` was minted at.
pub fn stamp_batch(first: LogId, entries: Vec<NewLogEntry>) -> Vec<LogEntry> {
    let server_timestamp = first.timestamp();
    entries
        .into_iter()
        .zip(0u64..)
        .map(|(entry, offset)| entry.into_entry(first.offset(offset), server_timestamp))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: LogId,
    pub game: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<DateTime<Utc>>,
    pub server_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl LogEntry {
    /// Grouping key for the player dimension; missing, null and empty all map to "".
    pub fn player_bucket(&self) -> &str {
        self.player_id.as_deref().unwrap_or_default()
    }

    pub fn event_type_bucket(&self) -> &str {
        self.event_type.as_deref().unwrap_or_default()
    }

    pub fn to_event(&self) -> LogEvent {
        LogEvent {
            id: self.id,
            game: self.game.clone(),
            player_id: self.player_id.clone(),
            event_type: self.event_type.clone(),
            server_timestamp: self.server_timestamp,
            data: self.data.clone(),
        }
    }

    /// Flat document: known fields at the top level with the open attributes merged in.
    /// Attributes never shadow a known field.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert(FIELD_ID.to_string(), Value::String(self.id.to_hex()));
        doc.insert(FIELD_GAME.to_string(), Value::String(self.game.clone()));
        if let Some(player_id) = &self.player_id {
            doc.insert(FIELD_PLAYER_ID.to_string(), Value::String(player_id.clone()));
        }
        if let Some(event_type) = &self.event_type {
            doc.insert(FIELD_EVENT_TYPE.to_string(), Value::String(event_type.clone()));
        }
        if let Some(ts) = self.client_timestamp {
            doc.insert(FIELD_CLIENT_TIMESTAMP.to_string(), Value::String(ts.to_rfc3339()));
        }
        doc.insert(
            FIELD_SERVER_TIMESTAMP.to_string(),
            Value::String(self.server_timestamp.to_rfc3339()),
        );
        for (key, value) in &self.data {
            if !doc.contains_key(key) {
                doc.insert(key.clone(), value.clone());
            }
        }
        doc
    }
}

/// Ordering by (`server_timestamp`, `id`); `id` breaks ties between entries of one batch.
pub fn compare_chronological(a: &LogEntry, b: &LogEntry) -> Ordering {
    a.server_timestamp
        .cmp(&b.server_timestamp)
        .then_with(|| a.id.cmp(&b.id))
}

/// Live-viewer projection of an accepted entry. Not persisted, not replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub id: LogId,
    pub game: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    pub server_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_entry() -> LogEntry {
        let mut data = Map::new();
        data.insert("level".to_string(), json!(5));
        data.insert("game".to_string(), json!("shadowed"));
        LogEntry {
            id: LogId::new(42),
            game: "mhs".to_string(),
            player_id: Some("p1".to_string()),
            event_type: None,
            client_timestamp: None,
            server_timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            data,
        }
    }

    #[test]
    fn document_flattens_data_without_shadowing_known_fields() {
        let doc = sample_entry().to_document();
        assert_eq!(doc["id"], json!("000000000000002a"));
        assert_eq!(doc["game"], json!("mhs"));
        assert_eq!(doc["playerId"], json!("p1"));
        assert_eq!(doc["level"], json!(5));
        assert!(!doc.contains_key("eventType"));
    }

    #[test]
    fn entry_serializes_with_camel_case_and_omits_empty_fields() {
        let value = serde_json::to_value(sample_entry()).expect("serialize");
        assert_eq!(value["playerId"], json!("p1"));
        assert_eq!(value["id"], json!("000000000000002a"));
        assert!(value.get("eventType").is_none());
        assert!(value.get("clientTimestamp").is_none());
        assert_eq!(value["data"]["level"], json!(5));
    }

    #[test]
    fn event_projection_keeps_live_fields() {
        let entry = sample_entry();
        let event = entry.to_event();
        assert_eq!(event.id, entry.id);
        assert_eq!(event.player_id.as_deref(), Some("p1"));
        assert_eq!(event.server_timestamp, entry.server_timestamp);
        assert_eq!(event.data, entry.data);
    }

    #[test]
    fn stamped_batches_share_a_timestamp_and_follow_id_order() {
        let new_entry = || NewLogEntry {
            game: GameId::parse("mhs").unwrap(),
            player_id: None,
            event_type: None,
            client_timestamp: None,
            data: Map::new(),
        };
        let first = LogId::new(1_767_225_600_123_999);
        let batch = stamp_batch(first, vec![new_entry(), new_entry()]);
        assert_eq!(batch[0].id, first);
        assert_eq!(batch[1].id, LogId::new(1_767_225_600_124_000));
        assert_eq!(batch[0].server_timestamp, batch[1].server_timestamp);
        assert_eq!(batch[1].server_timestamp.timestamp_millis(), 1_767_225_600_123);

        let later = stamp_batch(first.offset(2), vec![new_entry()]);
        assert_eq!(compare_chronological(&batch[1], &later[0]), Ordering::Less);
        assert!(later[0].server_timestamp > batch[1].server_timestamp);
    }

    #[test]
    fn chronological_order_breaks_ties_by_id() {
        let a = sample_entry();
        let mut b = sample_entry();
        b.id = LogId::new(43);
        assert_eq!(compare_chronological(&a, &b), Ordering::Less);
        b.server_timestamp = a.server_timestamp - chrono::Duration::seconds(1);
        assert_eq!(compare_chronological(&a, &b), Ordering::Greater);
    }
}
