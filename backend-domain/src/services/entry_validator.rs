// Entry validator
// Classifies a submission as single or batch and normalises it into NewLogEntry values

use serde_json::{Map, Value};

use crate::entities::log_entry::{
    NewLogEntry, FIELD_CLIENT_TIMESTAMP, FIELD_EVENT_TYPE, FIELD_GAME, FIELD_ID,
    FIELD_LEGACY_ID, FIELD_LEGACY_TIMESTAMP, FIELD_PLAYER_ID, FIELD_SERVER_TIMESTAMP,
};
use crate::error::IngestError;
use crate::utils::parse_client_timestamp;
use crate::value_objects::GameId;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
const FIELD_ENTRIES: &str = "entries";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Single,
    Batch,
}

#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub kind: SubmissionKind,
    pub game: GameId,
    pub entries: Vec<NewLogEntry>,
}

#[derive(Debug, Clone)]
pub struct EntryValidator {
    max_batch_size: usize,
}

impl Default for EntryValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_SIZE)
    }
}

impl EntryValidator {
    pub fn new(max_batch_size: usize) -> Self {
        let max_batch_size = if max_batch_size == 0 {
            DEFAULT_MAX_BATCH_SIZE
        } else {
            max_batch_size
        };
        Self { max_batch_size }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn validate_bytes(&self, body: &[u8]) -> Result<ValidatedSubmission, IngestError> {
        let payload: Value = serde_json::from_slice(body).map_err(|_| IngestError::InvalidJson)?;
        self.validate(payload)
    }

    pub fn validate(&self, payload: Value) -> Result<ValidatedSubmission, IngestError> {
        let Value::Object(mut raw) = payload else {
            return Err(IngestError::InvalidJson);
        };
        let game = parse_game(raw.get(FIELD_GAME))?;

        if matches!(raw.get(FIELD_ENTRIES), Some(Value::Array(_))) {
            let Some(Value::Array(elements)) = raw.remove(FIELD_ENTRIES) else {
                return Err(IngestError::InvalidJson);
            };
            let entries = self.normalize_batch(&game, elements)?;
            return Ok(ValidatedSubmission {
                kind: SubmissionKind::Batch,
                game,
                entries,
            });
        }

        raw.remove(FIELD_GAME);
        let entry = normalize_entry(&game, raw)?;
        Ok(ValidatedSubmission {
            kind: SubmissionKind::Single,
            game,
            entries: vec![entry],
        })
    }

    fn normalize_batch(
        &self,
        game: &GameId,
        elements: Vec<Value>,
    ) -> Result<Vec<NewLogEntry>, IngestError> {
        if elements.is_empty() {
            return Err(IngestError::EmptyBatch);
        }
        if elements.len() > self.max_batch_size {
            return Err(IngestError::BatchTooLarge {
                size: elements.len(),
                max: self.max_batch_size,
            });
        }
        elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| match element {
                Value::Object(fields) => normalize_entry(game, fields)
                    .map_err(|_| IngestError::InvalidEntry { index }),
                _ => Err(IngestError::InvalidEntry { index }),
            })
            .collect()
    }
}

fn parse_game(value: Option<&Value>) -> Result<GameId, IngestError> {
    match value {
        Some(Value::String(raw)) => GameId::parse(raw),
        _ => Err(IngestError::MissingGame),
    }
}

fn normalize_entry(game: &GameId, mut fields: Map<String, Value>) -> Result<NewLogEntry, IngestError> {
    for key in [FIELD_ID, FIELD_LEGACY_ID, FIELD_GAME, FIELD_SERVER_TIMESTAMP] {
        fields.remove(key);
    }
    let player_id = take_text(&mut fields, FIELD_PLAYER_ID)?;
    let event_type = take_text(&mut fields, FIELD_EVENT_TYPE)?;

    // `clientTimestamp` wins over `timestamp`; anything not taken stays in data.
    let mut client_timestamp = None;
    let mut leftovers = Vec::new();
    for key in [FIELD_CLIENT_TIMESTAMP, FIELD_LEGACY_TIMESTAMP] {
        match fields.remove(key) {
            None | Some(Value::Null) => {}
            Some(value) => match parse_client_timestamp(&value) {
                Some(ts) if client_timestamp.is_none() => client_timestamp = Some(ts),
                _ => leftovers.push((key, value)),
            },
        }
    }
    for (key, value) in leftovers {
        fields.insert(key.to_string(), value);
    }

    Ok(NewLogEntry {
        game: game.clone(),
        player_id,
        event_type,
        client_timestamp,
        data: fields,
    })
}

fn take_text(
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, IngestError> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(_) => Err(IngestError::InvalidField { field }),
    }
}
