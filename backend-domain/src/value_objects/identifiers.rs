// Identifier value objects

use serde::Serialize;

use crate::error::IngestError;

/// Player filter value selecting entries without a player.
pub const EMPTY_PLAYER_SENTINEL: &str = "__empty__";

/// Tenant identifier. Non-empty, restricted to `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn parse(raw: &str) -> Result<Self, IngestError> {
        if raw.is_empty() {
            return Err(IngestError::MissingGame);
        }
        if !Self::is_valid(raw) {
            return Err(IngestError::InvalidGame(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn is_valid(raw: &str) -> bool {
        !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GameId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
