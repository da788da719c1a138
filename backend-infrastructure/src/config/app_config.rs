use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{DbConfig, RuntimeConfig, StorageBackend};

use crate::config::validation::{validate_page_size, validate_timeouts};

const ENV_PREFIX: &str = "GAMELOG_";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub admin_token: Option<String>,
    pub storage: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
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

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            api_token: None,
            admin_token: None,
            storage: StorageBackend::Clickhouse,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "gamelog".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            max_body_bytes: runtime.max_body_bytes,
            ingest_max_body_bytes: runtime.ingest_max_body_bytes,
            max_batch_size: runtime.max_batch_size,
            request_timeout_seconds: runtime.request_timeout_seconds,
            short_timeout_seconds: runtime.short_timeout_seconds,
            medium_timeout_seconds: runtime.medium_timeout_seconds,
            long_timeout_seconds: runtime.long_timeout_seconds,
            index_timeout_seconds: runtime.index_timeout_seconds,
            stream_buffer: runtime.stream_buffer,
            stream_keepalive_seconds: runtime.stream_keepalive_seconds,
            browse_page_size: runtime.browse_page_size,
            facet_page_size: runtime.facet_page_size,
            export_max_entries: runtime.export_max_entries,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("GAMELOG_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(Path::new(&path)).await
    }

    pub async fn load_from(file_path: &Path) -> Result<Self> {
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml_str(&content)?
        } else {
            warn!(path = %file_path.display(), "config file not found, using defaults");
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        for secret in [
            &mut self.api_token,
            &mut self.admin_token,
            &mut self.clickhouse_user,
            &mut self.clickhouse_password,
        ] {
            if secret.as_deref().map(str::trim).map_or(false, str::is_empty) {
                *secret = None;
            }
        }
        self.clickhouse_url = self.clickhouse_url.trim().trim_end_matches('/').to_string();
        self.clickhouse_database = self.clickhouse_database.trim().to_string();
        if self.stream_buffer == 0 {
            self.stream_buffer = RuntimeConfig::default().stream_buffer;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.ingest_max_body_bytes == 0 || self.ingest_max_body_bytes > self.max_body_bytes {
            return Err(anyhow!(
                "ingest_max_body_bytes must be between 1 and max_body_bytes"
            ));
        }
        if self.max_batch_size == 0 {
            return Err(anyhow!("max_batch_size must be greater than 0"));
        }
        if self.storage == StorageBackend::Clickhouse {
            if self.clickhouse_url.is_empty() {
                return Err(anyhow!("clickhouse_url must not be empty"));
            }
            if self.clickhouse_database.is_empty()
                || !backend_domain::GameId::is_valid(&self.clickhouse_database)
            {
                return Err(anyhow!("clickhouse_database must be a plain identifier"));
            }
        }
        validate_timeouts(
            self.short_timeout_seconds,
            self.medium_timeout_seconds,
            self.long_timeout_seconds,
            self.request_timeout_seconds,
        )?;
        if self.index_timeout_seconds == 0 || self.stream_keepalive_seconds == 0 {
            return Err(anyhow!(
                "index_timeout_seconds and stream_keepalive_seconds must be greater than 0"
            ));
        }
        validate_page_size("browse_page_size", self.browse_page_size)?;
        validate_page_size("facet_page_size", self.facet_page_size)?;
        if self.export_max_entries == 0 {
            return Err(anyhow!("export_max_entries must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            admin_token: self.admin_token.clone(),
            max_body_bytes: self.max_body_bytes,
            ingest_max_body_bytes: self.ingest_max_body_bytes,
            max_batch_size: self.max_batch_size,
            request_timeout_seconds: self.request_timeout_seconds,
            short_timeout_seconds: self.short_timeout_seconds,
            medium_timeout_seconds: self.medium_timeout_seconds,
            long_timeout_seconds: self.long_timeout_seconds,
            index_timeout_seconds: self.index_timeout_seconds,
            stream_buffer: self.stream_buffer,
            stream_keepalive_seconds: self.stream_keepalive_seconds,
            browse_page_size: self.browse_page_size,
            facet_page_size: self.facet_page_size,
            export_max_entries: self.export_max_entries,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            storage: self.storage,
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok());
    }

    /// `lookup` receives the key without the `GAMELOG_` prefix.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("ADMIN_TOKEN") {
            self.admin_token = Some(value);
        }
        if let Some(value) = lookup("STORAGE") {
            match StorageBackend::parse(&value) {
                Some(storage) => self.storage = storage,
                None => warn!(value = %value, "ignoring unknown GAMELOG_STORAGE"),
            }
        }
        if let Some(value) = lookup("CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Some(value) = lookup("CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Some(value) = lookup("CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Some(value) = lookup("CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Some(value) = lookup("MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(value) = lookup("INGEST_MAX_BODY_BYTES") {
            self.ingest_max_body_bytes = value.parse().unwrap_or(self.ingest_max_body_bytes);
        }
        if let Some(value) = lookup("MAX_BATCH_SIZE") {
            self.max_batch_size = value.parse().unwrap_or(self.max_batch_size);
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Some(value) = lookup("SHORT_TIMEOUT_SECONDS") {
            self.short_timeout_seconds = value.parse().unwrap_or(self.short_timeout_seconds);
        }
        if let Some(value) = lookup("MEDIUM_TIMEOUT_SECONDS") {
            self.medium_timeout_seconds = value.parse().unwrap_or(self.medium_timeout_seconds);
        }
        if let Some(value) = lookup("LONG_TIMEOUT_SECONDS") {
            self.long_timeout_seconds = value.parse().unwrap_or(self.long_timeout_seconds);
        }
        if let Some(value) = lookup("INDEX_TIMEOUT_SECONDS") {
            self.index_timeout_seconds = value.parse().unwrap_or(self.index_timeout_seconds);
        }
        if let Some(value) = lookup("STREAM_BUFFER") {
            self.stream_buffer = value.parse().unwrap_or(self.stream_buffer);
        }
        if let Some(value) = lookup("STREAM_KEEPALIVE_SECONDS") {
            self.stream_keepalive_seconds = value.parse().unwrap_or(self.stream_keepalive_seconds);
        }
        if let Some(value) = lookup("BROWSE_PAGE_SIZE") {
            self.browse_page_size = value.parse().unwrap_or(self.browse_page_size);
        }
        if let Some(value) = lookup("FACET_PAGE_SIZE") {
            self.facet_page_size = value.parse().unwrap_or(self.facet_page_size);
        }
        if let Some(value) = lookup("EXPORT_MAX_ENTRIES") {
            self.export_max_entries = value.parse().unwrap_or(self.export_max_entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.clickhouse_database, "gamelog");
        assert_eq!(config.to_runtime_config().browse_page_size, 25);
    }

    #[test]
    fn toml_fields_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
bind_addr = "0.0.0.0:8080"
storage = "memory"
api_token = "secret"
max_batch_size = 500
"#,
        )
        .expect("parse");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.max_batch_size, 500);
        assert_eq!(config.facet_page_size, 20);
    }

    #[test]
    fn overrides_apply_and_ignore_unparseable_numbers() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ADMIN_TOKEN", "admin"),
            ("STORAGE", "MEMORY"),
            ("MAX_BATCH_SIZE", "lots"),
            ("STREAM_BUFFER", "64"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.admin_token.as_deref(), Some("admin"));
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.stream_buffer, 64);
    }

    #[test]
    fn blank_tokens_normalize_to_none() {
        let mut config = AppConfig {
            api_token: Some("  ".to_string()),
            admin_token: Some(String::new()),
            ..AppConfig::default()
        };
        config.normalize();
        assert!(config.api_token.is_none());
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn validation_rejects_inconsistent_limits() {
        let config = AppConfig {
            ingest_max_body_bytes: 16 * 1024 * 1024,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            request_timeout_seconds: 30,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            browse_page_size: 500,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
