use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clickhouse::Client;
use tracing::info;

use backend_application::commands::spawn_index_maintenance;
use backend_application::AppState;
use backend_domain::{DbConfig, LogRepository, StorageBackend};
use backend_infrastructure::{AppConfig, ClickhouseLogRepository, MemoryLogRepository};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    /// Loads `config_path`, or `GAMELOG_CONFIG` / `./config.toml` when none is given.
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => AppConfig::load_from(path).await?,
            None => AppConfig::load().await?,
        };
        let runtime_config = config.to_runtime_config();
        let repo = open_log_store(&config.to_db_config()).await?;

        let state = AppState::new(runtime_config, repo);
        spawn_index_maintenance(&state);
        Ok(Self { state })
    }
}

async fn open_log_store(db_config: &DbConfig) -> Result<Arc<dyn LogRepository>> {
    match db_config.storage {
        StorageBackend::Memory => {
            info!("using in-memory log store");
            Ok(Arc::new(MemoryLogRepository::new()))
        }
        StorageBackend::Clickhouse => {
            let mut clickhouse = Client::default()
                .with_url(&db_config.clickhouse_url)
                .with_database(&db_config.clickhouse_database);
            if let Some(user) = &db_config.clickhouse_user {
                clickhouse = clickhouse.with_user(user);
            }
            if let Some(password) = &db_config.clickhouse_password {
                clickhouse = clickhouse.with_password(password);
            }

            let repo = ClickhouseLogRepository::new(
                clickhouse,
                db_config.clickhouse_database.clone(),
            );
            repo.ensure_schema().await?;
            repo.seed_id_generator().await?;
            info!(
                url = %db_config.clickhouse_url,
                database = %db_config.clickhouse_database,
                "clickhouse log store ready"
            );
            Ok(Arc::new(repo))
        }
    }
}
