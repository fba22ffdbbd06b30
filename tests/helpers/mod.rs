#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use chronos::{
    App,
    config::{Config, DatabaseConfig, ObservabilityConfig, PlanningConfig, SyncConfig, UserConfig},
};
use chronos_shared::FixedClock;
use chronos_store::SqliteStore;
use time::OffsetDateTime;

pub fn test_config(path: &Path, uid: Option<&str>) -> Config {
    Config {
        database: DatabaseConfig {
            url: format!("sqlite:{}", path.to_string_lossy()),
            max_connections: 2,
        },
        observability: ObservabilityConfig::default(),
        user: UserConfig {
            id: uid.map(str::to_owned),
            ..Default::default()
        },
        sync: SyncConfig::default(),
        planning: PlanningConfig::default(),
    }
}

/// App over a migrated SQLite file with a frozen clock.
pub async fn setup_app(path: &Path, uid: Option<&str>, now: OffsetDateTime) -> anyhow::Result<App> {
    let config = test_config(path, uid);
    let write_db = chronos::db::create_write_pool(&config.database.url).await?;
    chronos::db::migrate(&write_db).await?;
    let read_db =
        chronos::db::create_read_pool(&config.database.url, config.database.max_connections)
            .await?;

    Ok(App::new(
        &config,
        Arc::new(SqliteStore::new(read_db, write_db)),
        Arc::new(FixedClock(now)),
    ))
}
