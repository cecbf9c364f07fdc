use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use crate::errors::StoreResult;
use crate::schema;

/// Handle to the relational store backing generation and export.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `url` and apply the schema.
    ///
    /// `sqlite::memory:` URLs get a single long-lived connection, since the
    /// database disappears once its last connection closes.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?;
        if is_memory_url(url) {
            Self::open(options, memory_pool_options()).await
        } else {
            Self::connect_with(options, max_connections).await
        }
    }

    /// Open a file-backed database with WAL journaling.
    pub async fn connect_with(
        options: SqliteConnectOptions,
        max_connections: u32,
    ) -> StoreResult<Self> {
        let options = options.journal_mode(SqliteJournalMode::Wal);
        let pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        Self::open(options, pool_options).await
    }

    async fn open(
        options: SqliteConnectOptions,
        pool_options: SqlitePoolOptions,
    ) -> StoreResult<Self> {
        let options = options
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(10));
        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(
            event = "store_connected",
            max_connections = store.pool.options().get_max_connections()
        );
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        schema::migrate(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn memory_pool_options() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
}
