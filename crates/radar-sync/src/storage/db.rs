//! Cache connection, migrations and change notification.

use std::path::Path;

use sqlx::{Pool, Sqlite};
use tokio::sync::broadcast;
use tracing::{debug, info};

pub use radar_core::db::DatabaseError;

use super::models::Table;

/// Invalidations buffered per subscriber before it observes a lag.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Handle to the local cache. Clones share the pool and the change channel.
#[derive(Debug, Clone)]
pub struct CacheStore {
    pool: Pool<Sqlite>,
    pub(super) changes: broadcast::Sender<Table>,
}

impl CacheStore {
    /// Open or create the cache at the given path.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        let pool = radar_core::db::open_pool(path).await?;
        Self::with_pool(pool).await
    }

    /// Open an in-memory cache (for testing).
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let pool = radar_core::db::open_pool_in_memory().await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: Pool<Sqlite>) -> Result<Self, DatabaseError> {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let store = Self { pool, changes };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Cache migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Subscribe to committed-write invalidations.
    pub fn changes(&self) -> broadcast::Receiver<Table> {
        self.changes.subscribe()
    }

    /// Publish an invalidation for `table`. Call only after the write commits.
    pub(crate) fn notify(&self, table: Table) {
        // No receivers is the common case outside live queries.
        let receivers = self.changes.send(table).unwrap_or(0);
        debug!(table = table.as_str(), receivers, "Cache table invalidated");
    }
}
