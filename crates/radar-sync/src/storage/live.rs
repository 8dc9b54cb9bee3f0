//! Live queries over the cache.
//!
//! A [`LiveQuery`] holds the latest result of a query and a background task
//! that re-runs it whenever a write to its table commits (and, for
//! [`CacheStore::watch_query`], whenever its key changes). A new result is
//! only emitted when it differs from the previous one.

use std::future::Future;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::db::{CacheStore, DatabaseError};
use super::models::Table;

/// Observable query result. Dropping the handle stops the background task.
#[derive(Debug)]
pub struct LiveQuery<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T: Clone> LiveQuery<T> {
    /// Latest emitted result.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next emitted result.
    ///
    /// Results emitted since the last call are coalesced into the newest
    /// one. Returns `None` once the query has stopped.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop observing.
    pub fn cancel(self) {
        drop(self);
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl CacheStore {
    /// Observe `query` over `table`.
    ///
    /// The initial result is computed before this returns; a failing query
    /// starts from `T::default()`.
    pub async fn subscribe<T, F, Fut>(&self, table: Table, query: F) -> LiveQuery<T>
    where
        T: Clone + PartialEq + Default + Send + Sync + 'static,
        F: Fn(Self) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DatabaseError>> + Send + 'static,
    {
        let (_key_tx, key_rx) = watch::channel(());
        self.watch_query(table, key_rx, move |store, ()| query(store))
            .await
    }

    /// Observe `query` over `table`, parameterised by the value in `key`.
    ///
    /// The query re-runs when `table` is invalidated or `key` changes. Once
    /// the key's sender is gone the last key stays in effect.
    pub async fn watch_query<K, T, F, Fut>(
        &self,
        table: Table,
        mut key: watch::Receiver<K>,
        query: F,
    ) -> LiveQuery<T>
    where
        K: Clone + Send + Sync + 'static,
        T: Clone + PartialEq + Default + Send + Sync + 'static,
        F: Fn(Self, K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DatabaseError>> + Send + 'static,
    {
        // Subscribe before the first run so no commit after it is missed.
        let mut changes = self.changes();
        let first_key = key.borrow_and_update().clone();
        let initial = run_query(&query, self.clone(), first_key, table)
            .await
            .unwrap_or_default();
        let (tx, rx) = watch::channel(initial);

        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut key_open = true;
            loop {
                tokio::select! {
                    changed = key.changed(), if key_open => {
                        if changed.is_err() {
                            key_open = false;
                            continue;
                        }
                    }
                    event = changes.recv() => match event {
                        Ok(touched) if touched == table => {}
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(table = table.as_str(), skipped, "Live query lagged, re-running");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    () = tx.closed() => break,
                }

                let current_key = key.borrow_and_update().clone();
                if let Some(result) = run_query(&query, store.clone(), current_key, table).await {
                    tx.send_if_modified(|value| {
                        if *value == result {
                            false
                        } else {
                            *value = result;
                            true
                        }
                    });
                }
            }
            debug!(table = table.as_str(), "Live query stopped");
        });

        LiveQuery { rx, task }
    }
}

/// Run one evaluation; failures are logged and yield `None` so the last
/// result stays in place.
async fn run_query<K, T, F, Fut>(query: &F, store: CacheStore, key: K, table: Table) -> Option<T>
where
    F: Fn(CacheStore, K) -> Fut,
    Fut: Future<Output = Result<T, DatabaseError>>,
{
    match query(store, key).await {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(table = table.as_str(), error = %e, "Live query failed");
            None
        }
    }
}
