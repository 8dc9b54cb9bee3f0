//! Offline-first synchronization repository.
//!
//! Reconciles the remote NASA feeds with the local cache. Refreshes write
//! through the store; readers only ever see the cache, through live queries
//! that follow store invalidations and the current [`AsteroidFilter`].

mod error;
mod filter;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use radar_core::{Asteroid, PictureOfDay, feed};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::nasa::NeoApi;
use crate::storage::{CacheStore, LiveQuery, Table};

pub use error::{SyncError, SyncErrorKind};
pub use filter::{AsteroidFilter, WEEK_SPAN_DAYS};

/// Outcome of one [`SyncRepository::sync_once`] pass.
#[derive(Debug)]
pub struct SyncReport {
    /// Asteroids written by the feed refresh.
    pub asteroids: Result<usize, SyncError>,
    pub picture: Result<(), SyncError>,
    pub evicted_asteroids: Result<u64, SyncError>,
    pub evicted_pictures: Result<u64, SyncError>,
}

impl SyncReport {
    pub const fn is_success(&self) -> bool {
        self.asteroids.is_ok()
            && self.picture.is_ok()
            && self.evicted_asteroids.is_ok()
            && self.evicted_pictures.is_ok()
    }

    /// Errors of the failed steps, labelled by step.
    pub fn failures(&self) -> Vec<(&'static str, &SyncError)> {
        [
            ("asteroids", self.asteroids.as_ref().err()),
            ("picture", self.picture.as_ref().err()),
            ("evict_asteroids", self.evicted_asteroids.as_ref().err()),
            ("evict_pictures", self.evicted_pictures.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(step, err)| err.map(|e| (step, e)))
        .collect()
    }
}

/// Repository over a remote source `A` and a clock `C`.
pub struct SyncRepository<A, C = SystemClock> {
    api: A,
    store: CacheStore,
    clock: Arc<C>,
    filter: watch::Sender<AsteroidFilter>,
}

impl<A: NeoApi> SyncRepository<A> {
    /// Repository on the system clock.
    pub fn new(store: CacheStore, api: A) -> Self {
        Self::with_clock(store, api, SystemClock)
    }
}

impl<A, C> SyncRepository<A, C>
where
    A: NeoApi,
    C: Clock + 'static,
{
    pub fn with_clock(store: CacheStore, api: A, clock: C) -> Self {
        let (filter, _) = watch::channel(AsteroidFilter::default());
        Self {
            api,
            store,
            clock: Arc::new(clock),
            filter,
        }
    }

    pub const fn store(&self) -> &CacheStore {
        &self.store
    }

    // =========================================================================
    // Refresh and eviction
    // =========================================================================

    /// Fetch the feed from today onward and insert-or-replace every record.
    ///
    /// Returns the number of asteroids written. On failure the cache is left
    /// as it was.
    pub async fn refresh_asteroids(&self) -> Result<usize, SyncError> {
        let today = self.clock.today();
        let result: Result<usize, SyncError> = async {
            let body = self.api.fetch_asteroid_feed(Some(today), None).await?;
            let asteroids = feed::parse_feed(&body)?;
            Ok(self.store.insert_asteroids(&asteroids).await?)
        }
        .await;

        match &result {
            Ok(count) => info!(count, start_date = %today, "Asteroid cache refreshed"),
            Err(e) => warn_failure("refresh_asteroids", e),
        }
        result
    }

    /// Fetch the picture of the day and store it stamped with the current time.
    pub async fn refresh_picture_of_day(&self) -> Result<(), SyncError> {
        let result: Result<PictureOfDay, SyncError> = async {
            let response = self.api.fetch_picture_of_day().await?;
            let picture = response.into_picture(self.clock.now());
            self.store.insert_picture(&picture).await?;
            Ok(picture)
        }
        .await;

        match result {
            Ok(picture) => {
                info!(
                    title = %picture.title,
                    media_type = %picture.media_type,
                    "Picture of the day refreshed"
                );
                Ok(())
            }
            Err(e) => {
                warn_failure("refresh_picture_of_day", &e);
                Err(e)
            }
        }
    }

    /// Delete asteroids whose close approach date is before today.
    pub async fn clear_old_asteroids(&self) -> Result<u64, SyncError> {
        let today = self.clock.today();
        let result = self
            .store
            .delete_asteroids_before(today)
            .await
            .map_err(SyncError::from);

        match &result {
            Ok(deleted) => debug!(deleted, cutoff = %today, "Old asteroids cleared"),
            Err(e) => warn_failure("clear_old_asteroids", e),
        }
        result
    }

    /// Delete pictures ingested before the start of today (UTC).
    pub async fn clear_old_pictures(&self) -> Result<u64, SyncError> {
        let cutoff = self.clock.start_of_today();
        let result = self
            .store
            .delete_pictures_before(cutoff)
            .await
            .map_err(SyncError::from);

        match &result {
            Ok(deleted) => debug!(deleted, %cutoff, "Old pictures cleared"),
            Err(e) => warn_failure("clear_old_pictures", e),
        }
        result
    }

    /// Both refreshes concurrently, then both evictions.
    pub async fn sync_once(&self) -> SyncReport {
        let (asteroids, picture) =
            tokio::join!(self.refresh_asteroids(), self.refresh_picture_of_day());
        let (evicted_asteroids, evicted_pictures) =
            tokio::join!(self.clear_old_asteroids(), self.clear_old_pictures());

        SyncReport {
            asteroids,
            picture,
            evicted_asteroids,
            evicted_pictures,
        }
    }

    // =========================================================================
    // Read models
    // =========================================================================

    /// Live asteroid list for the current filter.
    ///
    /// Re-runs on every filter change and every asteroid-table write. "Today"
    /// is re-read from the clock on each run.
    pub async fn asteroids(&self) -> LiveQuery<Vec<Asteroid>> {
        let clock = Arc::clone(&self.clock);
        self.store
            .watch_query(
                Table::Asteroids,
                self.filter.subscribe(),
                move |store, filter: AsteroidFilter| {
                    let today = clock.today();
                    async move { filter.query(&store, today).await }
                },
            )
            .await
    }

    /// Live view of the most recently ingested picture.
    pub async fn picture_of_day(&self) -> LiveQuery<Option<PictureOfDay>> {
        self.store
            .subscribe(Table::PictureOfDay, |store| async move {
                store.latest_picture().await
            })
            .await
    }

    /// Switch the filter feeding [`Self::asteroids`]. Setting the current
    /// filter again is a no-op.
    pub fn set_filter(&self, filter: AsteroidFilter) {
        let changed = self.filter.send_if_modified(|current| {
            if *current == filter {
                false
            } else {
                *current = filter;
                true
            }
        });
        if changed {
            debug!(%filter, "Asteroid filter changed");
        }
    }

    pub fn filter(&self) -> AsteroidFilter {
        *self.filter.borrow()
    }
}

fn warn_failure(operation: &'static str, error: &SyncError) {
    warn!(
        operation,
        kind = error.kind().as_str(),
        error = %error,
        "Sync step failed, keeping cached data"
    );
}
