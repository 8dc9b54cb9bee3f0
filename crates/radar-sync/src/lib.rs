//! Asteroid Radar synchronization library.
//!
//! Offline-first sync between the NASA open APIs and a local cache:
//! - NASA NeoWs feed and picture-of-the-day client
//! - `SQLite` cache with live, invalidation-driven queries
//! - Repository that refreshes, evicts and exposes filtered read models
//! - Periodic background sync

pub mod clock;
pub mod nasa;
pub mod repository;
pub mod scheduler;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use repository::{AsteroidFilter, SyncError, SyncReport, SyncRepository};
pub use storage::{CacheStore, LiveQuery};
