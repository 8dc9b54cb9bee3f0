//! `SQLite` cache for asteroids and the picture of the day.
//!
//! Every write publishes a [`Table`] invalidation after it commits; live
//! queries re-run on the invalidations for their table.

mod db;
mod live;
mod models;
mod queries;

pub use db::{CacheStore, DatabaseError};
pub use live::LiveQuery;
pub use models::*;
