//! Asteroid Radar Core Library
//!
//! Shared functionality for Asteroid Radar components:
//! - Domain records for asteroids and the picture of the day
//! - Parsing of the date-keyed NASA NeoWs feed
//! - Configuration resolution and hierarchy
//! - `SQLite` pool helpers and common error types

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod model;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Asteroid, PictureOfDay};
