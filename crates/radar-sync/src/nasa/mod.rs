//! NASA open API integration.
//!
//! Provides a reqwest-based client for the NeoWs feed and the astronomy
//! picture of the day, plus the [`NeoApi`] seam the repository is generic
//! over.

mod client;
pub mod types;


use async_trait::async_trait;
use chrono::NaiveDate;

pub use client::{NasaClient, NasaConfig, NasaError};
pub use types::PictureResponse;

/// Remote source of asteroid and picture data.
#[async_trait]
pub trait NeoApi: Send + Sync {
    /// Raw body of the date-keyed feed. With both bounds `None` the server
    /// picks today through today + 7 days.
    async fn fetch_asteroid_feed(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<String, NasaError>;

    async fn fetch_picture_of_day(&self) -> Result<PictureResponse, NasaError>;
}
