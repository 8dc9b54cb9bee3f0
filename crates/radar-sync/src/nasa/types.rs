//! NASA API response types.
//!
//! Only the picture of the day has a uniform shape worth a typed struct; the
//! feed is handled by `radar_core::feed`.

use chrono::{DateTime, Utc};
use radar_core::PictureOfDay;
use serde::Deserialize;

/// Response of `GET /planetary/apod`.
#[derive(Debug, Clone, Deserialize)]
pub struct PictureResponse {
    pub title: String,
    pub url: String,
    pub media_type: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub hdurl: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

impl PictureResponse {
    /// Stamp the response with its ingestion time.
    pub fn into_picture(self, created_at: DateTime<Utc>) -> PictureOfDay {
        PictureOfDay {
            title: self.title,
            url: self.url,
            media_type: self.media_type,
            explanation: self.explanation,
            hd_url: self.hdurl,
            created_at,
        }
    }
}
