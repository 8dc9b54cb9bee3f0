//! Domain records shared by the parser, the cache store and the repository.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format used on the wire and in the cache (`YYYY-MM-DD`).
///
/// Strings in this format sort lexicographically in calendar order, which is
/// what lets the store run range queries on a `TEXT` column.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A near-Earth object close approach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: i64,
    pub codename: String,
    pub close_approach_date: NaiveDate,
    pub absolute_magnitude: f64,
    /// Estimated maximum diameter in kilometers.
    pub estimated_diameter: f64,
    /// Relative velocity in kilometers per hour.
    pub relative_velocity: f64,
    /// Miss distance in kilometers.
    pub distance_from_earth: f64,
    pub is_potentially_hazardous: bool,
}

impl Asteroid {
    /// The close approach date in its stored `YYYY-MM-DD` form.
    pub fn close_approach_day(&self) -> String {
        format_date(self.close_approach_date)
    }
}

/// Astronomy picture of the day, as cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureOfDay {
    pub title: String,
    pub url: String,
    /// `"image"` or `"video"`.
    pub media_type: String,
    pub explanation: Option<String>,
    pub hd_url: Option<String>,
    /// When the record was written to the cache. Never supplied by the remote.
    pub created_at: DateTime<Utc>,
}

impl PictureOfDay {
    pub fn is_image(&self) -> bool {
        self.media_type.eq_ignore_ascii_case("image")
    }
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).ok()
}
