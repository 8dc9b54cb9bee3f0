//! Row types for the cache tables and their conversion to domain records.

use radar_core::db::from_unix_millis;
use radar_core::model::{Asteroid, PictureOfDay, parse_date};

use super::db::DatabaseError;

/// Cached table a write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Asteroids,
    PictureOfDay,
}

impl Table {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asteroids => "asteroids",
            Self::PictureOfDay => "picture_of_day",
        }
    }
}

/// Asteroid record as stored in the `asteroids` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AsteroidRow {
    pub id: i64,
    pub codename: String,
    pub close_approach_date: String,
    pub absolute_magnitude: f64,
    pub estimated_diameter: f64,
    pub relative_velocity: f64,
    pub distance_from_earth: f64,
    pub is_potentially_hazardous: bool,
}

impl TryFrom<AsteroidRow> for Asteroid {
    type Error = DatabaseError;

    fn try_from(row: AsteroidRow) -> Result<Self, Self::Error> {
        let close_approach_date = parse_date(&row.close_approach_date).ok_or_else(|| {
            DatabaseError::Decode(format!(
                "asteroid {} has invalid close approach date '{}'",
                row.id, row.close_approach_date
            ))
        })?;
        Ok(Self {
            id: row.id,
            codename: row.codename,
            close_approach_date,
            absolute_magnitude: row.absolute_magnitude,
            estimated_diameter: row.estimated_diameter,
            relative_velocity: row.relative_velocity,
            distance_from_earth: row.distance_from_earth,
            is_potentially_hazardous: row.is_potentially_hazardous,
        })
    }
}

/// Picture record as stored in the `picture_of_day` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PictureRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub media_type: String,
    pub explanation: Option<String>,
    pub hd_url: Option<String>,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl TryFrom<PictureRow> for PictureOfDay {
    type Error = DatabaseError;

    fn try_from(row: PictureRow) -> Result<Self, Self::Error> {
        Ok(Self {
            title: row.title,
            url: row.url,
            media_type: row.media_type,
            explanation: row.explanation,
            hd_url: row.hd_url,
            created_at: from_unix_millis(row.created_at)?,
        })
    }
}
