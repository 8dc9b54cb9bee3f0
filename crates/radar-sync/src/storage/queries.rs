//! Cache queries.

use chrono::{DateTime, NaiveDate, Utc};
use radar_core::db::to_unix_millis;
use radar_core::model::{Asteroid, PictureOfDay, format_date};

use super::db::{CacheStore, DatabaseError};
use super::models::{AsteroidRow, PictureRow, Table};

fn decode_asteroids(rows: Vec<AsteroidRow>) -> Result<Vec<Asteroid>, DatabaseError> {
    rows.into_iter().map(Asteroid::try_from).collect()
}

impl CacheStore {
    // =========================================================================
    // Asteroid queries
    // =========================================================================

    /// Every cached asteroid, ordered by close approach date ascending.
    pub async fn all_asteroids(&self) -> Result<Vec<Asteroid>, DatabaseError> {
        let rows = sqlx::query_as::<_, AsteroidRow>(
            "SELECT * FROM asteroids ORDER BY close_approach_date ASC, id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        decode_asteroids(rows)
    }

    /// Asteroids approaching on exactly `date`.
    pub async fn asteroids_on(&self, date: NaiveDate) -> Result<Vec<Asteroid>, DatabaseError> {
        let rows = sqlx::query_as::<_, AsteroidRow>(
            "SELECT * FROM asteroids WHERE close_approach_date = ? ORDER BY id ASC",
        )
        .bind(format_date(date))
        .fetch_all(self.pool())
        .await?;

        decode_asteroids(rows)
    }

    /// Asteroids approaching between `start` and `end`, both inclusive.
    pub async fn asteroids_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Asteroid>, DatabaseError> {
        // ISO dates compare lexicographically in calendar order.
        let rows = sqlx::query_as::<_, AsteroidRow>(
            r"
            SELECT * FROM asteroids
            WHERE close_approach_date >= ? AND close_approach_date <= ?
            ORDER BY close_approach_date ASC, id ASC
            ",
        )
        .bind(format_date(start))
        .bind(format_date(end))
        .fetch_all(self.pool())
        .await?;

        decode_asteroids(rows)
    }

    /// Get a cached asteroid by its feed id.
    pub async fn get_asteroid(&self, id: i64) -> Result<Option<Asteroid>, DatabaseError> {
        sqlx::query_as::<_, AsteroidRow>("SELECT * FROM asteroids WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(Asteroid::try_from)
            .transpose()
    }

    pub async fn asteroid_count(&self) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM asteroids")
            .fetch_one(self.pool())
            .await?;
        Ok(count.0)
    }

    /// Insert a batch of asteroids in one transaction.
    ///
    /// A row whose id is already cached is replaced wholesale. Observers are
    /// notified once, after the commit; an empty batch touches nothing.
    pub async fn insert_asteroids(&self, asteroids: &[Asteroid]) -> Result<usize, DatabaseError> {
        if asteroids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool().begin().await?;
        for asteroid in asteroids {
            sqlx::query(
                r"
                INSERT INTO asteroids (
                    id, codename, close_approach_date, absolute_magnitude,
                    estimated_diameter, relative_velocity, distance_from_earth,
                    is_potentially_hazardous
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    codename = excluded.codename,
                    close_approach_date = excluded.close_approach_date,
                    absolute_magnitude = excluded.absolute_magnitude,
                    estimated_diameter = excluded.estimated_diameter,
                    relative_velocity = excluded.relative_velocity,
                    distance_from_earth = excluded.distance_from_earth,
                    is_potentially_hazardous = excluded.is_potentially_hazardous
                ",
            )
            .bind(asteroid.id)
            .bind(&asteroid.codename)
            .bind(asteroid.close_approach_day())
            .bind(asteroid.absolute_magnitude)
            .bind(asteroid.estimated_diameter)
            .bind(asteroid.relative_velocity)
            .bind(asteroid.distance_from_earth)
            .bind(asteroid.is_potentially_hazardous)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.notify(Table::Asteroids);
        Ok(asteroids.len())
    }

    /// Delete asteroids whose close approach date is strictly before `cutoff`.
    pub async fn delete_asteroids_before(&self, cutoff: NaiveDate) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM asteroids WHERE close_approach_date < ?")
            .bind(format_date(cutoff))
            .execute(self.pool())
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            self.notify(Table::Asteroids);
        }
        Ok(deleted)
    }

    // =========================================================================
    // Picture of the day queries
    // =========================================================================

    /// Most recently ingested picture; ties on `created_at` go to the later insert.
    pub async fn latest_picture(&self) -> Result<Option<PictureOfDay>, DatabaseError> {
        sqlx::query_as::<_, PictureRow>(
            "SELECT * FROM picture_of_day ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?
        .map(PictureOfDay::try_from)
        .transpose()
    }

    /// Append a picture. Returns the new row id.
    pub async fn insert_picture(&self, picture: &PictureOfDay) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            r"
            INSERT INTO picture_of_day (title, url, media_type, explanation, hd_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&picture.title)
        .bind(&picture.url)
        .bind(&picture.media_type)
        .bind(&picture.explanation)
        .bind(&picture.hd_url)
        .bind(to_unix_millis(picture.created_at))
        .execute(self.pool())
        .await?;

        self.notify(Table::PictureOfDay);
        Ok(result.last_insert_rowid())
    }

    /// Delete pictures ingested strictly before `cutoff`.
    pub async fn delete_pictures_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM picture_of_day WHERE created_at < ?")
            .bind(to_unix_millis(cutoff))
            .execute(self.pool())
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            self.notify(Table::PictureOfDay);
        }
        Ok(deleted)
    }

    pub async fn picture_count(&self) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM picture_of_day")
            .fetch_one(self.pool())
            .await?;
        Ok(count.0)
    }
}
