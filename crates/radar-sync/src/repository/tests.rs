//! Repository tests against a scripted remote source.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use radar_core::Asteroid;

use super::{AsteroidFilter, SyncErrorKind, SyncRepository};
use crate::clock::{Clock, FixedClock};
use crate::nasa::{NasaError, NeoApi, PictureResponse};
use crate::storage::{CacheStore, LiveQuery};

/// Remote source that replays canned bodies, or fails when none is set.
#[derive(Default)]
struct ScriptedApi {
    feed: Mutex<Option<String>>,
    picture: Mutex<Option<String>>,
    feed_calls: AtomicUsize,
    requested: Mutex<Vec<(Option<NaiveDate>, Option<NaiveDate>)>>,
}

impl ScriptedApi {
    fn with_feed(body: &str) -> Self {
        let api = Self::default();
        api.set_feed(Some(body));
        api
    }

    fn set_feed(&self, body: Option<&str>) {
        *self.feed.lock().unwrap() = body.map(ToString::to_string);
    }

    fn set_picture(&self, body: Option<&str>) {
        *self.picture.lock().unwrap() = body.map(ToString::to_string);
    }
}

fn unavailable() -> NasaError {
    NasaError::Api {
        status: 503,
        message: "Service Unavailable".into(),
    }
}

#[async_trait]
impl NeoApi for ScriptedApi {
    async fn fetch_asteroid_feed(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<String, NasaError> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push((start_date, end_date));
        self.feed.lock().unwrap().clone().ok_or_else(unavailable)
    }

    async fn fetch_picture_of_day(&self) -> Result<PictureResponse, NasaError> {
        let body = self.picture.lock().unwrap().clone().ok_or_else(unavailable)?;
        serde_json::from_str(&body).map_err(|e| NasaError::Decode(e.to_string()))
    }
}

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap() + chrono::Duration::days(offset)
}

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap())
}

fn entry(id: i64, name: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "name": "{name}",
            "absolute_magnitude_h": 22.1,
            "is_potentially_hazardous_asteroid": false,
            "estimated_diameter": {{"kilometers": {{"estimated_diameter_max": 0.31}}}},
            "close_approach_data": [{{
                "relative_velocity": {{"kilometers_per_hour": "61000.5"}},
                "miss_distance": {{"kilometers": "7200000.25"}}
            }}]
        }}"#
    )
}

/// Feed body with one entry per `(day offset, id)`.
fn feed(entries: &[(i64, i64)]) -> String {
    let mut by_day: Vec<(NaiveDate, Vec<String>)> = Vec::new();
    for &(offset, id) in entries {
        let date = day(offset);
        let item = entry(id, &format!("({id} TEST)"));
        match by_day.iter_mut().find(|(d, _)| *d == date) {
            Some((_, items)) => items.push(item),
            None => by_day.push((date, vec![item])),
        }
    }
    let days: Vec<String> = by_day
        .into_iter()
        .map(|(date, items)| format!(r#""{date}": [{}]"#, items.join(",")))
        .collect();
    format!(r#"{{"near_earth_objects": {{{}}}}}"#, days.join(","))
}

const PICTURE: &str = r#"{
    "title": "Andromeda",
    "url": "https://apod.nasa.gov/apod/image/m31.jpg",
    "media_type": "image",
    "explanation": "Our neighbour."
}"#;

async fn repo(api: ScriptedApi, clock: FixedClock) -> SyncRepository<ScriptedApi, FixedClock> {
    let store = CacheStore::open_in_memory().await.unwrap();
    SyncRepository::with_clock(store, api, clock)
}

fn ids(asteroids: &[Asteroid]) -> Vec<i64> {
    asteroids.iter().map(|a| a.id).collect()
}

async fn next_within<T: Clone>(live: &mut LiveQuery<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), live.next())
        .await
        .unwrap()
        .unwrap()
}

// === Refresh tests ===

#[tokio::test]
async fn refresh_asteroids_requests_from_today() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(0, 1)])), clock()).await;

    assert_eq!(repo.refresh_asteroids().await.unwrap(), 1);
    assert_eq!(*repo.api.requested.lock().unwrap(), vec![(Some(day(0)), None)]);
}

#[tokio::test]
async fn refresh_asteroids_stores_parsed_records() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(0, 1), (3, 2)])), clock()).await;
    repo.refresh_asteroids().await.unwrap();

    let stored = repo.store().get_asteroid(2).await.unwrap().unwrap();
    assert_eq!(stored.codename, "(2 TEST)");
    assert_eq!(stored.close_approach_date, day(3));
    assert!((stored.relative_velocity - 61_000.5).abs() < f64::EPSILON);
    assert!((stored.distance_from_earth - 7_200_000.25).abs() < f64::EPSILON);
}

#[tokio::test]
async fn refresh_replaces_records_with_same_id() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(0, 1)])), clock()).await;
    repo.refresh_asteroids().await.unwrap();

    repo.api.set_feed(Some(&feed(&[(2, 1)])));
    repo.refresh_asteroids().await.unwrap();

    assert_eq!(repo.store().asteroid_count().await.unwrap(), 1);
    let stored = repo.store().get_asteroid(1).await.unwrap().unwrap();
    assert_eq!(stored.close_approach_date, day(2));
}

#[tokio::test]
async fn network_failure_keeps_cache_and_returns_error() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(0, 1), (1, 2)])), clock()).await;
    repo.refresh_asteroids().await.unwrap();
    let before = repo.store().all_asteroids().await.unwrap();

    repo.api.set_feed(None);
    let err = repo.refresh_asteroids().await.unwrap_err();

    assert_eq!(err.kind(), SyncErrorKind::Network);
    assert_eq!(repo.store().all_asteroids().await.unwrap(), before);
    assert_eq!(repo.api.feed_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn malformed_feed_keeps_cache_and_returns_parse_error() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(0, 1)])), clock()).await;
    repo.refresh_asteroids().await.unwrap();

    repo.api.set_feed(Some(r#"{"2026-10-18": [{"id": 5}]}"#));
    let err = repo.refresh_asteroids().await.unwrap_err();

    assert_eq!(err.kind(), SyncErrorKind::Parse);
    assert_eq!(ids(&repo.store().all_asteroids().await.unwrap()), vec![1]);
}

#[tokio::test]
async fn nan_measurement_is_a_parse_error() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(0, 1)])), clock()).await;
    repo.refresh_asteroids().await.unwrap();

    let body = feed(&[(0, 2)]).replace("7200000.25", "NaN");
    repo.api.set_feed(Some(&body));
    let err = repo.refresh_asteroids().await.unwrap_err();

    assert_eq!(err.kind(), SyncErrorKind::Parse);
    assert_eq!(ids(&repo.store().all_asteroids().await.unwrap()), vec![1]);
}

#[tokio::test]
async fn refresh_picture_stamps_clock_time() {
    let api = ScriptedApi::default();
    api.set_picture(Some(PICTURE));
    let clock = clock();
    let repo = repo(api, clock.clone()).await;

    repo.refresh_picture_of_day().await.unwrap();

    let picture = repo.store().latest_picture().await.unwrap().unwrap();
    assert_eq!(picture.title, "Andromeda");
    assert_eq!(picture.created_at, clock.now());
    assert_eq!(picture.explanation.as_deref(), Some("Our neighbour."));
}

#[tokio::test]
async fn picture_failure_returns_network_error() {
    let repo = repo(ScriptedApi::default(), clock()).await;
    let err = repo.refresh_picture_of_day().await.unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::Network);
    assert!(repo.store().latest_picture().await.unwrap().is_none());
}

// === Eviction tests ===

#[tokio::test]
async fn clear_old_asteroids_keeps_today() {
    let repo = repo(
        ScriptedApi::with_feed(&feed(&[(-2, 1), (-1, 2), (0, 3), (4, 4)])),
        clock(),
    )
    .await;
    repo.refresh_asteroids().await.unwrap();

    assert_eq!(repo.clear_old_asteroids().await.unwrap(), 2);
    assert_eq!(ids(&repo.store().all_asteroids().await.unwrap()), vec![3, 4]);
}

#[tokio::test]
async fn clear_old_pictures_evicts_before_midnight() {
    let api = ScriptedApi::default();
    api.set_picture(Some(PICTURE));
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 17, 23, 59, 0).unwrap());
    let repo = repo(api, clock.clone()).await;

    repo.refresh_picture_of_day().await.unwrap();
    clock.advance(chrono::Duration::minutes(1));
    repo.refresh_picture_of_day().await.unwrap();

    assert_eq!(repo.clear_old_pictures().await.unwrap(), 1);
    assert_eq!(repo.store().picture_count().await.unwrap(), 1);
}

#[tokio::test]
async fn sync_once_reports_each_step() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(-1, 1), (0, 2)])), clock()).await;

    let report = repo.sync_once().await;

    assert_eq!(*report.asteroids.as_ref().unwrap(), 2);
    assert_eq!(report.picture.as_ref().unwrap_err().kind(), SyncErrorKind::Network);
    assert_eq!(*report.evicted_asteroids.as_ref().unwrap(), 1);
    assert_eq!(*report.evicted_pictures.as_ref().unwrap(), 0);
    assert!(!report.is_success());
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].0, "picture");
}

// === Read model tests ===

#[tokio::test]
async fn filters_select_date_ranges() {
    let repo = repo(
        ScriptedApi::with_feed(&feed(&[(-1, 1), (0, 2), (3, 3), (8, 4)])),
        clock(),
    )
    .await;
    repo.refresh_asteroids().await.unwrap();

    let mut live = repo.asteroids().await;
    assert_eq!(ids(&live.current()), vec![1, 2, 3, 4]);

    repo.set_filter(AsteroidFilter::Today);
    assert_eq!(ids(&next_within(&mut live).await), vec![2]);

    repo.set_filter(AsteroidFilter::Week);
    assert_eq!(ids(&next_within(&mut live).await), vec![2, 3]);
}

#[tokio::test]
async fn filter_switch_emits_today_then_week() {
    let repo = repo(
        ScriptedApi::with_feed(&feed(&[(-1, 1), (0, 2), (3, 3), (8, 4)])),
        clock(),
    )
    .await;
    repo.refresh_asteroids().await.unwrap();
    let mut live = repo.asteroids().await;

    repo.set_filter(AsteroidFilter::Today);
    let first = next_within(&mut live).await;
    repo.set_filter(AsteroidFilter::Week);
    let second = next_within(&mut live).await;

    // No unfiltered list in between.
    assert_eq!(ids(&first), vec![2]);
    assert_eq!(ids(&second), vec![2, 3]);
    assert_eq!(repo.filter(), AsteroidFilter::Week);
}

#[tokio::test]
async fn setting_same_filter_does_not_emit() {
    let repo = repo(ScriptedApi::default(), clock()).await;
    let mut live = repo.asteroids().await;

    repo.set_filter(AsteroidFilter::AllSaved);
    let waited = tokio::time::timeout(Duration::from_millis(100), live.next()).await;
    assert!(waited.is_err());
}

#[tokio::test]
async fn live_list_follows_refresh() {
    let repo = repo(ScriptedApi::with_feed(&feed(&[(0, 1), (1, 2)])), clock()).await;
    repo.set_filter(AsteroidFilter::Today);
    let mut live = repo.asteroids().await;
    assert!(live.current().is_empty());

    repo.refresh_asteroids().await.unwrap();
    assert_eq!(ids(&next_within(&mut live).await), vec![1]);
}

#[tokio::test]
async fn live_picture_starts_empty_then_shows_latest() {
    let api = ScriptedApi::default();
    api.set_picture(Some(PICTURE));
    let repo = repo(api, clock()).await;
    let mut live = repo.picture_of_day().await;
    assert!(live.current().is_none());

    repo.refresh_picture_of_day().await.unwrap();
    let picture = next_within(&mut live).await.unwrap();
    assert!(picture.is_image());
}

#[tokio::test]
async fn failed_refresh_never_reaches_read_model() {
    let repo = repo(ScriptedApi::default(), clock()).await;
    let mut live = repo.asteroids().await;

    assert!(repo.refresh_asteroids().await.is_err());
    let waited = tokio::time::timeout(Duration::from_millis(100), live.next()).await;
    assert!(waited.is_err());
    assert!(live.current().is_empty());
}
