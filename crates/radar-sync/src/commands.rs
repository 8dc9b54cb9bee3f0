//! Subcommand handlers.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use radar_core::{Asteroid, PictureOfDay};
use tracing::info;

use radar_sync::nasa::NasaClient;
use radar_sync::scheduler::run_periodic;
use radar_sync::{AsteroidFilter, SyncReport, SyncRepository};

type Repo = SyncRepository<NasaClient>;

pub async fn refresh(repo: &Repo) -> anyhow::Result<()> {
    let report = repo.sync_once().await;
    print_report(&report)?;

    let failures = report.failures();
    anyhow::ensure!(
        failures.is_empty(),
        "sync finished with {} failed step(s); cached data was kept",
        failures.len()
    );
    Ok(())
}

pub async fn list(repo: &Repo, filter: AsteroidFilter) -> anyhow::Result<()> {
    repo.set_filter(filter);
    let live = repo.asteroids().await;
    print_asteroids(filter, &live.current())?;
    Ok(())
}

pub async fn show(repo: &Repo, id: i64) -> anyhow::Result<()> {
    let asteroid = repo
        .store()
        .get_asteroid(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("asteroid {id} is not in the cache"))?;
    print_asteroid_detail(&asteroid)?;
    Ok(())
}

pub async fn picture(repo: &Repo) -> anyhow::Result<()> {
    let live = repo.picture_of_day().await;
    print_picture(live.current().as_ref())?;
    Ok(())
}

pub async fn clean(repo: &Repo) -> anyhow::Result<()> {
    let asteroids = repo.clear_old_asteroids().await?;
    let pictures = repo.clear_old_pictures().await?;

    let mut out = io::stdout().lock();
    writeln!(out, "Removed {asteroids} asteroid(s) and {pictures} picture(s).")?;
    Ok(())
}

/// Sync every `interval` and reprint the list on each change until Ctrl+C.
pub async fn watch(
    repo: Arc<Repo>,
    filter: AsteroidFilter,
    interval: Duration,
) -> anyhow::Result<()> {
    repo.set_filter(filter);
    let mut live = repo.asteroids().await;
    print_asteroids(filter, &live.current())?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker = tokio::spawn(run_periodic(Arc::clone(&repo), interval, shutdown_rx));

    loop {
        tokio::select! {
            update = live.next() => match update {
                Some(asteroids) => print_asteroids(filter, &asteroids)?,
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Ctrl+C received, stopping");
                break;
            }
        }
    }

    // The worker may already have exited; a closed channel is fine.
    let _ = shutdown_tx.send(true);
    let passes = worker.await?;
    info!(passes, "Watch finished");
    Ok(())
}

// =============================================================================
// Formatting
// =============================================================================

fn print_report(report: &SyncReport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    match &report.asteroids {
        Ok(count) => writeln!(out, "asteroids: {count} updated")?,
        Err(e) => writeln!(out, "asteroids: failed ({e})")?,
    }
    match &report.picture {
        Ok(()) => writeln!(out, "picture:   updated")?,
        Err(e) => writeln!(out, "picture:   failed ({e})")?,
    }
    match (&report.evicted_asteroids, &report.evicted_pictures) {
        (Ok(a), Ok(p)) => writeln!(out, "evicted:   {a} asteroid(s), {p} picture(s)")?,
        (Err(e), _) | (_, Err(e)) => writeln!(out, "evicted:   failed ({e})")?,
    }
    Ok(())
}

fn print_asteroids(filter: AsteroidFilter, asteroids: &[Asteroid]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{} asteroid(s) [{filter}]", asteroids.len())?;
    for asteroid in asteroids {
        writeln!(out, "{}", asteroid_line(asteroid))?;
    }
    Ok(())
}

fn print_asteroid_detail(asteroid: &Asteroid) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{} (id {})", asteroid.codename, asteroid.id)?;
    writeln!(out, "  close approach:      {}", asteroid.close_approach_day())?;
    writeln!(out, "  absolute magnitude:  {:.2} H", asteroid.absolute_magnitude)?;
    writeln!(out, "  estimated diameter:  {:.3} km", asteroid.estimated_diameter)?;
    writeln!(out, "  relative velocity:   {:.1} km/h", asteroid.relative_velocity)?;
    writeln!(out, "  distance from earth: {:.0} km", asteroid.distance_from_earth)?;
    writeln!(out, "  potentially hazardous: {}", yes_no(asteroid.is_potentially_hazardous))?;
    Ok(())
}

fn print_picture(picture: Option<&PictureOfDay>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let Some(picture) = picture else {
        writeln!(out, "No picture cached. Run `asteroid-radar refresh` first.")?;
        return Ok(());
    };
    writeln!(out, "{}", picture.title)?;
    writeln!(out, "  {}: {}", picture.media_type, picture.url)?;
    if let Some(hd) = &picture.hd_url {
        writeln!(out, "  hd: {hd}")?;
    }
    writeln!(out, "  fetched: {}", picture.created_at.format("%Y-%m-%d %H:%M UTC"))?;
    if let Some(explanation) = &picture.explanation {
        writeln!(out)?;
        writeln!(out, "{explanation}")?;
    }
    Ok(())
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// One-line summary used by `list` and `watch`.
fn asteroid_line(asteroid: &Asteroid) -> String {
    format!(
        "{}  {:>9}  {:<28}  {:>8.3} km  {:>12.0} km{}",
        asteroid.close_approach_day(),
        asteroid.id,
        asteroid.codename,
        asteroid.estimated_diameter,
        asteroid.distance_from_earth,
        if asteroid.is_potentially_hazardous {
            "  HAZARDOUS"
        } else {
            ""
        }
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn asteroid(hazardous: bool) -> Asteroid {
        Asteroid {
            id: 3_542_519,
            codename: "(2010 PK9)".into(),
            close_approach_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            absolute_magnitude: 21.3,
            estimated_diameter: 0.371_384_034,
            relative_velocity: 65_021.3,
            distance_from_earth: 7_412_845.2,
            is_potentially_hazardous: hazardous,
        }
    }

    #[test]
    fn asteroid_line_shows_date_id_and_name() {
        let line = asteroid_line(&asteroid(false));
        assert!(line.starts_with("2026-10-18"));
        assert!(line.contains("3542519"));
        assert!(line.contains("(2010 PK9)"));
        assert!(line.contains("0.371 km"));
        assert!(!line.contains("HAZARDOUS"));
    }

    #[test]
    fn asteroid_line_flags_hazardous() {
        assert!(asteroid_line(&asteroid(true)).ends_with("HAZARDOUS"));
    }
}
