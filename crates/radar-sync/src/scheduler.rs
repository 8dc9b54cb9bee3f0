//! Periodic background sync.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::nasa::NeoApi;
use crate::repository::SyncRepository;

/// Run [`SyncRepository::sync_once`] every `interval` until `shutdown` turns
/// `true` or its sender is dropped. The first pass starts immediately.
///
/// A pass in flight when shutdown arrives is dropped at its next await
/// point; committed writes stay. Returns the number of completed passes.
pub async fn run_periodic<A, C>(
    repo: Arc<SyncRepository<A, C>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64
where
    A: NeoApi,
    C: Clock + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut completed = 0u64;

    info!(interval_secs = interval.as_secs(), "Periodic sync started");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        tokio::select! {
            biased;
            () = shutdown_requested(&mut shutdown) => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            () = shutdown_requested(&mut shutdown) => {
                info!("Shutdown during sync pass, abandoning it");
                break;
            }
            report = repo.sync_once() => {
                completed += 1;
                if report.is_success() {
                    info!(pass = completed, "Periodic sync pass complete");
                } else {
                    let failed: Vec<&str> = report.failures().iter().map(|(step, _)| *step).collect();
                    warn!(pass = completed, ?failed, "Periodic sync pass had failures");
                }
            }
        }
    }

    info!(completed, "Periodic sync stopped");
    completed
}

/// Resolves once the flag reads `true` or its sender is dropped.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // `Err` means the sender is gone, which also stops the loop.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
