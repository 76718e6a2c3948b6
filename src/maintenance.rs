//! Periodic maintenance tasks.
//!
//! The only recurring job is the eviction sweep: conversations whose
//! customer has been silent longer than the retention horizon are dropped
//! from the contact store. A dropped conversation starts over as brand new
//! on its next message.

use crate::db::{ContactDb, Timestamp};
use crate::runtime::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default time between sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Default retention horizon
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    pub interval: Duration,
    pub retention: Duration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            retention: DEFAULT_RETENTION,
        }
    }
}

/// Summary of one sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: usize,
    pub remaining: usize,
}

/// Run one sweep under the store lock
pub async fn run_eviction(db: &ContactDb, now: Timestamp, retention: Duration) -> EvictionReport {
    let mut contacts = db.lock().await;
    let evicted = contacts.evict_stale(now, retention);
    let report = EvictionReport {
        evicted,
        remaining: contacts.len(),
    };

    tracing::info!(
        evicted = report.evicted,
        remaining = report.remaining,
        "Eviction sweep completed"
    );
    report
}

/// Sweep every `settings.interval` until `cancel` fires.
///
/// The first sweep happens one full interval after start.
pub fn spawn_eviction_sweep(
    db: ContactDb,
    clock: Arc<dyn Clock>,
    settings: SweepSettings,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + settings.interval;
        let mut ticker = tokio::time::interval_at(start, settings.interval);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    run_eviction(&db, clock.now(), settings.retention).await;
                }
            }
        }

        tracing::debug!("Eviction sweep stopped");
    })
}
