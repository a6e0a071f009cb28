//! Background maintenance
//!
//! Long-running loops spawned by the binary next to the HTTP server. Each one
//! stops when the shutdown broadcast fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::db::TokenBlacklist;

/// Periodically delete blacklist entries for tokens that have expired.
///
/// The first purge runs immediately. A failed purge is logged and retried on
/// the next tick.
pub async fn run_blacklist_purge(
    blacklist: Arc<dyn TokenBlacklist>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    // tokio panics on a zero period
    let mut timer = interval(period.max(Duration::from_millis(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = period.as_secs(), "starting token blacklist purge");

    loop {
        tokio::select! {
            _ = timer.tick() => {
                match blacklist.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => info!(purged, "expired blacklist entries removed"),
                    Err(e) => warn!(error = %e, "failed to purge expired blacklist entries"),
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    info!("token blacklist purge stopped");
}
