//! Periodic eviction of expired partial messages.
//!
//! One sweep task per [`Reassembler`] replaces per-message timers: each tick
//! scans the key table once and evicts whatever outlived the timeout.

use std::{fmt, hash::Hash, sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;

use super::Reassembler;

/// Shortest period accepted for the sweep.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Run eviction sweeps every `period` until `shutdown` is cancelled.
pub async fn run_eviction_sweeper<S>(
    reassembler: Arc<Reassembler<S>>,
    period: Duration,
    shutdown: CancellationToken,
) where
    S: Eq + Hash + Clone + fmt::Debug,
{
    let mut ticker = interval(period.max(MIN_SWEEP_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;

            () = shutdown.cancelled() => break,

            _ = ticker.tick() => {
                let evicted = reassembler.purge_expired();
                if !evicted.is_empty() {
                    tracing::debug!(
                        evicted = evicted.len(),
                        in_flight = reassembler.in_flight(),
                        "eviction sweep completed"
                    );
                }
            }
        }
    }
}

/// Spawn [`run_eviction_sweeper`] onto the current Tokio runtime.
///
/// # Panics
///
/// Panics when called outside a Tokio runtime.
#[must_use = "dropping the handle detaches the sweep; cancel `shutdown` to stop it"]
pub fn spawn_eviction_sweeper<S>(
    reassembler: Arc<Reassembler<S>>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    S: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    tokio::spawn(run_eviction_sweeper(reassembler, period, shutdown))
}
