use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::repository::{MarketStore, Notifier};
use super::service::MarketplaceService;

/// Settle due collective purchases every `every` until `shutdown` resolves.
///
/// The first pass runs immediately on start.
pub async fn run_purchase_sweeper<S, N, F>(
    service: Arc<MarketplaceService<S, N>>,
    every: Duration,
    shutdown: F,
) where
    S: MarketStore + 'static,
    N: Notifier + 'static,
    F: Future<Output = ()>,
{
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(interval_secs = every.as_secs(), "purchase sweeper started");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => match service.sweep_purchases() {
                Ok(summary) if summary.is_empty() => debug!("no collective purchases due"),
                Ok(summary) => info!(
                    completed = summary.completed.len(),
                    cancelled = summary.cancelled.len(),
                    "collective purchases settled"
                ),
                Err(err) => warn!(error = %err, "purchase sweep failed"),
            },
        }
    }
    info!("purchase sweeper stopped");
}
