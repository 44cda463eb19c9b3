use detailing_market::marketplace::{
    InMemoryMarketStore, MarketNotice, MarketplaceService, Notifier, NotifyError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) type MarketService = MarketplaceService<InMemoryMarketStore, LogNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes every notice to the log. Stands in for the mail and push integrations.
#[derive(Default)]
pub(crate) struct LogNotifier {
    published: AtomicU64,
}

impl LogNotifier {
    pub(crate) fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Notifier for LogNotifier {
    fn publish(&self, notice: MarketNotice) -> Result<(), NotifyError> {
        self.published.fetch_add(1, Ordering::Relaxed);
        info!(
            template = %notice.template,
            recipient = %notice.recipient,
            details = ?notice.details,
            "market notice"
        );
        Ok(())
    }
}
