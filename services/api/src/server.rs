use crate::cli::ServeArgs;
use crate::infra::{AppState, LogNotifier, MarketService};
use crate::routes::with_market_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use detailing_market::config::AppConfig;
use detailing_market::error::AppError;
use detailing_market::marketplace::{run_purchase_sweeper, InMemoryMarketStore};
use detailing_market::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(secs) = args.sweep_interval_secs.filter(|secs| *secs > 0) {
        config.market.sweep_interval = Duration::from_secs(secs);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let market: Arc<MarketService> = Arc::new(MarketService::new(
        Arc::new(InMemoryMarketStore::default()),
        Arc::new(LogNotifier::default()),
        config.market,
    ));

    let (stop_tx, stop_rx) = watch::channel(false);
    let sweeper = tokio::spawn(run_purchase_sweeper(
        market.clone(),
        config.market.sweep_interval,
        stopped(stop_rx.clone()),
    ));

    let app = with_market_routes(market)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "detailing marketplace ready");

    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
        let _ = stop_tx.send(true);
    });

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(stopped(stop_rx))
        .await;
    readiness_flag.store(false, Ordering::Release);

    if served.is_err() {
        sweeper.abort();
    }
    if let Err(err) = sweeper.await {
        warn!(error = %err, "purchase sweeper task ended abnormally");
    }
    served?;
    Ok(())
}

/// Resolves once the shutdown flag flips or its sender is gone.
async fn stopped(mut rx: watch::Receiver<bool>) {
    loop {
        let requested = *rx.borrow_and_update();
        if requested || rx.changed().await.is_err() {
            return;
        }
    }
}
