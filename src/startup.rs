//! Application startup and server initialization.
//!
//! Builds the Waldur client, declares every gauge, spawns the poller and
//! serves the scrape endpoint.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::client::{StatsSource, WaldurClient};
use crate::config::Config;
use crate::error::StartupError;
use crate::metrics::{GaugeRegistry, PollMetrics};
use crate::poller::Poller;
use crate::routes;
use crate::state::AppState;
use crate::stats::{catalogue, declare_all};

/// Declares the gauges of the default catalogue and wires a poller over `source`.
///
/// The returned state shares its registry with the poller.
pub fn build_exporter(
    config: &Config,
    source: Arc<dyn StatsSource>,
) -> Result<(AppState, Poller<PollMetrics>), StartupError> {
    let stats = catalogue(&config.registration_methods);

    let mut registry = GaugeRegistry::new();
    declare_all(&mut registry, &stats)?;
    let poll_metrics = PollMetrics::new(registry.prometheus())?;
    let registry = Arc::new(registry);

    let poller = Poller::new(
        source,
        registry.clone(),
        stats,
        config.stale_series,
        poll_metrics,
    );
    let state = AppState { metrics: registry };
    Ok((state, poller))
}

/// Initializes and runs the exporter until the process is killed.
///
/// # Errors
///
/// Returns an error if the client cannot be built, a gauge cannot be
/// declared, or the server fails to bind or serve.
pub async fn run(config: Arc<Config>) -> Result<(), StartupError> {
    let client = WaldurClient::new(&config.api_url, &config.api_token, config.api_timeout())?;
    let (state, poller) = build_exporter(&config, Arc::new(client))?;

    tokio::spawn(poller.run(config.poll_interval()));

    info!("Starting server on {}", config.bind_address);
    let app = routes::create_router(state);
    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

    axum::serve(listener, app)
        .await
        .map_err(StartupError::Serve)
}
