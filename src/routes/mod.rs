//! HTTP route definitions and handlers.
//!
//! The exporter serves the scrape endpoint and a liveness probe.

mod health_routes;
mod metrics_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(metrics_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
