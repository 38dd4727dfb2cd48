//! Liveness and landing endpoints.

use crate::state::AppState;
use axum::{http::StatusCode, response::Html, routing::get, Router};

/// Registers `/health` and the `/` landing page.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}

/// The process is alive as long as it can answer; poll failures do not
/// make the exporter unhealthy.
async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn index() -> Html<&'static str> {
    Html(
        "<html><head><title>Waldur exporter</title></head>\
         <body><h1>Waldur exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body></html>",
    )
}
