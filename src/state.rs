//! Shared application state.
//!
//! Contains the state that is shared across all request handlers.

use crate::metrics::GaugeRegistry;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Handlers only read from the registry; the poller is the single writer.
#[derive(Clone)]
pub struct AppState {
    /// Gauges published on `/metrics`.
    pub metrics: Arc<GaugeRegistry>,
}
