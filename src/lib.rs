//! Library exports for waldur-exporter, shared between the binary and tests.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod routes;
pub mod startup;
pub mod state;
pub mod stats;
pub mod utils;
