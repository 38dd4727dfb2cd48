//! Access to the Waldur REST API.
//!
//! The poller only depends on the [`StatsSource`] trait; [`WaldurClient`] is
//! the reqwest-backed implementation used in production.

pub mod base;
pub mod waldur;

pub use base::{Query, StatsSource};
pub use waldur::WaldurClient;
