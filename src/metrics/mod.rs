//! Prometheus registry behind `/metrics`.
//!
//! [`GaugeRegistry`] holds the gauges fed from the Waldur API, [`PollMetrics`]
//! records how the poller itself is doing. Both live in the same registry.

mod definition;
mod recorder;
mod registry;

pub use definition::MetricDefinition;
pub use recorder::{CycleResult, PollMetrics, PollRecorder};
pub use registry::{GaugeRegistry, RegistryError};
