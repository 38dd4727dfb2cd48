//! Metrics about the poller itself, using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_gauge_with_registry,
    register_histogram_with_registry, CounterVec, Gauge, Histogram, Opts, Registry,
};

/// How a poll cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleResult {
    Success,
    SourceError,
    UnexpectedError,
}

impl CycleResult {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleResult::Success => "success",
            CycleResult::SourceError => "source_error",
            CycleResult::UnexpectedError => "unexpected_error",
        }
    }
}

/// Trait for recording poller health.
pub trait PollRecorder: Clone + Send + Sync + 'static {
    /// Records a finished poll cycle with its outcome.
    fn record_cycle(&self, result: CycleResult);

    /// Records the wall-clock duration of a poll cycle.
    fn record_cycle_duration(&self, duration_secs: f64);

    /// Records the unix time of the last fully successful cycle.
    fn record_success_timestamp(&self, unix_secs: f64);
}

/// Prometheus collectors for the poller.
#[derive(Clone)]
pub struct PollMetrics {
    poll_cycles_total: CounterVec,
    poll_duration_seconds: Histogram,
    last_success_timestamp_seconds: Gauge,
}

impl PollMetrics {
    /// Registers the poller collectors in `registry`.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let poll_cycles_total = register_counter_vec_with_registry!(
            Opts::new(
                "waldur_exporter_poll_cycles_total",
                "Total number of poll cycles by result"
            ),
            &["result"],
            registry
        )?;

        let poll_duration_seconds = register_histogram_with_registry!(
            "waldur_exporter_poll_duration_seconds",
            "Duration of a poll cycle in seconds",
            vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            registry
        )?;

        let last_success_timestamp_seconds = register_gauge_with_registry!(
            "waldur_exporter_last_success_timestamp_seconds",
            "Unix time of the last poll cycle that collected every statistic",
            registry
        )?;

        Ok(PollMetrics {
            poll_cycles_total,
            poll_duration_seconds,
            last_success_timestamp_seconds,
        })
    }
}

impl PollRecorder for PollMetrics {
    fn record_cycle(&self, result: CycleResult) {
        self.poll_cycles_total
            .with_label_values(&[result.as_str()])
            .inc();
    }

    fn record_cycle_duration(&self, duration_secs: f64) {
        self.poll_duration_seconds.observe(duration_secs);
    }

    fn record_success_timestamp(&self, unix_secs: f64) {
        self.last_success_timestamp_seconds.set(unix_secs);
    }
}
