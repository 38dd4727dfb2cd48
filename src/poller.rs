//! The fetch -> transform -> publish loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures::FutureExt;
use tracing::{debug, error, info};

use crate::client::StatsSource;
use crate::config::StaleSeriesPolicy;
use crate::error::CollectError;
use crate::metrics::{CycleResult, GaugeRegistry, PollRecorder};
use crate::stats::row::{nested_samples, row_samples};
use crate::stats::{Sample, StatDescriptor, StatKind};

/// The poller is either sleeping between cycles or running one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
}

/// What a single cycle managed to do.
#[derive(Debug)]
pub struct CycleReport {
    /// Statistics written in this cycle, in order.
    pub collected: Vec<String>,
    /// The failure that ended the cycle early, if any.
    pub failure: Option<CollectError>,
    pub duration: Duration,
}

impl CycleReport {
    pub fn result(&self) -> CycleResult {
        match &self.failure {
            None => CycleResult::Success,
            Some(e) if e.is_source() => CycleResult::SourceError,
            Some(_) => CycleResult::UnexpectedError,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// How the samples of one statistic are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Write {
    /// Overwrite each series; reset first when `clear` is set.
    Set { clear: bool },
    /// Reset, then add every sample so repeated label tuples are summed.
    Sum,
}

/// Drives the statistics table against a [`StatsSource`].
pub struct Poller<R: PollRecorder> {
    source: Arc<dyn StatsSource>,
    registry: Arc<GaugeRegistry>,
    stats: Vec<StatDescriptor>,
    stale_series: StaleSeriesPolicy,
    recorder: R,
    state: PollerState,
}

impl<R: PollRecorder> Poller<R> {
    /// The gauges of `stats` must already be declared in `registry`.
    pub fn new(
        source: Arc<dyn StatsSource>,
        registry: Arc<GaugeRegistry>,
        stats: Vec<StatDescriptor>,
        stale_series: StaleSeriesPolicy,
        recorder: R,
    ) -> Self {
        Poller {
            source,
            registry,
            stats,
            stale_series,
            recorder,
            state: PollerState::Idle,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Polls forever: one cycle, then `interval` of sleep.
    pub async fn run(mut self, interval: Duration) {
        info!(
            "Starting poller with {} statistics every {:?}",
            self.stats.len(),
            interval
        );
        loop {
            self.poll_once().await;
            tokio::time::sleep(interval).await;
        }
    }

    /// Runs one cycle inside the failure boundary. Never panics, never fails.
    pub async fn poll_once(&mut self) -> CycleReport {
        self.state = PollerState::Polling;
        debug!("Poller state: {:?}", self.state);
        let started = Instant::now();

        let report = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(report) => report,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                CycleReport {
                    collected: Vec::new(),
                    failure: Some(CollectError::unexpected("poll cycle", message)),
                    duration: started.elapsed(),
                }
            }
        };

        self.finish(&report);
        self.state = PollerState::Idle;
        debug!("Poller state: {:?}", self.state);
        report
    }

    fn finish(&self, report: &CycleReport) {
        self.recorder.record_cycle(report.result());
        self.recorder
            .record_cycle_duration(report.duration.as_secs_f64());

        info!(
            result = report.result().as_str(),
            "Collected {} of {} statistics in {:.2}s",
            report.collected.len(),
            self.stats.len(),
            report.duration.as_secs_f64()
        );

        match &report.failure {
            None => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs_f64();
                self.recorder.record_success_timestamp(now);
            }
            Some(e @ CollectError::Source { .. }) => {
                error!(
                    stat = e.stat(),
                    collected = report.collected.len(),
                    "Unable to collect metrics. Message: {}",
                    e
                );
            }
            Some(e @ CollectError::Unexpected { .. }) => {
                error!(
                    stat = e.stat(),
                    collected = report.collected.len(),
                    "Unable to collect metrics. Exception: {}",
                    e
                );
            }
        }
    }

    /// Walks the table in order and stops at the first failing statistic.
    ///
    /// Statistics before the failure keep their fresh values, those after it
    /// keep whatever the previous cycle wrote.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let mut collected = Vec::with_capacity(self.stats.len());

        for stat in &self.stats {
            info!("Collecting {}", stat.name());
            if let Err(e) = self.collect(stat).await {
                return CycleReport {
                    collected,
                    failure: Some(e),
                    duration: started.elapsed(),
                };
            }
            collected.push(stat.name().to_string());
        }

        CycleReport {
            collected,
            failure: None,
            duration: started.elapsed(),
        }
    }

    /// Fetches and publishes one statistic. Nothing is written unless the
    /// whole payload could be turned into samples.
    async fn collect(&self, stat: &StatDescriptor) -> Result<(), CollectError> {
        let name = stat.name();
        let clear = self.stale_series == StaleSeriesPolicy::Clear;
        let fetch_err = |e| CollectError::from_client(name, e);
        let row_err = |e: crate::stats::RowError| CollectError::unexpected(name, e.to_string());

        match &stat.kind {
            StatKind::Count { endpoint, query } => {
                let count = self.source.count(endpoint, query).await.map_err(fetch_err)?;
                debug!("{} = {}", name, count);
                self.publish(name, &[Sample::scalar(count as f64)], Write::Set { clear: false })
            }
            StatKind::CountBy { endpoint, variants } => {
                let mut samples = Vec::with_capacity(variants.len());
                for (label, query) in variants {
                    let count = self.source.count(endpoint, query).await.map_err(fetch_err)?;
                    samples.push(Sample {
                        labels: vec![label.clone()],
                        value: count as f64,
                    });
                }
                self.publish(name, &samples, Write::Set { clear })
            }
            StatKind::Rows {
                action,
                fields,
                value_field,
                total,
            } => {
                let payload = self.source.stats(action).await.map_err(fetch_err)?;
                let samples = row_samples(payload, fields, value_field).map_err(row_err)?;
                debug!("{}: {} rows", name, samples.len());
                self.publish(name, &samples, Write::Set { clear })?;
                if let Some(total) = total {
                    let sum: f64 = samples.iter().map(|s| s.value).sum();
                    self.publish(&total.name, &[Sample::scalar(sum)], Write::Set { clear: false })?;
                }
                Ok(())
            }
            StatKind::Nested { action } => {
                let payload = self.source.stats(action).await.map_err(fetch_err)?;
                let samples = nested_samples(&payload).map_err(row_err)?;
                self.publish(name, &samples, Write::Set { clear })
            }
            StatKind::Merged {
                actions,
                fields,
                value_field,
            } => {
                let mut samples = Vec::new();
                for action in actions {
                    let payload = self.source.stats(action).await.map_err(fetch_err)?;
                    samples.extend(row_samples(payload, fields, value_field).map_err(row_err)?);
                }
                self.publish(name, &samples, Write::Sum)
            }
        }
    }

    fn publish(&self, name: &str, samples: &[Sample], write: Write) -> Result<(), CollectError> {
        let registry_err = |e: crate::metrics::RegistryError| {
            CollectError::unexpected(name, e.to_string())
        };

        match write {
            Write::Set { clear } => {
                if clear {
                    self.registry.clear(name).map_err(registry_err)?;
                }
                for sample in samples {
                    self.registry
                        .set(name, &sample.label_refs(), sample.value)
                        .map_err(registry_err)?;
                }
            }
            Write::Sum => {
                self.registry.clear(name).map_err(registry_err)?;
                for sample in samples {
                    self.registry
                        .add(name, &sample.label_refs(), sample.value)
                        .map_err(registry_err)?;
                }
            }
        }
        Ok(())
    }
}
