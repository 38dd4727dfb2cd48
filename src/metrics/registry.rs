//! Gauge storage keyed by metric name.

use std::collections::HashMap;

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;
use tracing::debug;

use super::definition::MetricDefinition;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("metric '{0}' was never declared")]
    UnknownMetric(String),
    #[error("metric '{0}' is already declared")]
    Duplicate(String),
    #[error("metric '{name}': {source}")]
    Prometheus {
        name: String,
        #[source]
        source: prometheus::Error,
    },
}

#[derive(Clone)]
enum Series {
    Plain(Gauge),
    Labeled(GaugeVec, Vec<String>),
}

/// Every gauge the exporter publishes.
///
/// Gauges are declared once at start-up through [`GaugeRegistry::declare`];
/// afterwards the registry is shared behind an `Arc` and only values change.
/// Prometheus gauges are atomic, so writers and scrapes need no extra lock.
#[derive(Clone)]
pub struct GaugeRegistry {
    registry: Registry,
    gauges: HashMap<String, Series>,
}

impl Default for GaugeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GaugeRegistry {
    pub fn new() -> Self {
        GaugeRegistry {
            registry: Registry::new(),
            gauges: HashMap::new(),
        }
    }

    /// The underlying Prometheus registry, for collectors that are not gauges.
    pub fn prometheus(&self) -> &Registry {
        &self.registry
    }

    /// Registers a gauge. Names are globally unique.
    pub fn declare(&mut self, definition: &MetricDefinition) -> Result<(), RegistryError> {
        if self.gauges.contains_key(&definition.name) {
            return Err(RegistryError::Duplicate(definition.name.clone()));
        }
        let wrap = |source| RegistryError::Prometheus {
            name: definition.name.clone(),
            source,
        };

        let opts = Opts::new(definition.name.as_str(), definition.help.as_str());
        let series = if definition.is_scalar() {
            let gauge = Gauge::with_opts(opts).map_err(wrap)?;
            self.registry
                .register(Box::new(gauge.clone()))
                .map_err(wrap)?;
            Series::Plain(gauge)
        } else {
            let labels: Vec<&str> = definition.labels.iter().map(String::as_str).collect();
            let gauge = GaugeVec::new(opts, &labels).map_err(wrap)?;
            self.registry
                .register(Box::new(gauge.clone()))
                .map_err(wrap)?;
            Series::Labeled(gauge, definition.labels.clone())
        };

        debug!(
            "Declared gauge '{}' with labels {:?}",
            definition.name, definition.labels
        );
        self.gauges.insert(definition.name.clone(), series);
        Ok(())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.gauges.contains_key(name)
    }

    fn series(&self, name: &str) -> Result<&Series, RegistryError> {
        self.gauges
            .get(name)
            .ok_or_else(|| RegistryError::UnknownMetric(name.to_string()))
    }

    fn gauge_for(&self, name: &str, labels: &[&str]) -> Result<Gauge, RegistryError> {
        match self.series(name)? {
            Series::Plain(gauge) if labels.is_empty() => Ok(gauge.clone()),
            Series::Plain(_) => Err(RegistryError::Prometheus {
                name: name.to_string(),
                source: prometheus::Error::InconsistentCardinality {
                    expect: 0,
                    got: labels.len(),
                },
            }),
            Series::Labeled(vec, _) => {
                vec.get_metric_with_label_values(labels)
                    .map_err(|source| RegistryError::Prometheus {
                        name: name.to_string(),
                        source,
                    })
            }
        }
    }

    /// Overwrites the value of one series.
    pub fn set(&self, name: &str, labels: &[&str], value: f64) -> Result<(), RegistryError> {
        self.gauge_for(name, labels)?.set(value);
        Ok(())
    }

    /// Adds to the value of one series, creating it at zero first.
    pub fn add(&self, name: &str, labels: &[&str], value: f64) -> Result<(), RegistryError> {
        self.gauge_for(name, labels)?.add(value);
        Ok(())
    }

    /// Drops every label combination of a labeled gauge; a scalar is reset to zero.
    pub fn clear(&self, name: &str) -> Result<(), RegistryError> {
        match self.series(name)? {
            Series::Plain(gauge) => gauge.set(0.0),
            Series::Labeled(vec, _) => vec.reset(),
        }
        Ok(())
    }

    /// Current value of one series, `None` if that label combination is not published.
    ///
    /// Reads through `gather` so that looking at a series never creates it.
    pub fn value(&self, name: &str, labels: &[&str]) -> Option<f64> {
        let definition_labels: &[String] = match self.gauges.get(name)? {
            Series::Plain(_) => &[],
            // Gathered label pairs are sorted by name, so match by name.
            Series::Labeled(_, names) => names,
        };
        if definition_labels.len() != labels.len() {
            return None;
        }

        let family = self
            .registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == name)?;
        family
            .get_metric()
            .iter()
            .find(|metric| {
                let pairs = metric.get_label();
                pairs.len() == labels.len()
                    && definition_labels.iter().zip(labels).all(|(label, value)| {
                        pairs
                            .iter()
                            .any(|pair| pair.get_name() == label && pair.get_value() == *value)
                    })
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Number of label combinations currently published for `name`.
    pub fn series_count(&self, name: &str) -> usize {
        self.registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == name)
            .map(|family| family.get_metric().len())
            .unwrap_or(0)
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
