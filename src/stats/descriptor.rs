//! Declarative description of one statistic: its gauge and the API call behind it.

use crate::client::Query;
use crate::metrics::{GaugeRegistry, MetricDefinition, RegistryError};

/// Where a statistic comes from and how its payload maps onto labels.
#[derive(Debug, Clone)]
pub enum StatKind {
    /// `X-Result-Count` of a filtered list endpoint, published without labels.
    Count { endpoint: String, query: Query },
    /// One count per label value, each with its own filters.
    CountBy {
        endpoint: String,
        variants: Vec<(String, Query)>,
    },
    /// A list of rows; `fields[i]` feeds the i-th label of the gauge.
    Rows {
        action: String,
        fields: Vec<String>,
        value_field: String,
        /// Scalar gauge receiving the sum of all row values.
        total: Option<MetricDefinition>,
    },
    /// `{outer: {inner: value}}`, published with two labels.
    Nested { action: String },
    /// Several row lists of the same shape, summed per label tuple.
    Merged {
        actions: Vec<String>,
        fields: Vec<String>,
        value_field: String,
    },
}

/// A gauge together with the recipe that fills it.
#[derive(Debug, Clone)]
pub struct StatDescriptor {
    pub metric: MetricDefinition,
    pub kind: StatKind,
}

fn owned_query(query: &[(&str, &str)]) -> Query {
    query
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl StatDescriptor {
    pub fn count(name: &str, help: &str, endpoint: &str, query: &[(&str, &str)]) -> Self {
        StatDescriptor {
            metric: MetricDefinition::scalar(name, help),
            kind: StatKind::Count {
                endpoint: endpoint.to_string(),
                query: owned_query(query),
            },
        }
    }

    pub fn count_by(
        name: &str,
        help: &str,
        label: &str,
        endpoint: &str,
        variants: Vec<(String, Query)>,
    ) -> Self {
        StatDescriptor {
            metric: MetricDefinition::labeled(name, help, &[label]),
            kind: StatKind::CountBy {
                endpoint: endpoint.to_string(),
                variants,
            },
        }
    }

    /// `labels` pairs each gauge label with the row field it is read from.
    pub fn rows(
        name: &str,
        help: &str,
        action: &str,
        labels: &[(&str, &str)],
        value_field: &str,
    ) -> Self {
        let label_names: Vec<&str> = labels.iter().map(|(label, _)| *label).collect();
        StatDescriptor {
            metric: MetricDefinition::labeled(name, help, &label_names),
            kind: StatKind::Rows {
                action: action.to_string(),
                fields: labels.iter().map(|(_, field)| field.to_string()).collect(),
                value_field: value_field.to_string(),
                total: None,
            },
        }
    }

    /// Also publish the sum of the row values as a scalar gauge.
    pub fn with_total(mut self, name: &str, help: &str) -> Self {
        if let StatKind::Rows { total, .. } = &mut self.kind {
            *total = Some(MetricDefinition::scalar(name, help));
        }
        self
    }

    pub fn nested(name: &str, help: &str, action: &str, outer: &str, inner: &str) -> Self {
        StatDescriptor {
            metric: MetricDefinition::labeled(name, help, &[outer, inner]),
            kind: StatKind::Nested {
                action: action.to_string(),
            },
        }
    }

    pub fn merged(
        name: &str,
        help: &str,
        actions: &[&str],
        labels: &[(&str, &str)],
        value_field: &str,
    ) -> Self {
        let label_names: Vec<&str> = labels.iter().map(|(label, _)| *label).collect();
        StatDescriptor {
            metric: MetricDefinition::labeled(name, help, &label_names),
            kind: StatKind::Merged {
                actions: actions.iter().map(|a| a.to_string()).collect(),
                fields: labels.iter().map(|(_, field)| field.to_string()).collect(),
                value_field: value_field.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metric.name
    }

    /// Every gauge this descriptor writes to.
    pub fn definitions(&self) -> Vec<&MetricDefinition> {
        let mut definitions = vec![&self.metric];
        if let StatKind::Rows {
            total: Some(total), ..
        } = &self.kind
        {
            definitions.push(total);
        }
        definitions
    }
}

/// Declares the gauges of every descriptor in `registry`.
pub fn declare_all(
    registry: &mut GaugeRegistry,
    stats: &[StatDescriptor],
) -> Result<(), RegistryError> {
    for definition in stats.iter().flat_map(StatDescriptor::definitions) {
        registry.declare(definition)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_descriptor_pairs_labels_with_fields() {
        let stat = StatDescriptor::rows(
            "count_projects_grouped_by_oecd_fos",
            "Projects per OECD FoS code",
            "count_projects_grouped_by_oecd_fos",
            &[("oecd_fos_code", "oecd")],
            "count",
        );
        assert_eq!(stat.metric.labels, vec!["oecd_fos_code"]);
        match &stat.kind {
            StatKind::Rows { fields, .. } => assert_eq!(fields, &vec!["oecd".to_string()]),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn total_adds_a_second_definition() {
        let stat = StatDescriptor::rows("a", "a", "a", &[("x", "x")], "count")
            .with_total("a_total", "sum of a");
        let names: Vec<&str> = stat
            .definitions()
            .into_iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "a_total"]);
        assert!(stat.definitions()[1].is_scalar());
    }

    #[test]
    fn declare_all_rejects_duplicate_names() {
        let stats = vec![
            StatDescriptor::count("dup", "first", "users", &[]),
            StatDescriptor::count("dup", "second", "projects", &[]),
        ];
        let mut registry = GaugeRegistry::new();
        assert!(declare_all(&mut registry, &stats).is_err());
    }
}
