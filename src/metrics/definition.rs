/// Name, help text and ordered label names of a gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    pub name: String,
    pub help: String,
    pub labels: Vec<String>,
}

impl MetricDefinition {
    /// A gauge without labels.
    pub fn scalar(name: &str, help: &str) -> Self {
        Self::labeled(name, help, &[])
    }

    pub fn labeled(name: &str, help: &str, labels: &[&str]) -> Self {
        MetricDefinition {
            name: name.to_string(),
            help: help.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.labels.is_empty()
    }
}
