//! Turning `marketplace-stats` payloads into gauge samples.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::utils::value::{value_to_f64, value_to_label};

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("expected a list of rows, got {0}")]
    NotAList(&'static str),
    #[error("row {0} is not an object")]
    NotAnObject(usize),
    #[error("expected a mapping, got {0}")]
    NotAMapping(&'static str),
    #[error("row has no field '{0}'")]
    MissingField(String),
    #[error("field '{field}' is not a number: {value}")]
    NotANumber { field: String, value: String },
}

/// One label tuple and its value, ready to be written to a gauge.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<String>,
    pub value: f64,
}

impl Sample {
    pub fn scalar(value: f64) -> Self {
        Sample {
            labels: Vec::new(),
            value,
        }
    }

    pub fn label_refs(&self) -> Vec<&str> {
        self.labels.iter().map(String::as_str).collect()
    }
}

/// A single record returned by the API for a breakdown statistic.
#[derive(Debug, Clone)]
pub struct StatRow(Map<String, Value>);

impl StatRow {
    pub fn field(&self, name: &str) -> Result<&Value, RowError> {
        self.0
            .get(name)
            .ok_or_else(|| RowError::MissingField(name.to_string()))
    }

    /// Label values for `fields`, in order.
    pub fn label_values(&self, fields: &[String]) -> Result<Vec<String>, RowError> {
        fields
            .iter()
            .map(|field| self.field(field).map(value_to_label))
            .collect()
    }

    pub fn number(&self, field: &str) -> Result<f64, RowError> {
        let value = self.field(field)?;
        value_to_f64(value).ok_or_else(|| RowError::NotANumber {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub fn sample(&self, fields: &[String], value_field: &str) -> Result<Sample, RowError> {
        Ok(Sample {
            labels: self.label_values(fields)?,
            value: self.number(value_field)?,
        })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Splits a list payload into rows.
pub fn parse_rows(payload: Value) -> Result<Vec<StatRow>, RowError> {
    let items = match payload {
        Value::Array(items) => items,
        other => return Err(RowError::NotAList(kind_of(&other))),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(StatRow(map)),
            _ => Err(RowError::NotAnObject(index)),
        })
        .collect()
}

/// Samples for every row of a list payload.
pub fn row_samples(
    payload: Value,
    fields: &[String],
    value_field: &str,
) -> Result<Vec<Sample>, RowError> {
    parse_rows(payload)?
        .iter()
        .map(|row| row.sample(fields, value_field))
        .collect()
}

/// Flattens `{outer: {inner: value}}` into two-label samples, outer key first.
pub fn nested_samples(payload: &Value) -> Result<Vec<Sample>, RowError> {
    let outer = match payload {
        Value::Object(map) => map,
        other => return Err(RowError::NotAMapping(kind_of(other))),
    };

    let mut samples = Vec::new();
    for (outer_key, inner) in outer {
        let inner = match inner {
            Value::Object(map) => map,
            other => return Err(RowError::NotAMapping(kind_of(other))),
        };
        for (inner_key, value) in inner {
            let value = value_to_f64(value).ok_or_else(|| RowError::NotANumber {
                field: format!("{}.{}", outer_key, inner_key),
                value: value.to_string(),
            })?;
            samples.push(Sample {
                labels: vec![outer_key.clone(), inner_key.clone()],
                value,
            });
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn rows_become_samples_in_field_order() {
        let payload = json!([
            {"abbreviation": "ORG1", "name": "Org One", "uuid": "u1", "count": 5},
            {"abbreviation": "ORG2", "name": "Org Two", "uuid": "u2", "count": 0}
        ]);
        let samples =
            row_samples(payload, &fields(&["abbreviation", "name", "uuid"]), "count").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].labels, vec!["ORG1", "Org One", "u1"]);
        assert_eq!(samples[0].value, 5.0);
        assert_eq!(samples[1].value, 0.0);
    }

    #[test]
    fn missing_field_is_reported() {
        let payload = json!([{"name": "Org One", "count": 5}]);
        let err = row_samples(payload, &fields(&["uuid"]), "count").unwrap_err();
        assert_eq!(err, RowError::MissingField("uuid".to_string()));
    }

    #[test]
    fn string_values_are_parsed_as_numbers() {
        let payload = json!([{"offering_uuid": "o1", "cost": "12.75"}]);
        let samples = row_samples(payload, &fields(&["offering_uuid"]), "cost").unwrap();
        assert_eq!(samples[0].value, 12.75);
    }

    #[test]
    fn non_numeric_value_is_reported() {
        let payload = json!([{"uuid": "u1", "count": "many"}]);
        let err = row_samples(payload, &fields(&["uuid"]), "count").unwrap_err();
        assert!(matches!(err, RowError::NotANumber { .. }));
    }

    #[test]
    fn object_payload_is_not_a_list() {
        let err = parse_rows(json!({"count": 1})).unwrap_err();
        assert_eq!(err, RowError::NotAList("an object"));
    }

    #[test]
    fn nested_mapping_is_flattened() {
        let payload = json!({
            "1.1": {"cpu": 10, "ram": "2048"},
            "2.3": {"cpu": 4}
        });
        let mut samples = nested_samples(&payload).unwrap();
        samples.sort_by(|a, b| a.labels.cmp(&b.labels));
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].labels, vec!["1.1", "cpu"]);
        assert_eq!(samples[1].labels, vec!["1.1", "ram"]);
        assert_eq!(samples[1].value, 2048.0);
        assert_eq!(samples[2].labels, vec!["2.3", "cpu"]);
    }

    #[test]
    fn nested_inner_must_be_mapping() {
        let err = nested_samples(&json!({"1.1": 3})).unwrap_err();
        assert_eq!(err, RowError::NotAMapping("a number"));
    }
}
