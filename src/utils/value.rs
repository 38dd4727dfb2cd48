use serde_json::Value;

/// Convert a JSON field into a label value.
///
/// Strings are taken verbatim, numbers and booleans use their display form
/// and `null` becomes `"null"`. Arrays and objects keep their JSON encoding.
pub fn value_to_label(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    sanitize_label_value(raw)
}

/// Read a gauge value from a JSON number or a numeric string.
///
/// The API serialises decimals (usage amounts, costs) as strings.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn sanitize_label_value(s: String) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}
