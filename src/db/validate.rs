//! Generic validation and sanitisation helpers for JSON payloads

use serde_json::{Map, Value};

/// Field-name to value mapping used for create and update requests
pub type Payload = Map<String, Value>;

/// True iff every named field is present and non-null
pub fn validate_required_fields(data: &Payload, fields: &[&str]) -> bool {
    fields
        .iter()
        .all(|field| data.get(*field).map_or(false, |v| !v.is_null()))
}

/// Trim a value and cap it at `max_length` characters.
///
/// Non-string values are rendered to their string form first; null becomes
/// the empty string.
pub fn sanitize_string(value: &Value, max_length: Option<usize>) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let trimmed = text.trim();

    match max_length {
        Some(max) if trimmed.chars().count() > max => trimmed.chars().take(max).collect(),
        _ => trimmed.to_string(),
    }
}

/// Null is accepted; otherwise the value must be a number (or numeric string) >= 0
pub fn validate_positive_number(value: &Value, field_name: &str) -> bool {
    let number = match value {
        Value::Null => return true,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_nan() => {
            tracing::warn!("{} must be a valid number, got: {}", field_name, value);
            false
        }
        Some(n) if n < 0.0 => {
            tracing::warn!("{} must be positive, got: {}", field_name, value);
            false
        }
        Some(_) => true,
        None => {
            tracing::warn!("{} must be a valid number, got: {}", field_name, value);
            false
        }
    }
}

/// Replace `field` in place with its sanitised form, when present
pub(crate) fn sanitize_field(data: &mut Payload, field: &str, max_length: Option<usize>) {
    if let Some(value) = data.get_mut(field) {
        if !value.is_null() {
            *value = Value::String(sanitize_string(value, max_length));
        }
    }
}
