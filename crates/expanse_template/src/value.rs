//! Helpers for treating manifest values the way authors expect.

use serde_json::Value;

use crate::template::stringify;

/// Returns whether a value counts as "true" in a condition.
///
/// `null`, `false`, `0`, `NaN` and the empty string are false; everything
/// else, including empty arrays and objects, is true.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Compares a value against a case key.
///
/// Case keys in manifests are always strings, so the value is compared by its
/// stringified form. Strict JSON equality is tried first.
#[must_use]
pub fn matches_key(value: &Value, key: &Value) -> bool {
    value == key || stringify(value) == stringify(key)
}
