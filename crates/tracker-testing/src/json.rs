//! Assertions on the error envelope `{"error": ..., "kind": ...}`.

use serde_json::Value;

/// Panics unless `body` is an error envelope with the given kind.
pub fn assert_error_kind(body: &Value, kind: &str) {
    assert_eq!(
        body.get("kind").and_then(Value::as_str),
        Some(kind),
        "unexpected error body: {body}"
    );
    assert!(
        body.get("error").and_then(Value::as_str).is_some(),
        "error envelope without message: {body}"
    );
}
