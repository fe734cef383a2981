//! Probe result representation.
//!
//! A probe result is an ordered list of flat string-keyed maps, one map per
//! discovered physical instance of a component. The helper boundary moves
//! results as a JSON array of such maps.

use serde_json::{Map, Value};

/// One discovered instance: a flat field-name to value map.
pub type ResultMap = Map<String, Value>;

/// Everything a probe function found.
pub type ProbeResult = Vec<ResultMap>;

/// Serialize results into the helper payload format (JSON array of objects).
pub fn to_helper_payload(results: &[ResultMap]) -> String {
    let items: Vec<Value> = results.iter().cloned().map(Value::Object).collect();
    Value::Array(items).to_string()
}

/// Parse a helper payload back into a result list.
///
/// Returns `None` when the payload is not a JSON array of objects.
pub fn from_helper_payload(payload: &str) -> Option<ProbeResult> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let items = match value {
        Value::Array(items) => items,
        _ => return None,
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_round_trip() {
        let mut map = ResultMap::new();
        map.insert("vendor".to_string(), json!("0x8086"));
        map.insert("index".to_string(), json!(1));

        let payload = to_helper_payload(&[map.clone()]);
        let parsed = from_helper_payload(&payload).unwrap();

        assert_eq!(parsed, vec![map]);
    }

    #[test]
    fn test_payload_rejects_non_array() {
        assert!(from_helper_payload("{\"a\": 1}").is_none());
        assert!(from_helper_payload("not json").is_none());
    }

    #[test]
    fn test_payload_rejects_non_object_elements() {
        assert!(from_helper_payload("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(from_helper_payload("[]").unwrap(), Vec::<ResultMap>::new());
    }
}
