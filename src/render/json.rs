//! JSON renderer.

use super::{RenderFailure, RenderResult};
use tracing::warn;

/// Message carried by the failure value for unparsable input.
pub const INVALID_JSON: &str = "Invalid JSON";

/// Parse the input into a value tree for the structured viewer.
pub fn render_json(data: &str) -> RenderResult {
    match serde_json::from_str(data) {
        Ok(value) => RenderResult::Tree(value),
        Err(e) => {
            warn!(error = %e, "content is not valid JSON");
            RenderResult::Error(RenderFailure::new(INVALID_JSON, Some(data)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object() {
        let result = render_json(r#"{"name":"test","value":123}"#);
        assert_eq!(result, RenderResult::Tree(json!({ "name": "test", "value": 123 })));
    }

    #[test]
    fn test_parse_primitives_and_arrays() {
        assert_eq!(render_json("[1, 2]").as_tree(), Some(&json!([1, 2])));
        assert_eq!(render_json("null").as_tree(), Some(&json!(null)));
        assert_eq!(render_json("\"s\"").as_tree(), Some(&json!("s")));
    }

    #[test]
    fn test_invalid_json() {
        let result = render_json("{invalid json}");
        let failure = result.as_failure().unwrap();
        assert_eq!(failure.message, INVALID_JSON);
        assert_eq!(failure.raw.as_deref(), Some("{invalid json}"));
    }

    #[test]
    fn test_key_order_preserved() {
        let result = render_json(r#"{"z":1,"a":2}"#);
        let keys: Vec<_> = result.as_tree().unwrap().as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
