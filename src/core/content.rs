//! Rendering of tool payloads into protocol text.

use serde_json::Value as JsonValue;

/// Textual form of an `llm_content` value: strings pass through verbatim,
/// anything else is encoded as JSON. Object key order is preserved.
pub fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}
