//! Pulls the JSON object out of free-form model output.

use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};

/// Parses the span from the first `{` to the last `}` of `text` as a JSON
/// object. Surrounding prose or markdown fences are ignored.
pub fn extract_json(text: &str) -> Result<Map<String, Value>> {
    let span = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => {
            return Err(GatewayError::BadRequest(
                "No JSON object found in response".to_string(),
            ))
        }
    };

    serde_json::from_str::<Map<String, Value>>(span)
        .map_err(|e| GatewayError::BadRequest(format!("Invalid JSON in response: {}", e)))
}
