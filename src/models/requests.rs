//! Request DTOs for the gateway API
//!
//! Defines how the `/analyze` and `/chat` payloads are read.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};

// == Plant Context ==
/// Descriptive fields supplied by the client alongside an image or a chat.
///
/// Every field is optional. Strings are taken as-is, other scalar JSON values
/// are rendered to text, and empty strings count as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlantContext {
    pub plant_name: Option<String>,
    pub species: Option<String>,
    pub season: Option<String>,
    pub last_watered: Option<String>,
    pub current_date: Option<String>,
    pub custom_prompt: Option<String>,
    pub last_assessment_status: Option<String>,
}

impl PlantContext {
    /// Reads the context fields from a JSON object, ignoring everything else.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            plant_name: text_field(map, "plant_name"),
            species: text_field(map, "species"),
            season: text_field(map, "season"),
            last_watered: text_field(map, "last_watered"),
            current_date: text_field(map, "current_date"),
            custom_prompt: text_field(map, "custom_prompt"),
            last_assessment_status: text_field(map, "last_assessment_status"),
        }
    }
}

/// Reads a context field as text. Empty or zero-like values count as absent.
fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

// == Analyze Request ==
/// Payload of `POST /analyze`: a base64 image plus plant context.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// Base64-encoded image, if present and non-empty
    pub image_base64: Option<String>,
    pub context: PlantContext,
}

impl AnalyzeRequest {
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let image_base64 = payload
            .get("image_base64")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Self {
            image_base64,
            context: PlantContext::from_map(payload),
        }
    }
}

// == Chat Message ==
/// One turn of the client-supplied conversation history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl ChatMessage {
    /// Lower-cased role, `user` when absent.
    pub fn role(&self) -> String {
        self.role
            .as_deref()
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "user".to_string())
    }

    /// Trimmed text content, empty when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().map(str::trim).unwrap_or("")
    }

    /// The attached image, if any.
    pub fn image(&self) -> Option<&str> {
        self.image_base64.as_deref().filter(|s| !s.is_empty())
    }
}

// == Chat Request ==
/// Payload of `POST /chat`: message history plus optional `plant_context`.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub context: PlantContext,
}

impl ChatRequest {
    /// Validates and reads a chat payload.
    ///
    /// Fails when `messages` is missing, is not a list, or holds an item that
    /// is not a message object.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let raw = payload
            .get("messages")
            .and_then(Value::as_array)
            .ok_or_else(|| GatewayError::BadRequest("messages must be a list".to_string()))?;

        let messages = raw
            .iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value::<ChatMessage>(item.clone()).map_err(|e| {
                    GatewayError::BadRequest(format!("messages[{}] is invalid: {}", i, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let context = payload
            .get("plant_context")
            .and_then(Value::as_object)
            .map(PlantContext::from_map)
            .unwrap_or_default();

        Ok(Self { messages, context })
    }
}
