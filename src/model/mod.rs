//! Remote Model Module
//!
//! The generation backend seen by the dispatcher: a conversation of
//! [`Content`] turns goes in, a [`GenerateResponse`] comes out.

mod gemini;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ModelError;

pub use gemini::{GeminiClient, DEFAULT_API_BASE};

/// Role used for client turns.
pub const ROLE_USER: &str = "user";
/// Role used for model turns.
pub const ROLE_MODEL: &str = "model";

/// One piece of a conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn image(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }
}

/// Response of a generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Convenience text, when the backend already flattened it
    pub text: Option<String>,
    /// Raw response body
    pub raw: Value,
}

impl GenerateResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            raw: Value::Null,
        }
    }

    /// Returns `text` when non-empty, then `candidates[0].content.parts[0].text`
    /// of the raw body, then an empty string.
    pub fn extract_text(&self) -> String {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return text.to_string();
        }
        self.raw["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// A remote generative model.
///
/// Implementations make a single attempt per call; retries belong to the
/// caller.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        contents: &[Content],
    ) -> Result<GenerateResponse, ModelError>;
}
