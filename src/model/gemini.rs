//! Gemini REST client.
//!
//! Calls `models/{model}:generateContent` with the API key as a query
//! parameter. Images travel as base64 `inlineData` parts.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ModelError;

use super::{Content, GenerateResponse, GenerativeModel, Part};

/// Default Gemini v1beta REST API base.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    api_key: Option<String>,
    api_base: String,
    client: Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiClient {
    /// Builds a client. Without an API key every call fails with
    /// [`ModelError::MissingApiKey`].
    pub fn new(api_key: Option<String>, api_base: impl Into<String>) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn api_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    /// Builds the `generateContent` request body.
    pub fn build_request_body(contents: &[Content]) -> Value {
        let contents: Vec<Value> = contents
            .iter()
            .map(|content| {
                let parts: Vec<Value> = content
                    .parts
                    .iter()
                    .map(|part| match part {
                        Part::Text(text) => json!({ "text": text }),
                        Part::InlineData { mime_type, data } => json!({
                            "inlineData": {
                                "mimeType": mime_type,
                                "data": STANDARD.encode(data),
                            }
                        }),
                    })
                    .collect();
                json!({ "role": content.role, "parts": parts })
            })
            .collect();

        json!({ "contents": contents })
    }

    /// Joins the text of all non-thought parts of the first candidate.
    pub fn extract_text(response: &Value) -> Option<String> {
        let parts = response["candidates"][0]["content"]["parts"].as_array()?;
        let text: String = parts
            .iter()
            .filter(|p| !p["thought"].as_bool().unwrap_or(false))
            .filter_map(|p| p["text"].as_str())
            .collect();
        Some(text).filter(|t| !t.is_empty())
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        contents: &[Content],
    ) -> Result<GenerateResponse, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::MissingApiKey)?;
        let body = Self::build_request_body(contents);

        debug!(model, turns = contents.len(), "Gemini generateContent request");

        let response = self
            .client
            .post(self.api_url(model))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: Self::error_message(&error_text),
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.without_url().to_string()))?;

        Ok(GenerateResponse {
            text: Self::extract_text(&raw),
            raw,
        })
    }
}
