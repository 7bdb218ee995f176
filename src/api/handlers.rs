//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::Method, Json};
use serde_json::{Map, Value};

use crate::cache::{shared, CacheStore};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{GatewayError, ModelError, Result};
use crate::model::GeminiClient;
use crate::models::{HealthResponse, StatsResponse};

/// Default request body limit (base64 images are large).
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Runs analyze and chat; owns the shared analysis cache
    pub dispatcher: Dispatcher,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Creates a new AppState around a dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the cache, the Gemini client and the dispatcher from the Config.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ModelError> {
        let cache = shared(CacheStore::new(
            config.cache_max_size,
            config.cache_ttl_seconds,
        ));
        let client = GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_api_base.clone(),
        )?;
        let dispatcher = Dispatcher::new(
            Arc::new(client),
            config.gemini_model.clone(),
            cache,
            config.retry_policy(),
        )
        .with_max_image_bytes(config.max_image_bytes);

        Ok(Self::new(dispatcher).with_max_body_bytes(config.max_body_bytes))
    }
}

/// Parses a request body that must be a JSON object.
fn parse_payload(body: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(GatewayError::InvalidJson),
    }
}

/// Handler for POST /analyze
///
/// Analyzes a base64 plant photo; repeated images are served from the cache.
pub async fn analyze_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Map<String, Value>>> {
    let payload = parse_payload(&body)?;
    let result = state.dispatcher.analyze(&payload).await?;
    Ok(Json(result))
}

/// Handler for POST /chat
///
/// Answers a plant care conversation.
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Map<String, Value>>> {
    let payload = parse_payload(&body)?;
    let result = state.dispatcher.chat(&payload).await?;
    Ok(Json(result))
}

/// Handler for GET /stats
///
/// Returns analysis cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.dispatcher.cache().read().await.stats();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for a known path hit with the wrong method.
pub async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}

/// Fallback for unknown paths.
///
/// Non-POST requests are rejected as 405 and a POST body must still be a JSON
/// object before the path is reported as unknown.
pub async fn unknown_route(method: Method, body: Bytes) -> GatewayError {
    if method != Method::POST {
        return GatewayError::MethodNotAllowed;
    }
    match parse_payload(&body) {
        Ok(_) => GatewayError::NotFound,
        Err(e) => e,
    }
}
