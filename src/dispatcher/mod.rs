//! Request Dispatcher
//!
//! Runs the `analyze` and `chat` operations: validation, the fingerprint cache
//! for analyze, the retried remote call, and extraction of the JSON result.
//!
//! Validation always happens before the remote call and is never retried.
//! Only the model call itself runs under the retry policy.

mod conversation;
mod extract;

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::cache::{fingerprint, SharedCache};
use crate::error::{GatewayError, Result};
use crate::media::{decode_image, detect_mime_type};
use crate::model::{Content, GenerativeModel, Part, ROLE_USER};
use crate::models::{AnalyzeRequest, ChatRequest};
use crate::prompts::build_analyze_prompt;
use crate::retry::RetryPolicy;

pub use conversation::{build_conversation, normalize_role, Conversation, ACKNOWLEDGEMENT};
pub use extract::extract_json;

/// Routes validated payloads to the remote model.
#[derive(Clone)]
pub struct Dispatcher {
    model: Arc<dyn GenerativeModel>,
    model_name: String,
    cache: SharedCache,
    retry: RetryPolicy,
    max_image_bytes: Option<usize>,
}

impl Dispatcher {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        model_name: impl Into<String>,
        cache: SharedCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            cache,
            retry,
            max_image_bytes: None,
        }
    }

    /// Rejects decoded images larger than `max_bytes`.
    pub fn with_max_image_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_image_bytes = max_bytes;
        self
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == Analyze ==
    /// Analyzes a plant photo.
    ///
    /// Results are cached by image fingerprint, so a repeated image is answered
    /// without calling the model.
    pub async fn analyze(&self, payload: &Map<String, Value>) -> Result<Map<String, Value>> {
        let request = AnalyzeRequest::from_payload(payload);

        let encoded = request
            .image_base64
            .as_deref()
            .ok_or_else(|| GatewayError::BadRequest("image_base64 is required".to_string()))?;

        let image = decode_image(encoded).map_err(|e| {
            GatewayError::BadRequest(format!("image_base64 is not valid base64: {}", e))
        })?;

        if let Some(max_bytes) = self.max_image_bytes {
            if image.len() > max_bytes {
                return Err(GatewayError::BadRequest("image exceeds max size".to_string()));
            }
        }

        let key = fingerprint(&image);
        let cached = self.cache.write().await.get(&key);
        if let Some(result) = cached {
            debug!(fingerprint = %key, "Analysis cache hit");
            return Ok(result);
        }
        debug!(fingerprint = %key, size = image.len(), "Analysis cache miss");

        let mime_type = detect_mime_type(&image);
        let prompt = build_analyze_prompt(&request.context);
        let contents = vec![Content::new(
            ROLE_USER,
            vec![Part::image(mime_type, image), Part::text(prompt)],
        )];

        let text = self.generate(&contents).await?;
        let result = extract_json(&text)?;

        self.cache.write().await.set(key, result.clone());
        info!(mime_type, "Analysis completed");
        Ok(result)
    }

    // == Chat ==
    /// Answers a chat turn. Chat results are never cached.
    pub async fn chat(&self, payload: &Map<String, Value>) -> Result<Map<String, Value>> {
        let request = ChatRequest::from_payload(payload)?;
        debug!(
            messages = request.messages.len(),
            context = ?request.context,
            "Chat request received"
        );

        let conversation = build_conversation(&request);
        debug!(
            turns = conversation.contents.len(),
            dropped_images = conversation.dropped_images.len(),
            "Conversation assembled"
        );

        let text = self.generate(&conversation.contents).await?;
        extract_json(&text)
    }

    /// Calls the model under the retry policy and returns the response text.
    async fn generate(&self, contents: &[Content]) -> Result<String> {
        let response = self
            .retry
            .execute(|| self.model.generate(&self.model_name, contents))
            .await?;
        Ok(response.extract_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shared, CacheStore};
    use crate::error::ModelError;
    use crate::model::GenerateResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Model that replays scripted replies and records every call.
    #[derive(Default)]
    struct ScriptedModel {
        replies: Mutex<VecDeque<std::result::Result<String, ModelError>>>,
        calls: Mutex<Vec<(String, Vec<Content>)>>,
    }

    impl ScriptedModel {
        fn with_replies(replies: Vec<std::result::Result<String, ModelError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::default(),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(
            &self,
            model: &str,
            contents: &[Content],
        ) -> std::result::Result<GenerateResponse, ModelError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), contents.to_vec()));
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(Ok(text)) => Ok(GenerateResponse::from_text(text)),
                Some(Err(e)) => Err(e),
                None => Err(ModelError::MalformedResponse("no scripted reply".to_string())),
            }
        }
    }

    fn api_error() -> ModelError {
        ModelError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }
    }

    fn dispatcher(model: Arc<ScriptedModel>) -> Dispatcher {
        Dispatcher::new(
            model,
            "gemini-test",
            shared(CacheStore::new(10, 3600)),
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
    }

    fn payload(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    // "iVBORw0KGgo=" is the 8-byte PNG signature
    const PNG_B64: &str = "iVBORw0KGgo=";

    #[tokio::test]
    async fn test_analyze_requires_image() {
        let model = ScriptedModel::with_replies(vec![]);
        let d = dispatcher(model.clone());

        for body in [json!({}), json!({ "image_base64": "" }), json!({ "image_base64": 42 })] {
            let err = d.analyze(&payload(body)).await.unwrap_err();
            assert!(matches!(err, GatewayError::BadRequest(msg) if msg == "image_base64 is required"));
        }
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_rejects_undecodable_image() {
        let model = ScriptedModel::with_replies(vec![]);
        let d = dispatcher(model.clone());

        let err = d
            .analyze(&payload(json!({ "image_base64": "%%%" })))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::BadRequest(_)));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_enforces_size_limit() {
        let model = ScriptedModel::with_replies(vec![]);
        let d = dispatcher(model.clone()).with_max_image_bytes(Some(4));

        let err = d
            .analyze(&payload(json!({ "image_base64": PNG_B64 })))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::BadRequest(msg) if msg == "image exceeds max size"));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_builds_request_and_caches_result() {
        let model = ScriptedModel::with_replies(vec![Ok(
            "```json\n{\"status\":\"healthy\",\"confidence\":0.92}\n```".to_string(),
        )]);
        let d = dispatcher(model.clone()).with_max_image_bytes(Some(8));
        let body = payload(json!({ "image_base64": PNG_B64, "plant_name": "Fern" }));

        let first = d.analyze(&body).await.unwrap();
        let second = d.analyze(&body).await.unwrap();

        assert_eq!(first["status"], "healthy");
        assert_eq!(first, second);
        assert_eq!(model.call_count(), 1);

        {
            let calls = model.calls.lock().unwrap();
            let (model_name, contents) = &calls[0];
            assert_eq!(model_name, "gemini-test");
            assert_eq!(contents.len(), 1);
            assert_eq!(contents[0].role, "user");
            assert_eq!(
                contents[0].parts[0],
                Part::image("image/png", b"\x89PNG\r\n\x1a\n".to_vec())
            );
            assert!(
                matches!(&contents[0].parts[1], Part::Text(t) if t.contains("- plant_name: Fern"))
            );
        }

        let stats = d.cache().read().await.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_analyze_retries_transient_failures() {
        let model = ScriptedModel::with_replies(vec![
            Err(api_error()),
            Err(api_error()),
            Ok("{\"status\":\"critical\"}".to_string()),
        ]);
        let d = dispatcher(model.clone());

        let result = d
            .analyze(&payload(json!({ "image_base64": PNG_B64 })))
            .await
            .unwrap();

        assert_eq!(result["status"], "critical");
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn test_analyze_surfaces_last_error_after_retries() {
        let model = ScriptedModel::with_replies(vec![
            Err(api_error()),
            Err(api_error()),
            Err(ModelError::MissingApiKey),
            Ok("{}".to_string()),
        ]);
        let d = dispatcher(model.clone());

        let err = d
            .analyze(&payload(json!({ "image_base64": PNG_B64 })))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Upstream(ModelError::MissingApiKey)));
        assert_eq!(model.call_count(), 3);
        assert!(d.cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_unparseable_reply_is_not_cached() {
        let model = ScriptedModel::with_replies(vec![
            Ok("I cannot tell.".to_string()),
            Ok("{\"status\":\"healthy\"}".to_string()),
        ]);
        let d = dispatcher(model.clone());
        let body = payload(json!({ "image_base64": PNG_B64 }));

        let err = d.analyze(&body).await.unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));

        let result = d.analyze(&body).await.unwrap();
        assert_eq!(result["status"], "healthy");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_chat_requires_message_list() {
        let model = ScriptedModel::with_replies(vec![]);
        let d = dispatcher(model.clone());

        let err = d
            .chat(&payload(json!({ "messages": { "role": "user" } })))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::BadRequest(msg) if msg == "messages must be a list"));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_is_never_cached() {
        let model = ScriptedModel::with_replies(vec![
            Ok("{\"reply\":\"one\"}".to_string()),
            Ok("{\"reply\":\"two\"}".to_string()),
        ]);
        let d = dispatcher(model.clone());
        let body = payload(json!({
            "messages": [
                { "role": "user", "content": "Hi" },
                { "role": "assistant", "content": "Hello" },
                { "role": "user", "content": "Help", "image_base64": "@@bad@@" }
            ],
            "plant_context": { "plant_name": "Ivy" }
        }));

        assert_eq!(d.chat(&body).await.unwrap()["reply"], "one");
        assert_eq!(d.chat(&body).await.unwrap()["reply"], "two");
        assert_eq!(model.call_count(), 2);
        assert!(d.cache().read().await.is_empty());

        let calls = model.calls.lock().unwrap();
        // Two preamble turns, then the three messages
        let contents = &calls[0].1;
        let roles: Vec<&str> = contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "model", "user", "model", "user"]);
        assert_eq!(contents[4].parts, vec![Part::text("Help")]);
    }

    #[tokio::test]
    async fn test_chat_empty_history_still_calls_model() {
        let model = ScriptedModel::with_replies(vec![Ok("{\"reply\":\"?\"}".to_string())]);
        let d = dispatcher(model.clone());

        let result = d.chat(&payload(json!({ "messages": [] }))).await.unwrap();

        assert_eq!(result["reply"], "?");
        assert!(model.calls.lock().unwrap()[0].1.is_empty());
    }

    /// Model that parks inside `generate` until released.
    #[derive(Default)]
    struct GatedModel {
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl GenerativeModel for GatedModel {
        async fn generate(
            &self,
            _model: &str,
            _contents: &[Content],
        ) -> std::result::Result<GenerateResponse, ModelError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(GenerateResponse::from_text("{\"status\":\"healthy\"}"))
        }
    }

    #[tokio::test]
    async fn test_cache_is_unlocked_during_model_call() {
        let model = Arc::new(GatedModel::default());
        let d = Dispatcher::new(
            model.clone(),
            "gemini-test",
            shared(CacheStore::new(10, 3600)),
            RetryPolicy::new(0, Duration::ZERO),
        );

        let task = {
            let d = d.clone();
            tokio::spawn(async move {
                d.analyze(&payload(json!({ "image_base64": PNG_B64 }))).await
            })
        };
        model.entered.notified().await;

        let guard = tokio::time::timeout(Duration::from_secs(1), d.cache().write()).await;
        assert!(guard.is_ok(), "cache lock held across the model call");
        drop(guard);

        model.release.notify_one();
        let result = task.await.unwrap().unwrap();
        assert_eq!(result["status"], "healthy");
        assert_eq!(d.cache().read().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_is_unlocked_during_backoff() {
        let model = ScriptedModel::with_replies(vec![
            Err(api_error()),
            Ok("{\"status\":\"healthy\"}".to_string()),
        ]);
        let d = Dispatcher::new(
            model.clone(),
            "gemini-test",
            shared(CacheStore::new(10, 3600)),
            RetryPolicy::new(1, Duration::from_secs(60)),
        );

        let task = {
            let d = d.clone();
            tokio::spawn(async move {
                d.analyze(&payload(json!({ "image_base64": PNG_B64 }))).await
            })
        };
        // The first attempt fails and the task parks in its 60s backoff sleep
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(model.call_count(), 1);

        let guard = tokio::time::timeout(Duration::from_millis(1), d.cache().write()).await;
        assert!(guard.is_ok(), "cache lock held across the backoff sleep");
        drop(guard);

        let result = task.await.unwrap().unwrap();
        assert_eq!(result["status"], "healthy");
        assert_eq!(model.call_count(), 2);
    }
}
