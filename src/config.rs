//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::api::DEFAULT_MAX_BODY_BYTES;
use crate::model::DEFAULT_API_BASE;
use crate::retry::RetryPolicy;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Gemini API key; calls fail without it
    pub gemini_api_key: Option<String>,
    /// Model name passed to generateContent
    pub gemini_model: String,
    /// Gemini REST base URL
    pub gemini_api_base: String,
    /// Upper bound for decoded image size, unlimited when None
    pub max_image_bytes: Option<usize>,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
    /// Maximum number of cached analysis results
    pub cache_max_size: usize,
    /// Cached result lifetime in seconds
    pub cache_ttl_seconds: u64,
    /// Seconds between background expiry sweeps, 0 disables the sweep
    pub cache_sweep_interval: u64,
    /// Retries after the first failed model call
    pub retry_max_retries: u32,
    /// First backoff delay in milliseconds
    pub retry_initial_delay_ms: u64,
    /// Backoff cap in milliseconds, uncapped when None
    pub retry_max_delay_ms: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `GEMINI_API_KEY` - Gemini API key (default: unset)
    /// - `GEMINI_MODEL` - Model name (default: gemini-3-flash-preview)
    /// - `GEMINI_API_BASE` - REST base URL (default: public v1beta endpoint)
    /// - `MAX_IMAGE_BYTES` - Decoded image size limit (default: unlimited)
    /// - `MAX_BODY_BYTES` - Request body size limit (default: 25 MiB)
    /// - `CACHE_MAX_SIZE` - Cache capacity (default: 100)
    /// - `CACHE_TTL_SECONDS` - Cache TTL (default: 3600)
    /// - `CACHE_SWEEP_INTERVAL` - Expiry sweep period in seconds (default: 0, off)
    /// - `RETRY_MAX_RETRIES` - Retries per model call (default: 2)
    /// - `RETRY_INITIAL_DELAY_MS` - First backoff delay (default: 800)
    /// - `RETRY_MAX_DELAY_MS` - Backoff cap (default: uncapped)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.gemini_model),
            gemini_api_base: env::var("GEMINI_API_BASE")
                .ok()
                .filter(|b| !b.is_empty())
                .unwrap_or(defaults.gemini_api_base),
            max_image_bytes: parse_var("MAX_IMAGE_BYTES"),
            max_body_bytes: parse_var("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            cache_max_size: parse_var("CACHE_MAX_SIZE").unwrap_or(defaults.cache_max_size),
            cache_ttl_seconds: parse_var("CACHE_TTL_SECONDS")
                .unwrap_or(defaults.cache_ttl_seconds),
            cache_sweep_interval: parse_var("CACHE_SWEEP_INTERVAL")
                .unwrap_or(defaults.cache_sweep_interval),
            retry_max_retries: parse_var("RETRY_MAX_RETRIES")
                .unwrap_or(defaults.retry_max_retries),
            retry_initial_delay_ms: parse_var("RETRY_INITIAL_DELAY_MS")
                .unwrap_or(defaults.retry_initial_delay_ms),
            retry_max_delay_ms: parse_var("RETRY_MAX_DELAY_MS"),
        }
    }

    /// Retry policy described by the retry settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(
            self.retry_max_retries,
            Duration::from_millis(self.retry_initial_delay_ms),
        );
        match self.retry_max_delay_ms {
            Some(ms) => policy.with_max_delay(Duration::from_millis(ms)),
            None => policy,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            gemini_api_key: None,
            gemini_model: "gemini-3-flash-preview".to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            max_image_bytes: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cache_max_size: 100,
            cache_ttl_seconds: 3600,
            cache_sweep_interval: 0,
            retry_max_retries: 2,
            retry_initial_delay_ms: 800,
            retry_max_delay_ms: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("cache_max_size", &self.cache_max_size)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("cache_sweep_interval", &self.cache_sweep_interval)
            .field("retry_max_retries", &self.retry_max_retries)
            .field("retry_initial_delay_ms", &self.retry_initial_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .finish()
    }
}
