//! Plant Gateway - HTTP gateway in front of a generative vision model
//!
//! Analyzes plant photos and answers care questions, with an LRU + TTL cache
//! for repeated analyses and retry with exponential backoff for model calls.

pub mod api;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod media;
pub mod model;
pub mod models;
pub mod prompts;
pub mod retry;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use tasks::spawn_expiry_sweep;
