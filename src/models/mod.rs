//! Request and Response models for the gateway API
//!
//! Inbound payloads are free-form JSON objects; these types pull out the fields
//! the dispatcher and prompt builders need.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AnalyzeRequest, ChatMessage, ChatRequest, PlantContext};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
