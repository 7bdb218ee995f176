//! API Module
//!
//! HTTP handlers and routing for the plant gateway REST API.
//!
//! # Endpoints
//! - `POST /analyze` - Analyze a plant photo
//! - `POST /chat` - Plant care conversation
//! - `GET /stats` - Analysis cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
