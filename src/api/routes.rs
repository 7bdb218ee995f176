//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    analyze_handler, chat_handler, health_handler, method_not_allowed, stats_handler,
    unknown_route, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /analyze` - Analyze a plant photo
/// - `POST /chat` - Plant care conversation
/// - `GET /stats` - Analysis cache statistics
/// - `GET /health` - Health check endpoint
///
/// Wrong methods answer 405 and unknown paths 404, both with the JSON error
/// envelope.
///
/// # Middleware
/// - Body limit: `AppState::max_body_bytes`
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(analyze_handler).fallback(method_not_allowed))
        .route("/chat", post(chat_handler).fallback(method_not_allowed))
        .route("/stats", get(stats_handler).fallback(method_not_allowed))
        .route("/health", get(health_handler).fallback(method_not_allowed))
        .fallback(unknown_route)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
