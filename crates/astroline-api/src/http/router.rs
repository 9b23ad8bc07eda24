//! Axum router configuration with middleware.
//!
//! Chat routes live under `/api/v1/chat`, account routes under
//! `/api/v1/account`. `/health` is unauthenticated.
//! Middleware: CORS (configured origins, or any), tracing.

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let chat_routes = Router::new()
        .route("/", get(handlers::chat::history))
        .route(
            "/sessions",
            post(handlers::chat::create_session).get(handlers::chat::list_sessions),
        )
        .route("/sessions/{id}", delete(handlers::chat::delete_session))
        .route(
            "/sessions/{id}/messages",
            post(handlers::chat::send_message).get(handlers::chat::get_messages),
        )
        .route("/sessions/{id}/end", post(handlers::chat::end_session));

    let api_routes = Router::new()
        .nest("/chat", chat_routes)
        .route("/account", delete(handlers::account::delete_account));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins. An empty list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
