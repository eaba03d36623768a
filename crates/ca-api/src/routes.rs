//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::handlers::{
    chat, chat_complete, create_event, delete_event, health, list_events, update_event,
};
use crate::middleware::auth::auth_middleware;
use crate::server::AppState;

/// Create the API router. Everything under `/api` passes the key check.
pub fn routes(state: AppState) -> Router<AppState> {
    let api = Router::new()
        // Chat endpoints
        .route("/api/chat", post(chat))
        .route("/api/chat/complete", post(chat_complete))
        // Event management
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/{id}", put(update_event).delete(delete_event))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check
        .route("/health", get(health))
        .merge(api)
}
