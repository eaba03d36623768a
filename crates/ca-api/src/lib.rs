//! ca-api: HTTP API for Calendar Assistant
//!
//! Provides the chat endpoint that streams assistant replies and
//! REST endpoints over the shared event store.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, SharedEventStore, build_router, start_server};
