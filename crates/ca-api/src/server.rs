//! HTTP API Server
//!
//! Builds the router and runs the axum-based HTTP server.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use ca_core::{ApiConfig, Config, EventStore, TextGenerator};

use crate::routes::routes;

/// Event store shared between handlers
pub type SharedEventStore = Arc<RwLock<EventStore>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when no LLM credential is configured (degraded mode)
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub events: SharedEventStore,
}

impl AppState {
    pub fn new(
        config: Config,
        generator: Option<Arc<dyn TextGenerator>>,
        events: EventStore,
    ) -> Self {
        Self {
            config,
            generator,
            events: Arc::new(RwLock::new(events)),
        }
    }
}

/// Build the application router with CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes(state.clone()))
        .layer(cors_layer(&state.config.api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .flatten()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Start the HTTP API server
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let port = state.config.api.port;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
