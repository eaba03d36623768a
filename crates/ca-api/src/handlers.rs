//! HTTP API handlers
//!
//! Request handlers for the chat endpoints and event management.

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ca_core::{
    Category, ChatMessage, Event, EventFields, EventId, GenerationRequest, Role, TextStream,
    ingest_reply, render_reply, system_prompt,
};

use crate::error::{ApiError, Result, UNAVAILABLE_MESSAGE};
use crate::server::{AppState, SharedEventStore};

// ============================================================================
// Request/Response types
// ============================================================================

/// Chat request payload
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation history, oldest first
    pub messages: Vec<ChatMessage>,
}

/// Non-streaming chat response
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub role: Role,
    /// Raw reply text
    pub content: String,
    /// Reply text with any event block removed
    pub display: String,
    /// Event added to the store from this reply
    pub event: Option<Event>,
}

/// Event create/update payload
#[derive(Debug, Deserialize)]
pub struct EventInput {
    pub title: String,
    pub time: String,
    pub duration: String,
    pub category: Category,
}

impl EventInput {
    fn into_fields(self) -> Result<EventFields> {
        EventFields::new(self.title, self.time, self.duration, self.category)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Chat endpoint - stream the assistant reply as plain text
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Response> {
    debug!("Chat request: {} messages", req.messages.len());

    let Some(generator) = state.generator.clone() else {
        warn!("LLM API key not configured, returning fallback reply");
        return Ok(Json(ChatMessage::assistant(UNAVAILABLE_MESSAGE)).into_response());
    };

    let request = generation_request(&state, req.messages).await;
    let chunks = generator.stream_reply(request).await?;

    let body = Body::from_stream(ingest_on_completion(chunks, state.events.clone()));
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

/// Chat endpoint - return the whole reply with its display text and event
pub async fn chat_complete(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<CompletionResponse>> {
    debug!("Chat completion request: {} messages", req.messages.len());

    let Some(generator) = state.generator.clone() else {
        warn!("LLM API key not configured, returning fallback reply");
        return Ok(Json(CompletionResponse {
            role: Role::Assistant,
            content: UNAVAILABLE_MESSAGE.to_string(),
            display: UNAVAILABLE_MESSAGE.to_string(),
            event: None,
        }));
    };

    let request = generation_request(&state, req.messages).await;
    let completion = generator.complete(request).await?;

    let event = {
        let mut store = state.events.write().await;
        ingest_reply(&mut store, &completion.text)
    };

    Ok(Json(CompletionResponse {
        role: Role::Assistant,
        display: render_reply(&completion.text).display_text(),
        content: completion.text,
        event,
    }))
}

/// List all events in display order
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.events.read().await.list().to_vec())
}

/// Create an event
pub async fn create_event(
    State(state): State<AppState>,
    Json(input): Json<EventInput>,
) -> Result<(StatusCode, Json<Event>)> {
    let fields = input.into_fields()?;
    let event = state.events.write().await.add(fields);
    info!("Created event {} ({})", event.id, event.fields.title());
    Ok((StatusCode::CREATED, Json(event)))
}

/// Replace the fields of an existing event
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EventInput>,
) -> Result<Json<Event>> {
    let event = Event::new(id, input.into_fields()?);
    if !state.events.write().await.update(event.clone()) {
        return Err(ApiError::EventNotFound(event.id.to_string()));
    }
    info!("Updated event {}", event.id);
    Ok(Json(event))
}

/// Delete an event
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = EventId::from(id);
    if !state.events.write().await.remove(&id) {
        return Err(ApiError::EventNotFound(id.to_string()));
    }
    info!("Deleted event {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helpers
// ============================================================================

async fn generation_request(state: &AppState, messages: Vec<ChatMessage>) -> GenerationRequest {
    let today = chrono::Local::now().date_naive();
    let system = system_prompt(state.events.read().await.list(), today);

    GenerationRequest {
        system,
        messages,
        max_tokens: state.config.llm.max_tokens,
    }
}

struct ReplyState {
    chunks: TextStream,
    transcript: String,
    events: SharedEventStore,
}

/// Pass reply chunks through, then ingest the full reply once the stream ends.
///
/// If the stream fails or is dropped early the partial reply is discarded.
pub fn ingest_on_completion(
    chunks: TextStream,
    events: SharedEventStore,
) -> impl Stream<Item = ca_core::Result<String>> + Send + 'static {
    let state = ReplyState {
        chunks,
        transcript: String::new(),
        events,
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        match state.chunks.next().await {
            Some(Ok(chunk)) => {
                state.transcript.push_str(&chunk);
                Some((Ok(chunk), Some(state)))
            }
            Some(Err(e)) => {
                warn!("Reply stream interrupted, discarding partial reply: {}", e);
                Some((Err(e), None))
            }
            None => {
                let mut store = state.events.write().await;
                ingest_reply(&mut store, &state.transcript);
                None
            }
        }
    })
}
