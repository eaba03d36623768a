//! LLM API client and types
//!
//! Supports Claude and OpenAI-compatible APIs (Mistral, OpenAI, etc.),
//! both as a single completion and as a stream of text chunks.

mod client;
mod stream;
mod types;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::Result;

pub use client::LlmClient;
pub use stream::{Delta, SseDecoder, parse_delta, text_stream};
pub use types::*;

/// Text chunks of a reply, in arrival order
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Source of assistant replies
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Start a streamed reply
    async fn stream_reply(&self, request: GenerationRequest) -> Result<TextStream>;

    /// Generate a full reply in one request
    async fn complete(&self, request: GenerationRequest) -> Result<Completion>;
}
