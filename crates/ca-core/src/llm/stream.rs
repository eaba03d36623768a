//! Server-Sent Events decoding for streamed replies

use std::collections::VecDeque;

use futures::{Stream, StreamExt, stream};
use tracing::debug;

use crate::config::LlmProvider;
use crate::error::{Error, Result};

use super::TextStream;
use super::types::{ChatCompletionChunk, ClaudeDelta, ClaudeStreamEvent};

/// Incremental SSE line decoder.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
/// input is buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the `data:` payloads of every completed line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(data) = data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a final line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    line.strip_prefix("data:")
        .map(|data| data.strip_prefix(' ').unwrap_or(data).to_string())
}

/// What a single `data:` payload means for the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    Text(String),
    Done,
    Ignore,
}

/// Interpret one SSE payload for the given provider
pub fn parse_delta(provider: &LlmProvider, data: &str) -> Result<Delta> {
    match provider {
        LlmProvider::Claude => match serde_json::from_str::<ClaudeStreamEvent>(data) {
            Ok(ClaudeStreamEvent::ContentBlockDelta {
                delta: ClaudeDelta::TextDelta { text },
            }) => Ok(Delta::Text(text)),
            Ok(ClaudeStreamEvent::MessageStop) => Ok(Delta::Done),
            Ok(ClaudeStreamEvent::Error { error }) => Err(Error::Upstream(format!(
                "{}: {}",
                error.error_type, error.message
            ))),
            Ok(_) => Ok(Delta::Ignore),
            Err(e) => {
                debug!("Skipping unparsable stream event: {} - {}", e, data);
                Ok(Delta::Ignore)
            }
        },
        LlmProvider::Mistral | LlmProvider::OpenAi => {
            if data.trim() == "[DONE]" {
                return Ok(Delta::Done);
            }
            match serde_json::from_str::<ChatCompletionChunk>(data) {
                Ok(chunk) => Ok(chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .map(Delta::Text)
                    .unwrap_or(Delta::Ignore)),
                Err(e) => {
                    debug!("Skipping unparsable stream chunk: {} - {}", e, data);
                    Ok(Delta::Ignore)
                }
            }
        }
    }
}

struct SseState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    provider: LlmProvider,
    finished: bool,
}

/// Turn a streamed SSE response body into a stream of text chunks.
///
/// The stream ends at the provider's terminal event, at the end of the body,
/// or right after the first error.
pub fn text_stream<S, B, E>(bytes: S, provider: LlmProvider) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    let state = SseState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        provider,
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                match parse_delta(&state.provider, &data) {
                    Ok(Delta::Text(text)) if text.is_empty() => continue,
                    Ok(Delta::Text(text)) => return Some((Ok(text), state)),
                    Ok(Delta::Ignore) => continue,
                    Ok(Delta::Done) => {
                        state.pending.clear();
                        state.finished = true;
                        continue;
                    }
                    Err(e) => {
                        state.pending.clear();
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                }
            }

            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(chunk.as_ref());
                    state.pending.extend(payloads);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    }))
}
