//! LLM API HTTP Client
//!
//! Supports Claude and OpenAI-compatible APIs (Mistral, OpenAI, etc.)

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};

use super::stream::text_stream;
use super::types::*;
use super::{TextGenerator, TextStream};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// LLM API client
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: LlmProvider,
}

impl LlmClient {
    /// Create a new LLM client. Fails with `MissingCredential` when no API key is set.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(Error::MissingCredential);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.effective_base_url(),
            provider: config.provider.clone(),
        })
    }

    /// Create with custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: &LlmConfig, base_url: String) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url;
        Ok(client)
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the provider type
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Build the provider-specific HTTP request
    fn build_request(&self, request: &GenerationRequest, stream: bool) -> RequestBuilder {
        match self.provider {
            LlmProvider::Claude => {
                let url = format!("{}/messages", self.base_url);
                debug!("Sending request to Claude API: {} (stream={})", url, stream);
                self.client
                    .post(url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .header("content-type", "application/json")
                    .json(&MessagesRequest::from_generation(&self.model, request, stream))
            }
            LlmProvider::Mistral | LlmProvider::OpenAi => {
                let url = format!("{}/chat/completions", self.base_url);
                debug!(
                    "Sending request to OpenAI-compatible API: {} (stream={})",
                    url, stream
                );
                self.client
                    .post(url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("content-type", "application/json")
                    .json(&ChatCompletionRequest::from_generation(
                        &self.model,
                        request,
                        stream,
                    ))
            }
        }
    }

    /// Send the request and turn non-2xx statuses into `Error::Upstream`
    async fn send(&self, request: &GenerationRequest, stream: bool) -> Result<Response> {
        let response = self
            .build_request(request, stream)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API error: {} - {}", status, body);
            return Err(Error::Upstream(format!("{}: {}", status, body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn stream_reply(&self, request: GenerationRequest) -> Result<TextStream> {
        let response = self.send(&request, true).await?;
        info!(
            "Streaming reply from {:?} model {}",
            self.provider, self.model
        );
        Ok(text_stream(
            Box::pin(response.bytes_stream()),
            self.provider.clone(),
        ))
    }

    async fn complete(&self, request: GenerationRequest) -> Result<Completion> {
        let response = self.send(&request, false).await?;
        let body = response.text().await.map_err(Error::Http)?;

        let completion = match self.provider {
            LlmProvider::Claude => {
                let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
                    Error::Upstream(format!("Failed to parse response: {} - {}", e, body))
                })?;
                parsed.into_completion()
            }
            LlmProvider::Mistral | LlmProvider::OpenAi => {
                let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
                    Error::Upstream(format!("Failed to parse response: {} - {}", e, body))
                })?;
                parsed.into_completion()
            }
        };

        info!(
            "LLM API response: {} chars, tokens={}",
            completion.text.len(),
            completion.usage.map(|u| u.output_tokens).unwrap_or(0)
        );

        Ok(completion)
    }
}
