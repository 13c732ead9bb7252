//! Groq Completion Client - talks to Groq's OpenAI-compatible chat API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GroqConfig::new(api_key)
//!     .with_model("llama3-8b-8192")
//!     .with_base_url("https://api.groq.com/openai/v1");
//!
//! let client = GroqClient::new(config)?;
//! ```
//!
//! The core performs no retries, so neither does this client: a failed call
//! is classified and surfaced immediately.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{Message, MessageRole};
use crate::ports::{classify_upstream, CompletionClient, CompletionError, CompletionRequest};

/// Default model served by Groq's free tier.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
/// Groq's OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for the Groq client.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// API key for bearer authentication.
    api_key: Secret<String>,
    /// Model identifier.
    pub model: String,
    /// API root URL.
    pub base_url: String,
    /// Transport timeout; the core imposes no deadline of its own.
    pub timeout: Duration,
}

impl GroqConfig {
    /// Creates a configuration with the given API key and defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API root URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Completion client for Groq's chat completions endpoint.
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

impl GroqClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: GroqConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        WireRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        MessageRole::System => "system",
                        MessageRole::User => "user",
                        MessageRole::Assistant => "assistant",
                    }
                    .to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            response_format: request
                .json_response
                .then(|| ResponseFormat {
                    format_type: "json_object".to_string(),
                }),
        }
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let wire = self.to_wire_request(&request);
        tracing::debug!(
            model = %self.config.model,
            messages = wire.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    CompletionError::Network(e.to_string())
                } else {
                    classify_upstream(&e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The status code rides along in the text so the substring
            // classifier can see it, matching the upstream error channel.
            let message = format!("Error code: {} - {}", status.as_u16(), body);
            tracing::warn!(%status, "completion request rejected");
            return Err(classify_upstream(&message));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Upstream(format!("malformed response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(CompletionError::EmptyCompletion);
        }

        Ok(content)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ----- Wire types (OpenAI-compatible) -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
}
