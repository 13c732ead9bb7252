//! Completion Client Port - Interface for the hosted chat-completion API.
//!
//! This port abstracts the single outbound dependency of the core: one
//! request/response call to a chat-completion model. Implementations connect
//! to the real provider (Groq's OpenAI-compatible endpoint) or stand in for
//! it in tests.
//!
//! The upstream transport does not guarantee structured errors, so failures
//! are distinguished by message substring matching only. That shim is
//! deliberately isolated in [`classify_upstream`] so it can be swapped for
//! structured error codes if the provider ever grows them.

use async_trait::async_trait;

use crate::domain::{Message, MessageRole};

/// Port for chat-completion calls.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one completion request and returns the model's text reply.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;

    /// Identifier of the model this client talks to.
    fn model(&self) -> &str;
}

/// Request for one completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Role-tagged messages, in order.
    pub messages: Vec<Message>,
    /// Sampling temperature (low values favor determinism).
    pub temperature: f32,
    /// Output token budget.
    pub max_output_tokens: u32,
    /// Request the provider's native JSON response mode when available.
    pub json_response: bool,
}

impl CompletionRequest {
    /// Creates a request from a message list with conversational defaults.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: 0.4,
            max_output_tokens: 2000,
            json_response: false,
        }
    }

    /// Appends a message.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token budget.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    /// Requests the provider's JSON response mode.
    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Completion call failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    /// API key rejected or unauthorized access.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Provider rate limit hit.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Endpoint or model not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Prompt blew the provider's token budget.
    #[error("token budget exceeded: {0}")]
    TokenBudgetExceeded(String),

    /// Provider returned no usable content.
    #[error("empty response from language model")]
    EmptyCompletion,

    /// Transport-level failure before a response was read.
    #[error("network error: {0}")]
    Network(String),

    /// Anything else the upstream reported.
    #[error("completion failed: {0}")]
    Upstream(String),
}

impl CompletionError {
    /// Returns true if a truncated retry might fit the budget.
    pub fn is_token_budget(&self) -> bool {
        matches!(self, CompletionError::TokenBudgetExceeded(_))
    }
}

/// Classifies an upstream error message by substring.
///
/// Compatibility shim against an unstructured upstream error channel: the
/// provider folds HTTP status codes into free text, so "401"/"404"/"429" and
/// the token-limit phrasing are all we can go on.
pub fn classify_upstream(message: &str) -> CompletionError {
    let text = message.to_lowercase();

    if message.contains("401") {
        CompletionError::AuthenticationFailed(message.to_string())
    } else if message.contains("404") {
        CompletionError::NotFound(message.to_string())
    } else if message.contains("429") {
        CompletionError::RateLimited(message.to_string())
    } else if text.contains("token") && (text.contains("limit") || text.contains("exceed")) {
        CompletionError::TokenBudgetExceeded(message.to_string())
    } else {
        CompletionError::Upstream(message.to_string())
    }
}
