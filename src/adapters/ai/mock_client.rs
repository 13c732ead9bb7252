//! Mock Completion Client for testing.
//!
//! Configurable implementation of the [`CompletionClient`] port so tests can
//! run without calling the real API: queued replies and errors, consumed in
//! order, plus call recording for prompt assertions.
//!
//! # Example
//!
//! ```ignore
//! let client = MockCompletionClient::new()
//!     .with_reply("Hello, I'm the assistant!")
//!     .with_error(CompletionError::EmptyCompletion);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{CompletionClient, CompletionError, CompletionRequest};

/// Scripted completion client.
///
/// When the queue runs dry, further calls return a fixed fallback reply so
/// tests that don't care about content keep working.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionClient {
    responses: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: CompletionError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Requests seen so far, in order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(request);

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("mock reply".to_string()))
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
