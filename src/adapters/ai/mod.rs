//! Completion client adapters.

pub mod groq_client;
pub mod mock_client;

pub use groq_client::{GroqClient, GroqConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use mock_client::MockCompletionClient;
