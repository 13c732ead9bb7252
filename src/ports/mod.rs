//! Ports - interfaces between the core and its external collaborators.

pub mod completion_client;
pub mod transcript_store;

pub use completion_client::{
    classify_upstream, CompletionClient, CompletionError, CompletionRequest,
};
pub use transcript_store::TranscriptStore;
