//! Transcript Store Port - per-user conversation history.
//!
//! Re-architecture of a process-wide transcript map into an explicit store
//! interface injected into the boundary layer. The core never touches this;
//! it only receives and returns transcript copies.
//!
//! Concurrent turns for the same user id are a documented race: the store
//! does not serialize per-user access and the last writer wins.

use async_trait::async_trait;

use crate::domain::Transcript;

/// Port for per-user transcript storage.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Returns the user's transcript, initializing a fresh one (system
    /// message only) on first access.
    async fn get(&self, user_id: &str) -> Transcript;

    /// Replaces the user's transcript.
    async fn put(&self, user_id: &str, transcript: Transcript);

    /// Resets the user's transcript to the initial system message.
    ///
    /// Returns true if a transcript existed for this user.
    async fn clear(&self, user_id: &str) -> bool;
}
