//! In-memory transcript store.
//!
//! Process-local map keyed by user id, no eviction: unbounded growth is an
//! accepted limitation of this layer. Access is not serialized per user, so
//! concurrent turns for the same id race and the last writer wins.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::Transcript;
use crate::ports::TranscriptStore;

/// HashMap-backed transcript store.
pub struct InMemoryTranscriptStore {
    system_prompt: String,
    transcripts: Mutex<HashMap<String, Transcript>>,
}

impl InMemoryTranscriptStore {
    /// Creates a store whose fresh transcripts start with `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            transcripts: Mutex::new(HashMap::new()),
        }
    }

    fn fresh(&self) -> Transcript {
        Transcript::new(self.system_prompt.clone())
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn get(&self, user_id: &str) -> Transcript {
        let mut map = self.transcripts.lock().unwrap();
        map.entry(user_id.to_string())
            .or_insert_with(|| self.fresh())
            .clone()
    }

    async fn put(&self, user_id: &str, transcript: Transcript) {
        let mut map = self.transcripts.lock().unwrap();
        map.insert(user_id.to_string(), transcript);
    }

    async fn clear(&self, user_id: &str) -> bool {
        let mut map = self.transcripts.lock().unwrap();
        let existed = map.contains_key(user_id);
        if existed {
            map.insert(user_id.to_string(), self.fresh());
        }
        existed
    }
}
