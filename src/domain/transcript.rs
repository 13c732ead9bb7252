//! Conversation transcript types.
//!
//! A [`Transcript`] is the ordered message history for one user's
//! consultation. The first message is always the fixed system instruction;
//! after that the roles alternate user/assistant in well-formed operation,
//! but caller-supplied transcripts may violate that and must not crash
//! anything downstream.

use serde::{Deserialize, Serialize};

/// Keywords that mark pain-related symptoms in user messages.
const PAIN_KEYWORDS: &[&str] = &[
    "pain",
    "hurt",
    "ache",
    "sore",
    "tender",
    "stiff",
    "cramp",
    "throbbing",
    "sharp",
    "dull",
    "burning",
    "stabbing",
    "aching",
];

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Ordered message history for one user's consultation.
///
/// The core never mutates a caller's transcript in place: operations take a
/// reference, work on a clone, and hand back the updated copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates a transcript seeded with the fixed system instruction.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Builds a transcript from caller-supplied messages, as-is.
    ///
    /// No ordering is enforced here; callers may hand us anything.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The most recent user-authored message, if any.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
    }

    /// Scans user-authored messages for pain-related keywords.
    pub fn detect_pain_symptoms(&self) -> bool {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .any(|m| {
                let text = m.content.to_lowercase();
                PAIN_KEYWORDS.iter().any(|kw| text.contains(kw))
            })
    }

    /// Aggressively truncated copy for the token-budget retry path:
    /// system messages, the first user message, and the two most recent
    /// messages. The copy is internal to the retry and then discarded.
    pub fn truncated_for_retry(&self) -> Transcript {
        let mut keep: Vec<usize> = Vec::new();

        for (i, m) in self.messages.iter().enumerate() {
            if m.role == MessageRole::System {
                keep.push(i);
            }
        }
        if let Some(first_user) = self
            .messages
            .iter()
            .position(|m| m.role == MessageRole::User)
        {
            keep.push(first_user);
        }
        let tail_start = self.messages.len().saturating_sub(2);
        for i in tail_start..self.messages.len() {
            keep.push(i);
        }

        keep.sort_unstable();
        keep.dedup();

        Self {
            messages: keep
                .into_iter()
                .map(|i| self.messages[i].clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        let mut t = Transcript::new("base instructions");
        t.push(Message::user("I have a headache"));
        t.push(Message::assistant("How long has it lasted?"));
        t.push(Message::user("Two days"));
        t.push(Message::assistant("Any other symptoms?"));
        t.push(Message::user("no"));
        t
    }

    #[test]
    fn new_transcript_starts_with_system_message() {
        let t = Transcript::new("you are a pharmacist");
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0].role, MessageRole::System);
    }

    #[test]
    fn last_user_message_skips_assistant_replies() {
        let mut t = sample();
        t.push(Message::assistant("Understood."));
        assert_eq!(t.last_user_message().unwrap().content, "no");
    }

    #[test]
    fn last_user_message_none_when_no_user_turns() {
        let t = Transcript::new("system only");
        assert!(t.last_user_message().is_none());
    }

    #[test]
    fn pain_scan_matches_user_keywords_case_insensitively() {
        let mut t = Transcript::new("sys");
        t.push(Message::user("My back has been ACHING all week"));
        assert!(t.detect_pain_symptoms());
    }

    #[test]
    fn pain_scan_ignores_non_user_messages() {
        let mut t = Transcript::new("ask about pain symptoms");
        t.push(Message::assistant("Is there any pain?"));
        t.push(Message::user("I feel dizzy sometimes"));
        assert!(!t.detect_pain_symptoms());
    }

    #[test]
    fn truncated_keeps_system_first_user_and_tail() {
        let t = sample();
        let cut = t.truncated_for_retry();

        let contents: Vec<&str> = cut.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "base instructions",
                "I have a headache",
                "Any other symptoms?",
                "no",
            ]
        );
    }

    #[test]
    fn truncated_deduplicates_overlapping_picks() {
        let mut t = Transcript::new("sys");
        t.push(Message::user("only message"));
        let cut = t.truncated_for_retry();
        assert_eq!(cut.len(), 2);
    }

    #[test]
    fn message_role_serializes_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn transcript_serializes_as_plain_message_array() {
        let t = Transcript::from_messages(vec![Message::user("hi")]);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"[{"role":"user","content":"hi"}]"#);
    }
}
