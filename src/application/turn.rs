//! Turn controller: one question/answer cycle of the intake conversation.

use std::sync::Arc;

use crate::domain::{Message, Transcript};
use crate::ports::{CompletionClient, CompletionError, CompletionRequest};

use super::prompts::{wants_on_demand_diagnosis, wants_wrap_up, TurnInstruction};

/// Sampling temperature for conversational turns.
const TURN_TEMPERATURE: f32 = 0.4;
/// Output budget for conversational turns.
const TURN_MAX_TOKENS: u32 = 2000;

/// Phrases the assistant reply must echo before the wrap-up trigger fires.
const HANDOFF_PHRASES: &[&str] = &["prepare your diagnosis", "prepare your prescription"];

/// Disclosure appended to the reply when the user asks for a diagnosis
/// mid-conversation.
const ON_DEMAND_DISCLOSURE: &str =
    "\n\nI'll prepare a preliminary diagnosis based on the information you've shared so far.";

/// Result of one conversation turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Updated transcript copy: caller's transcript + user message + the
    /// assistant reply (without the disclosure sentence).
    pub transcript: Transcript,
    /// Reply text to show the user, disclosure included when applicable.
    pub reply: String,
    /// Whether the conversation should hand off to diagnosis extraction.
    pub ready_for_diagnosis: bool,
}

/// Orchestrates one question/answer cycle against the completion client.
pub struct TurnController {
    client: Arc<dyn CompletionClient>,
}

impl TurnController {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Runs one turn: appends the user message to a working copy, selects
    /// the per-turn instruction, calls the completion client, and evaluates
    /// the end-of-conversation triggers.
    ///
    /// The instruction is used for generation only and is not persisted. On
    /// completion failure the error is returned as-is and the caller's
    /// transcript is untouched; a user message is never stored without its
    /// assistant reply.
    pub async fn advance(
        &self,
        transcript: &Transcript,
        user_message: &str,
    ) -> Result<TurnOutcome, CompletionError> {
        let mut working = transcript.clone();
        working.push(Message::user(user_message));

        let instruction = TurnInstruction::select(&working);
        tracing::debug!(?instruction, turn = working.len(), "selected turn instruction");

        let mut request_messages = working.messages().to_vec();
        request_messages.push(Message::system(instruction.text()));

        let request = CompletionRequest::new(request_messages)
            .with_temperature(TURN_TEMPERATURE)
            .with_max_output_tokens(TURN_MAX_TOKENS);

        let reply = self.client.complete(request).await?;
        working.push(Message::assistant(reply.clone()));

        // End triggers key off the user message, independent of which
        // instruction was selected (a first-turn "diagnose me" still gets
        // the greeting instruction but fires the on-demand trigger).
        let mut ready_for_diagnosis = false;
        let mut reply_out = reply;

        if wants_wrap_up(user_message) {
            let lower = reply_out.to_lowercase();
            ready_for_diagnosis = HANDOFF_PHRASES.iter().any(|p| lower.contains(p));
        }
        if wants_on_demand_diagnosis(user_message) {
            ready_for_diagnosis = true;
            reply_out.push_str(ON_DEMAND_DISCLOSURE);
        }

        if ready_for_diagnosis {
            tracing::info!("conversation ready for diagnosis hand-off");
        }

        Ok(TurnOutcome {
            transcript: working,
            reply: reply_out,
            ready_for_diagnosis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockCompletionClient;
    use crate::application::prompts::BASE_SYSTEM_PROMPT;
    use crate::domain::MessageRole;

    fn base_transcript() -> Transcript {
        let mut t = Transcript::new(BASE_SYSTEM_PROMPT);
        t.push(Message::user("I have a headache"));
        t.push(Message::assistant("How long has it lasted?"));
        t
    }

    #[tokio::test]
    async fn advance_appends_user_and_assistant_messages() {
        let client = Arc::new(MockCompletionClient::new().with_reply("Does it throb?"));
        let controller = TurnController::new(client);
        let before = base_transcript();

        let outcome = controller.advance(&before, "Two days now").await.unwrap();

        assert_eq!(outcome.transcript.len(), before.len() + 2);
        let messages = outcome.transcript.messages();
        assert_eq!(messages[3].content, "Two days now");
        assert_eq!(messages[4].content, "Does it throb?");
        assert!(!outcome.ready_for_diagnosis);
        // Caller's transcript untouched.
        assert_eq!(before.len(), 3);
    }

    #[tokio::test]
    async fn instruction_is_sent_but_not_persisted() {
        let client = Arc::new(MockCompletionClient::new().with_reply("Okay."));
        let controller = TurnController::new(client.clone());

        let outcome = controller
            .advance(&base_transcript(), "It gets worse at night")
            .await
            .unwrap();

        let calls = client.calls();
        let sent = &calls[0].messages;
        assert_eq!(sent.last().unwrap().role, MessageRole::System);
        assert!(sent.last().unwrap().content.contains("EXACTLY ONE"));
        // Persisted transcript ends with the assistant reply, no instruction.
        assert_eq!(
            outcome.transcript.messages().last().unwrap().role,
            MessageRole::Assistant
        );
    }

    #[tokio::test]
    async fn wrap_up_requires_handoff_echo() {
        let client =
            Arc::new(MockCompletionClient::new().with_reply("Thanks for sharing everything!"));
        let controller = TurnController::new(client);

        let outcome = controller
            .advance(&base_transcript(), "no more")
            .await
            .unwrap();

        assert!(!outcome.ready_for_diagnosis);
    }

    #[tokio::test]
    async fn wrap_up_fires_when_reply_echoes_handoff() {
        let client = Arc::new(MockCompletionClient::new().with_reply(
            "I'll Prepare Your Diagnosis and prescription based on what you've shared.",
        ));
        let controller = TurnController::new(client);

        let outcome = controller.advance(&base_transcript(), "no").await.unwrap();

        assert!(outcome.ready_for_diagnosis);
    }

    #[tokio::test]
    async fn on_demand_fires_regardless_of_reply() {
        let client = Arc::new(MockCompletionClient::new().with_reply("Let me just note that."));
        let controller = TurnController::new(client);

        let outcome = controller
            .advance(&base_transcript(), "I need a diagnosis now")
            .await
            .unwrap();

        assert!(outcome.ready_for_diagnosis);
    }

    #[tokio::test]
    async fn on_demand_appends_disclosure_exactly_once() {
        let client = Arc::new(MockCompletionClient::new().with_reply("Understood."));
        let controller = TurnController::new(client);

        let outcome = controller
            .advance(&base_transcript(), "please diagnose me")
            .await
            .unwrap();

        assert_eq!(outcome.reply.matches("preliminary diagnosis").count(), 1);
        assert!(outcome.reply.starts_with("Understood."));
        // The stored transcript keeps the raw reply.
        assert_eq!(
            outcome.transcript.messages().last().unwrap().content,
            "Understood."
        );
    }

    #[tokio::test]
    async fn completion_failure_surfaces_and_leaves_no_partial_turn() {
        let client = Arc::new(
            MockCompletionClient::new()
                .with_error(CompletionError::RateLimited("429 slow down".into())),
        );
        let controller = TurnController::new(client);
        let before = base_transcript();

        let err = controller.advance(&before, "still hurts").await.unwrap_err();

        assert!(matches!(err, CompletionError::RateLimited(_)));
        assert_eq!(before.len(), 3);
    }

    #[tokio::test]
    async fn turn_uses_conversational_settings() {
        let client = Arc::new(MockCompletionClient::new().with_reply("ok"));
        let controller = TurnController::new(client.clone());

        controller
            .advance(&base_transcript(), "some answer")
            .await
            .unwrap();

        let calls = client.calls();
        assert_eq!(calls[0].temperature, 0.4);
        assert_eq!(calls[0].max_output_tokens, 2000);
        assert!(!calls[0].json_response);
    }
}
