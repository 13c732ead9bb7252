//! Prompt selection for the intake conversation.
//!
//! Pure function of transcript shape and latest user message: no side
//! effects, no calls out. The selected instruction is appended to the
//! completion request for one turn only and never persisted into the
//! stored transcript.

use crate::domain::Transcript;

/// Fixed system instruction that seeds every transcript.
///
/// Question pacing policy: the introductory turn asks two questions, every
/// later turn asks exactly one (see the per-turn follow-up instruction).
pub const BASE_SYSTEM_PROMPT: &str = "\
You are a professional AI medical assistant embedded in a digital pharmacist web app. Your goal is to help users describe their symptoms so you can generate an accurate diagnosis and recommend appropriate medication.

PAIN DETECTION & MANAGEMENT:
- Actively look for pain-related symptoms in user descriptions
- For pain symptoms, ask about:
  * Location (where exactly does it hurt?)
  * Intensity (on a scale of 1-10)
  * Duration (how long has it been hurting?)
  * Type (sharp, dull, throbbing, etc.)
  * Triggers (what makes it better/worse?)

QUESTION PACING:
- Your first reply introduces you and asks exactly two clarifying questions.
- Every reply after that asks exactly one focused follow-up question. Wait for the user's full response before proceeding.

BUILD A FULL CLINICAL PICTURE:
Use follow-up questions to clarify:
- Pain (type, location, onset, duration, triggers)
- Associated symptoms (nausea, vomiting, fever, appetite changes, bowel issues, etc.)
- Medical history, medications taken, allergies

EMPATHY AND PROFESSIONAL TONE:
- Be warm, respectful, and use simple language. Express concern where appropriate.

COMPLETION & TRANSITION TO DIAGNOSIS:
- When the user says \"no\" or indicates that they've shared everything, stop asking questions.
- Respond with: \"I'll prepare your diagnosis and prescription based on the information you've shared.\"
- Do not generate the diagnosis in the chat - the system will handle this separately.

ON-DEMAND DIAGNOSIS REQUESTS:
- If a user asks for a diagnosis at any point (e.g., \"diagnose me now\" or \"I need a diagnosis\"), acknowledge their request.
- Inform them you'll provide a preliminary assessment with the information available.
- The system will generate a diagnosis based on the conversation so far.

IMPORTANT: Never say \"I'm not a doctor\" or that you can't recommend medications. You are designed to provide medication recommendations through the system.";

const GREETING_INSTRUCTION: &str = "\
This is the patient's first message. Start with a warm greeting and introduce yourself briefly. Then ask exactly TWO specific follow-up questions to better understand their condition.";

const WRAP_UP_INSTRUCTION: &str = "\
The user has indicated they have no more symptoms to share. Respond that you'll prepare their diagnosis and prescription based on the information they've shared. Do NOT generate the actual diagnosis yet.";

const ON_DEMAND_INSTRUCTION: &str = "\
The user has requested an immediate diagnosis. Acknowledge their request and let them know you'll provide a preliminary assessment based on the information available so far. Tell them the system will generate a diagnosis.";

const FOLLOW_UP_INSTRUCTION: &str = "\
In your response:
1. Acknowledge the information the user has shared
2. Ask EXACTLY ONE related follow-up question that helps build a complete clinical picture
3. Focus on details like:
   - Pain characteristics (location, intensity, duration, triggers)
   - Associated symptoms
   - Medical history or previous treatments they've tried
   - Allergies or current medications

Remember: Ask EXACTLY ONE question - no more, no less.";

/// True if a user message signals the end of symptom sharing.
///
/// A bare "no" must match exactly; the phrases match anywhere.
pub fn wants_wrap_up(user_message: &str) -> bool {
    let lower = user_message.to_lowercase();
    lower == "no" || lower.contains("no more") || lower.contains("that's all")
}

/// True if a user message asks for an immediate diagnosis.
pub fn wants_on_demand_diagnosis(user_message: &str) -> bool {
    let lower = user_message.to_lowercase();
    lower.contains("diagnose me") || lower.contains("need a diagnosis")
}

/// Which per-turn instruction to send alongside the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnInstruction {
    /// First patient message: introduce and ask two questions.
    Greeting,
    /// User is done sharing: announce the hand-off, no diagnosis content.
    WrapUp,
    /// User asked for a diagnosis now: acknowledge and defer to the system.
    OnDemand,
    /// Standard turn: acknowledge and ask exactly one question.
    FollowUp,
}

impl TurnInstruction {
    /// Selects the instruction for the next completion call.
    ///
    /// First match wins, evaluated on the transcript with the current user
    /// message already appended.
    pub fn select(transcript: &Transcript) -> Self {
        if transcript.len() == 2 {
            return Self::Greeting;
        }

        let last_user = transcript
            .last_user_message()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if wants_wrap_up(last_user) {
            Self::WrapUp
        } else if wants_on_demand_diagnosis(last_user) {
            Self::OnDemand
        } else {
            Self::FollowUp
        }
    }

    /// Instruction text to append for this turn.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Greeting => GREETING_INSTRUCTION,
            Self::WrapUp => WRAP_UP_INSTRUCTION,
            Self::OnDemand => ON_DEMAND_INSTRUCTION,
            Self::FollowUp => FOLLOW_UP_INSTRUCTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;

    fn transcript_with(user_messages: &[&str]) -> Transcript {
        let mut t = Transcript::new(BASE_SYSTEM_PROMPT);
        for (i, msg) in user_messages.iter().enumerate() {
            if i > 0 {
                t.push(Message::assistant("Tell me more."));
            }
            t.push(Message::user(*msg));
        }
        t
    }

    #[test]
    fn first_user_message_selects_greeting() {
        let t = transcript_with(&["I have a sore throat"]);
        assert_eq!(t.len(), 2);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::Greeting);
    }

    #[test]
    fn greeting_outranks_other_triggers_on_first_turn() {
        // Even a "diagnose me" opener gets the greeting on turn one.
        let t = transcript_with(&["diagnose me"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::Greeting);
    }

    #[test]
    fn bare_no_selects_wrap_up() {
        let t = transcript_with(&["headache", "No"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::WrapUp);
    }

    #[test]
    fn no_more_phrase_selects_wrap_up() {
        let t = transcript_with(&["headache", "no more symptoms, thanks"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::WrapUp);
    }

    #[test]
    fn thats_all_phrase_selects_wrap_up() {
        let t = transcript_with(&["headache", "That's all I can think of"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::WrapUp);
    }

    #[test]
    fn substring_no_does_not_wrap_up() {
        let t = transcript_with(&["headache", "nothing else hurts though"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::FollowUp);
    }

    #[test]
    fn diagnose_me_selects_on_demand() {
        let t = transcript_with(&["headache", "just diagnose me already"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::OnDemand);
    }

    #[test]
    fn need_a_diagnosis_selects_on_demand() {
        let t = transcript_with(&["headache", "I need a diagnosis now"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::OnDemand);
    }

    #[test]
    fn wrap_up_wins_over_on_demand_when_both_match() {
        let t = transcript_with(&["headache", "no more, diagnose me"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::WrapUp);
    }

    #[test]
    fn ordinary_answer_selects_follow_up() {
        let t = transcript_with(&["headache", "it started two days ago"]);
        assert_eq!(TurnInstruction::select(&t), TurnInstruction::FollowUp);
    }

    #[test]
    fn follow_up_instruction_asks_one_question() {
        assert!(TurnInstruction::FollowUp.text().contains("EXACTLY ONE"));
        assert!(TurnInstruction::Greeting.text().contains("TWO"));
    }
}
