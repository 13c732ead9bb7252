//! Application layer: the conversation-to-diagnosis pipeline.
//!
//! Prompt selection, turn orchestration, and diagnosis extraction. These are
//! the only modules with decision logic; everything they talk to is a port.

pub mod extractor;
pub mod json_extract;
pub mod prompts;
pub mod turn;

pub use extractor::DiagnosisExtractor;
pub use turn::{TurnController, TurnOutcome};
