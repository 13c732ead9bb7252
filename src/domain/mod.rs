//! Domain types: conversation transcripts and diagnosis records.

pub mod diagnosis;
pub mod transcript;

pub use diagnosis::{DiagnosisRecord, PrescriptionItem};
pub use transcript::{Message, MessageRole, Transcript};
