//! HTTP DTOs for the chat and diagnosis endpoints.
//!
//! These types decouple the wire contract from domain types. Key casing
//! follows the contract the web frontend already speaks: snake_case except
//! `readyForDiagnosis`, which is camelCase for historical reasons.

use serde::{Deserialize, Serialize};

use crate::domain::{DiagnosisRecord, Message, MessageRole, PrescriptionItem};

// ----- Requests -----

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

/// One caller-supplied conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub role: MessageRole,
    pub content: String,
}

impl From<ChatMessageDto> for Message {
    fn from(dto: ChatMessageDto) -> Self {
        Message::new(dto.role, dto.content)
    }
}

/// Body of `POST /api/diagnose`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnoseRequest {
    pub user_id: String,
    /// Conversation to diagnose; when empty, the stored transcript for
    /// `user_id` is used instead.
    #[serde(default)]
    pub conversation: Vec<ChatMessageDto>,
    #[serde(default)]
    pub on_demand: bool,
}

// ----- Responses -----

/// Body of the `POST /api/chat` response.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    #[serde(rename = "readyForDiagnosis")]
    pub ready_for_diagnosis: bool,
}

/// Diagnosis payload of the `POST /api/diagnose` response.
///
/// Canonical shape only; degradation details (`error`, raw output) live on
/// the envelope, not here.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisView {
    pub diagnosis: String,
    pub prescriptions: Vec<PrescriptionItem>,
    pub follow_up_recommendations: String,
}

impl From<&DiagnosisRecord> for DiagnosisView {
    fn from(record: &DiagnosisRecord) -> Self {
        Self {
            diagnosis: record.diagnosis.clone(),
            prescriptions: record.prescriptions.clone(),
            follow_up_recommendations: record.follow_up_recommendations.clone(),
        }
    }
}

/// Body of the `POST /api/diagnose` response.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnoseResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<DiagnosisView>,
    pub checkout_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of the `DELETE /api/conversation/{user_id}` response.
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

/// Body of the `GET /api/health` response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent: String,
    pub model: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}
