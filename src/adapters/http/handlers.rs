//! HTTP handlers for the intake and diagnosis endpoints.
//!
//! Thin glue: handlers fetch/store transcripts, delegate to the application
//! layer, and translate outcomes to wire DTOs. Chat-turn failures surface as
//! a server error with the upstream message attached; diagnosis failures
//! never do - the extractor's contract guarantees a record-shaped response.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::{DiagnosisExtractor, TurnController};
use crate::domain::Transcript;
use crate::ports::{CompletionClient, TranscriptStore};

use super::dto::{
    ChatRequest, ChatResponse, ClearResponse, DiagnoseRequest, DiagnoseResponse, DiagnosisView,
    ErrorResponse, HealthResponse,
};

/// Response text when a diagnosis was produced.
const DIAGNOSIS_READY_RESPONSE: &str =
    "Here's your diagnosis and prescription. I'm passing this to the system to prepare your checkout.";
/// Response text when the extractor degraded to a placeholder.
const DIAGNOSIS_DEGRADED_RESPONSE: &str =
    "I've prepared a preliminary assessment based on the limited information available.";
/// Diagnosis text shown to the caller on degraded records.
const DIAGNOSIS_DEGRADED_TEXT: &str = "Unable to provide a comprehensive diagnosis with the information provided. Please share more details about your symptoms for a more accurate assessment.";
const DIAGNOSIS_DEGRADED_FOLLOW_UP: &str =
    "Please provide more symptom information for a more accurate assessment.";

/// Shared application state for all endpoints.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TranscriptStore>,
    pub turns: Arc<TurnController>,
    pub extractor: Arc<DiagnosisExtractor>,
    /// Model identifier, reported by the health probe.
    pub model: String,
}

impl AppState {
    /// Wires the application services over the given adapters.
    pub fn new(client: Arc<dyn CompletionClient>, store: Arc<dyn TranscriptStore>) -> Self {
        let model = client.model().to_string();
        Self {
            store,
            turns: Arc::new(TurnController::new(client.clone())),
            extractor: Arc::new(DiagnosisExtractor::new(client)),
            model,
        }
    }
}

/// POST /api/chat - run one conversation turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::info!(user_id = %request.user_id, "received chat message");

    let transcript = state.store.get(&request.user_id).await;
    let outcome = state
        .turns
        .advance(&transcript, &request.message)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    state.store.put(&request.user_id, outcome.transcript).await;

    Ok(Json(ChatResponse {
        response: outcome.reply,
        conversation_id: request.user_id,
        ready_for_diagnosis: outcome.ready_for_diagnosis,
    }))
}

/// POST /api/diagnose - extract a structured diagnosis.
///
/// Always answers 200 with a record-shaped body; extractor degradation shows
/// up as `checkout_ready: false` plus a populated `error`.
pub async fn diagnose(
    State(state): State<AppState>,
    Json(request): Json<DiagnoseRequest>,
) -> Json<DiagnoseResponse> {
    tracing::info!(user_id = %request.user_id, on_demand = request.on_demand, "generating diagnosis");

    let transcript = if request.conversation.is_empty() {
        state.store.get(&request.user_id).await
    } else {
        Transcript::from_messages(request.conversation.into_iter().map(Into::into).collect())
    };

    let record = state
        .extractor
        .extract(&transcript, request.on_demand, None)
        .await;

    if record.is_degraded() {
        tracing::warn!(
            user_id = %request.user_id,
            error = record.error.as_deref().unwrap_or_default(),
            "diagnosis degraded to placeholder"
        );
        return Json(DiagnoseResponse {
            response: DIAGNOSIS_DEGRADED_RESPONSE.to_string(),
            diagnosis: Some(DiagnosisView {
                diagnosis: DIAGNOSIS_DEGRADED_TEXT.to_string(),
                prescriptions: Vec::new(),
                follow_up_recommendations: DIAGNOSIS_DEGRADED_FOLLOW_UP.to_string(),
            }),
            checkout_ready: false,
            error: record.error,
        });
    }

    Json(DiagnoseResponse {
        response: DIAGNOSIS_READY_RESPONSE.to_string(),
        diagnosis: Some(DiagnosisView::from(&record)),
        checkout_ready: true,
        error: None,
    })
}

/// DELETE /api/conversation/{user_id} - reset a user's transcript.
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ClearResponse> {
    let existed = state.store.clear(&user_id).await;
    let message = if existed {
        format!("Conversation history cleared for user {user_id}")
    } else {
        format!("No conversation history found for user {user_id}")
    };
    Json(ClearResponse { message })
}

/// GET /api/health - liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        agent: "PharmaAI Assistant".to_string(),
        model: state.model.clone(),
    })
}

/// API error type mapping failures to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Upstream or internal failure; the message is surfaced so a failed
    /// turn is visibly reported, never disguised as an empty reply.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Internal(message) => {
                tracing::error!("request failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::internal(message)),
                )
                    .into_response()
            }
        }
    }
}
