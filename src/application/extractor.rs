//! Diagnosis extractor: transcript in, canonical diagnosis record out.
//!
//! This is the terminal stage of the pipeline. It never fails past its own
//! boundary: completion errors, empty replies, and unparsable output all
//! degrade to an explanatory placeholder record so the caller can always
//! render a coherent response.

use std::sync::Arc;

use crate::application::json_extract::parse_lenient;
use crate::domain::{DiagnosisRecord, Message, Transcript};
use crate::ports::{CompletionClient, CompletionRequest};

/// Sampling temperature for diagnosis generation (favor determinism).
const DIAGNOSIS_TEMPERATURE: f32 = 0.2;
/// Output budget for the primary diagnosis call.
const DIAGNOSIS_MAX_TOKENS: u32 = 4000;
/// Output budget for the truncated retry.
const RETRY_MAX_TOKENS: u32 = 1000;

const SCHEMA_INSTRUCTION: &str = r#"IMPORTANT: Analyze the symptoms in the conversation and generate a medical diagnosis with treatment recommendations.

Your ENTIRE response must be ONLY a valid JSON object in the EXACT format below:

{
  "diagnosis": "Brief diagnosis based on symptoms",
  "prescriptions": [
    {
      "drug_name": "Medication name (generic only, NO brand names)",
      "dosage": "Dosage amount (e.g., 500mg)",
      "form": "tablet",
      "duration": "7 days",
      "instructions": "How to take it"
    }
  ],
  "follow_up_recommendations": "Follow-up advice"
}

RULES:
1. Return ONLY the JSON object - no other text before or after
2. Ensure valid JSON syntax with double quotes around all keys and string values
3. For no prescriptions, use empty array: "prescriptions": []
4. For no follow-up, use "follow_up_recommendations": "None"
5. For multiple medications, add separate prescription objects in the array
6. Never include brand names in parentheses in drug_name"#;

/// Appended to the schema instruction when pain symptoms were detected.
/// Changes prompt content only; parsing and validation are unaffected.
const PAIN_GUIDANCE: &str = r#"

PAIN MANAGEMENT GUIDANCE:
The conversation contains pain-related symptoms. When recommending medication, consider common over-the-counter analgesics:
1. Ibuprofen (400mg, every 6-8 hours) - take with food; avoid with stomach ulcers or kidney problems
2. Acetaminophen (500mg, every 4-6 hours) - never exceed 3000mg per day; avoid with liver disease
3. Naproxen Sodium (220mg, every 8-12 hours) - take with food; do not combine with other NSAIDs
4. Muscle relaxants for muscle-related pain
5. Topical creams or gels for localized pain
Match the medication to the pain type, location, and severity the user described."#;

const JSON_REINFORCEMENT: &str =
    "Remember to format your entire response as a valid JSON object with no text before or after.";

/// Compact instruction for the token-budget retry.
const MINIMAL_SCHEMA_INSTRUCTION: &str = r#"Respond with ONLY a JSON object: {"diagnosis": "...", "prescriptions": [{"drug_name": "...", "dosage": "...", "form": "...", "duration": "...", "instructions": "..."}], "follow_up_recommendations": "..."}"#;

const EMPTY_RESPONSE_ERROR: &str = "Empty response from language model";
const EMPTY_RESPONSE_DIAGNOSIS: &str = "Unable to generate diagnosis due to an empty response";
const FORMATTING_DIAGNOSIS: &str = "Unable to generate diagnosis due to a formatting error";
const API_ERROR_DIAGNOSIS: &str = "Unable to generate diagnosis due to an API error";

/// Extracts a structured diagnosis from a finished conversation.
pub struct DiagnosisExtractor {
    client: Arc<dyn CompletionClient>,
}

impl DiagnosisExtractor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Generates a canonical [`DiagnosisRecord`] from the transcript.
    ///
    /// `pain_hint` takes precedence over the transcript keyword scan when
    /// supplied. `on_demand` marks diagnoses requested before the user
    /// finished sharing; generation is identical, the flag is logged for
    /// operators. Always returns a record - failures degrade to a
    /// placeholder with `error` populated.
    pub async fn extract(
        &self,
        transcript: &Transcript,
        on_demand: bool,
        pain_hint: Option<bool>,
    ) -> DiagnosisRecord {
        let pain_detected = pain_hint.unwrap_or_else(|| transcript.detect_pain_symptoms());
        if pain_detected {
            tracing::info!("pain symptoms detected, adding pain management guidance");
        }
        tracing::info!(
            messages = transcript.len(),
            on_demand,
            "generating diagnosis"
        );

        let request = build_request(transcript, pain_detected);
        match self.client.complete(request).await {
            Ok(raw) => self.parse_reply(&raw),
            Err(err) if err.is_token_budget() => {
                tracing::warn!(%err, "token budget exceeded, retrying with truncated transcript");
                self.retry_truncated(transcript).await
            }
            Err(err) => {
                tracing::error!(%err, "diagnosis completion failed");
                let diagnosis = match err {
                    crate::ports::CompletionError::EmptyCompletion => EMPTY_RESPONSE_DIAGNOSIS,
                    _ => API_ERROR_DIAGNOSIS,
                };
                DiagnosisRecord::failure(err.to_string(), diagnosis)
            }
        }
    }

    /// One retry with an aggressively truncated transcript and a minimal
    /// instruction. Never loops: a second failure falls through to the
    /// placeholder record.
    async fn retry_truncated(&self, transcript: &Transcript) -> DiagnosisRecord {
        let truncated = transcript.truncated_for_retry();

        let mut messages = vec![Message::system(MINIMAL_SCHEMA_INSTRUCTION)];
        messages.extend(truncated.messages().iter().cloned());

        let request = CompletionRequest::new(messages)
            .with_temperature(DIAGNOSIS_TEMPERATURE)
            .with_max_output_tokens(RETRY_MAX_TOKENS)
            .with_json_response();

        match self.client.complete(request).await {
            Ok(raw) => self.parse_reply(&raw),
            Err(err) => {
                tracing::error!(%err, "truncated diagnosis retry failed");
                DiagnosisRecord::failure(err.to_string(), API_ERROR_DIAGNOSIS)
            }
        }
    }

    /// Tolerant parse of the model reply into a canonical record.
    fn parse_reply(&self, raw: &str) -> DiagnosisRecord {
        let raw = raw.trim();
        if raw.is_empty() {
            tracing::error!("diagnosis reply had no content");
            return DiagnosisRecord::failure(EMPTY_RESPONSE_ERROR, EMPTY_RESPONSE_DIAGNOSIS);
        }

        match parse_lenient(raw).as_ref().and_then(DiagnosisRecord::from_value) {
            Some(record) => record,
            None => {
                tracing::warn!("no parsable JSON object in diagnosis reply");
                DiagnosisRecord::failure("No JSON object found in response", FORMATTING_DIAGNOSIS)
                    .with_raw_response(raw)
            }
        }
    }
}

fn build_request(transcript: &Transcript, pain_detected: bool) -> CompletionRequest {
    let schema = if pain_detected {
        format!("{SCHEMA_INSTRUCTION}{PAIN_GUIDANCE}")
    } else {
        SCHEMA_INSTRUCTION.to_string()
    };

    let mut messages = vec![Message::system(schema)];
    messages.extend(transcript.messages().iter().cloned());
    messages.push(Message::system(JSON_REINFORCEMENT));

    CompletionRequest::new(messages)
        .with_temperature(DIAGNOSIS_TEMPERATURE)
        .with_max_output_tokens(DIAGNOSIS_MAX_TOKENS)
        .with_json_response()
}
