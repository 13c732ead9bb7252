//! Canonical diagnosis output types.
//!
//! The completion model is asked for a fixed JSON shape but routinely strays
//! from it, so everything here is written to upgrade rather than reject:
//! missing top-level fields get defaults, the legacy `prescription`/`drug`
//! shorthand is translated to the canonical shape, and malformed entries
//! degrade to an explanatory placeholder record instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder diagnosis when the field is missing from model output.
pub const DEFAULT_DIAGNOSIS: &str = "Unable to determine diagnosis";
/// Default follow-up text when the field is missing from model output.
pub const DEFAULT_FOLLOW_UP: &str = "None";
/// Follow-up text used on degraded (error) records.
pub const RETRY_FOLLOW_UP: &str = "Please try again later";

const DEFAULT_DRUG_NAME: &str = "Unknown medication";
const DEFAULT_DOSAGE: &str = "As directed";
const DEFAULT_FORM: &str = "tablet";
const DEFAULT_DURATION: &str = "As needed";
const DEFAULT_INSTRUCTIONS: &str = "Take as directed by healthcare provider";

/// A single medication recommendation.
///
/// Invariant: all five fields are present and non-empty once a record has
/// passed through [`DiagnosisRecord::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionItem {
    pub drug_name: String,
    pub dosage: String,
    pub form: String,
    pub duration: String,
    pub instructions: String,
}

impl PrescriptionItem {
    /// Normalizes one prescription entry, translating the legacy `drug` key
    /// and filling fixed defaults for anything missing or empty.
    ///
    /// Returns `None` for entries that are not JSON objects; those are
    /// dropped rather than carried opaquely.
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        let field = |key: &str| -> Option<String> {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        Some(Self {
            drug_name: field("drug_name")
                .or_else(|| field("drug"))
                .unwrap_or_else(|| DEFAULT_DRUG_NAME.to_string()),
            dosage: field("dosage").unwrap_or_else(|| DEFAULT_DOSAGE.to_string()),
            form: field("form").unwrap_or_else(|| DEFAULT_FORM.to_string()),
            duration: field("duration").unwrap_or_else(|| DEFAULT_DURATION.to_string()),
            instructions: field("instructions")
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        })
    }
}

/// Canonical structured output of the diagnosis pipeline.
///
/// Either fully populated or absent: the pipeline never emits a partially
/// filled record. `error` and `raw_response` are only set on degraded
/// records and are skipped in serialized output otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub diagnosis: String,
    #[serde(default)]
    pub prescriptions: Vec<PrescriptionItem>,
    #[serde(default)]
    pub follow_up_recommendations: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw unparsed model output, kept for caller-side diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl DiagnosisRecord {
    /// Builds a degraded record for a failure the pipeline absorbed.
    pub fn failure(error: impl Into<String>, diagnosis: impl Into<String>) -> Self {
        Self {
            diagnosis: diagnosis.into(),
            prescriptions: Vec::new(),
            follow_up_recommendations: RETRY_FOLLOW_UP.to_string(),
            error: Some(error.into()),
            raw_response: None,
        }
    }

    /// Attaches the raw model output to a degraded record.
    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    /// Returns true if this record carries a degradation error.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Converts parsed model output into a canonical record.
    ///
    /// Returns `None` only when the value is not a JSON object; every object
    /// input yields a record, with missing or malformed pieces repaired
    /// (spec: repair rather than reject). Prescription order is preserved as
    /// emitted; no sorting, no de-duplication.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        if !Self::is_canonical(value) {
            tracing::warn!("diagnosis output has invalid format, applying fixes");
        }

        let top = |key: &str| -> Option<String> {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        // Accept the legacy `prescription` array only when the canonical key
        // is absent.
        let raw_items = map
            .get("prescriptions")
            .or_else(|| map.get("prescription"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let prescriptions = raw_items
            .iter()
            .filter_map(PrescriptionItem::from_value)
            .collect();

        Some(Self {
            diagnosis: top("diagnosis").unwrap_or_else(|| DEFAULT_DIAGNOSIS.to_string()),
            prescriptions,
            follow_up_recommendations: top("follow_up_recommendations")
                .unwrap_or_else(|| DEFAULT_FOLLOW_UP.to_string()),
            error: None,
            raw_response: None,
        })
    }

    /// Whether the parsed value already matches the canonical shape.
    fn is_canonical(value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        if !map.contains_key("diagnosis") {
            return false;
        }
        match map.get("prescriptions") {
            None => true,
            Some(Value::Array(items)) => items.iter().all(|rx| {
                rx.as_object().is_some_and(|m| {
                    ["dosage", "form", "duration", "instructions"]
                        .iter()
                        .all(|k| m.contains_key(*k))
                        && (m.contains_key("drug_name") || m.contains_key("drug"))
                })
            }),
            Some(_) => false,
        }
    }
}
