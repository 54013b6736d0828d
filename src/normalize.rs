use serde_json::Value;

use crate::types::{ClassifierVerdict, ComplianceResponse, SafetyRating};

/// Category names arrive prefixed (`HARM_CATEGORY_SEXUALLY_EXPLICIT`); the
/// prefix is cut by length, following the upstream naming convention.
const CATEGORY_PREFIX: &str = "HARM_CATEGORY_";

/// Probability floor below which a safety rating is not reported.
const NEGLIGIBLE: &str = "NEGLIGIBLE";

/// Uniform response derived from whatever the classifier call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// The model's own JSON verdict, forwarded as-is.
    Model(Value),
    /// A verdict synthesized here: safety-filter summary or fail-closed rejection.
    Synthesized(ComplianceResponse),
    /// The model answered outside its schema with something that is not JSON.
    InvalidModelJson,
}

pub fn normalize(outcome: anyhow::Result<ClassifierVerdict>) -> Normalized {
    match outcome {
        Ok(ClassifierVerdict::Answered { text }) => {
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(value) => Normalized::Model(value),
                Err(error) => {
                    tracing::warn!(%error, "model output was not valid JSON");
                    Normalized::InvalidModelJson
                }
            }
        }
        Ok(ClassifierVerdict::SafetyBlocked { ratings }) => from_safety_ratings(&ratings),
        Err(error) => {
            // Fail closed: an unclassifiable listing is rejected, never approved.
            tracing::warn!(error = %error, "classification failed");
            Normalized::Synthesized(ComplianceResponse::tos_rejection())
        }
    }
}

fn from_safety_ratings(ratings: &[SafetyRating]) -> Normalized {
    let flagged: Vec<&SafetyRating> = ratings
        .iter()
        .filter(|rating| rating.probability != NEGLIGIBLE)
        .collect();
    if flagged.is_empty() {
        return Normalized::Synthesized(ComplianceResponse::compliant());
    }
    let reason = flagged
        .iter()
        .map(|rating| {
            let label = rating.category.get(CATEGORY_PREFIX.len()..).unwrap_or("");
            format!("{} ({})", label, rating.probability)
        })
        .collect::<Vec<_>>()
        .join(", ");
    Normalized::Synthesized(ComplianceResponse::non_compliant(reason))
}
