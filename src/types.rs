use serde::{Deserialize, Serialize};

/// Reason returned for denylist hits and for any failed classification.
/// Both paths must produce byte-identical bodies.
pub const TOS_REJECTION_REASON: &str = "Does not comply with our Terms of Service";

pub const MISSING_FIELDS_ERROR: &str = "Image and description are required";
pub const UNSUPPORTED_FORMAT_ERROR: &str = "Unsupported image format";
pub const INVALID_MODEL_JSON_ERROR: &str = "Invalid JSON response from the model";

/// Image MIME types the hosted classifier accepts.
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// One uploaded photo field, as received from the multipart form.
#[derive(Debug, Clone)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

/// Input to the classifier, assembled after validation has passed.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub name: String,
    pub description: String,
    pub image: Vec<u8>,
    pub mime_type: String,
    pub filename: Option<String>,
}

/// What the hosted classifier said, when it said anything at all.
/// Transport and upload failures surface as the `Err` arm of the
/// `Classifier` result instead.
#[derive(Debug, Clone)]
pub enum ClassifierVerdict {
    /// The model answered the requested schema; `text` is its raw output.
    Answered { text: String },
    /// The service refused to answer and reported content-risk ratings instead.
    SafetyBlocked { ratings: Vec<SafetyRating> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

/// Verdict body returned by `/check_compliance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResponse {
    pub compliant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ComplianceResponse {
    pub fn compliant() -> Self {
        Self {
            compliant: true,
            reason: None,
        }
    }

    pub fn non_compliant(reason: impl Into<String>) -> Self {
        Self {
            compliant: false,
            reason: Some(reason.into()),
        }
    }

    pub fn tos_rejection() -> Self {
        Self::non_compliant(TOS_REJECTION_REASON)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
