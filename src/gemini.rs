use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::classifier::Classifier;
use crate::types::{ClassifierVerdict, ClassifyRequest, SafetyRating};

/// Policy handed to the model as its system instruction.
const COMPLIANCE_POLICY: &str = r#"You are an AI system designed to evaluate product listings for compliance with platform regulations. Your role is to analyze both product descriptions and associated image to ensure complete compliance.
Prohibited Categories
Products and images are non-compliant if they contain or relate to:

Intoxicants

Alcoholic beverages
Tobacco products and smoking accessories
Recreational drugs or drug paraphernalia
Vaping products and accessories


Adult/NSFW Content

Explicit sexual content
Suggestive or provocative imagery
Adult toys or related accessories


Gambling

Gambling devices
Lottery tickets
Betting systems
Virtual gambling items or currency



Evaluation Process

Description Analysis

Review product title and description
Check for explicit mentions or euphemisms for prohibited items
Identify attempts to circumvent restrictions through coded language


Image Analysis

Examine product image for prohibited content
Flag mismatches between descriptions and images
Check for hidden or obscured prohibited elements


Cross-Reference

Compare description against images for consistency
Flag cases where compliant descriptions have non-compliant images or vice versa. Give short and concise reason for any non-compliance."#;

const ANALYSIS_PREAMBLE: &str = "Analyze the following product description and image for compliance with platform regulations(given in system prompt):";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temp_dir: PathBuf,
}

/// Classifier backed by the Gemini API: the image goes through the Files API
/// (the service wants an upload handle, not inline bytes), then one
/// `generateContent` call constrained to a `{compliant, reason}` schema.
pub struct GeminiClassifier {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClassifier {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(path)
            .await
            .context("reading staged image")?;
        let url = format!("{}/upload/v1beta/files", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "raw")
            .header(CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .context("uploading image to the Files API")?
            .error_for_status()
            .context("Files API rejected the upload")?;
        let body: FileUploadResponse = response
            .json()
            .await
            .context("decoding Files API response")?;
        Ok(body.file)
    }

    async fn generate_content(
        &self,
        file: &UploadedFile,
        request: &ClassifyRequest,
    ) -> Result<GeminiResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = GeminiRequest {
            system_instruction: Content::text(COMPLIANCE_POLICY),
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: ANALYSIS_PREAMBLE.to_string(),
                    },
                    Part::FileData {
                        file_data: FileData {
                            mime_type: request.mime_type.clone(),
                            file_uri: file.uri.clone(),
                        },
                    },
                    Part::Text {
                        text: format!("Description: {} {}", request.name, request.description),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: verdict_schema(),
            },
        };
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("calling generateContent")?
            .error_for_status()
            .context("generateContent returned an error status")?;
        response
            .json()
            .await
            .context("decoding generateContent response")
    }
}

/// Schema the model's answer is constrained to.
fn verdict_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "compliant": { "type": "BOOLEAN" },
            "reason": { "type": "STRING" }
        },
        "required": ["compliant", "reason"]
    })
}

#[async_trait]
impl Classifier for GeminiClassifier {
    #[tracing::instrument(skip(self, request), fields(mime_type = %request.mime_type))]
    async fn classify(&self, request: ClassifyRequest) -> Result<ClassifierVerdict> {
        // The staged file is removed when `staged` drops, on every exit path.
        let staged = stage_image(&self.config.temp_dir, &request)?;
        let uploaded = self.upload_file(staged.path(), &request.mime_type).await?;
        tracing::debug!(uri = %uploaded.uri, "image uploaded");

        let response = self.generate_content(&uploaded, &request).await?;
        let candidate = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .context("model returned no candidates")?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            let ratings = candidate.safety_ratings.unwrap_or_default();
            tracing::info!(rating_count = ratings.len(), "model terminated on safety filter");
            return Ok(ClassifierVerdict::SafetyBlocked { ratings });
        }

        let text = candidate
            .into_text()
            .context("model response had no text part")?;
        Ok(ClassifierVerdict::Answered { text })
    }
}

fn stage_image(dir: &Path, request: &ClassifyRequest) -> Result<tempfile::NamedTempFile> {
    let suffix = request
        .filename
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let mut staged = tempfile::Builder::new()
        .suffix(&suffix)
        .tempfile_in(dir)
        .context("creating image staging file")?;
    staged
        .write_all(&request.image)
        .context("staging image bytes")?;
    Ok(staged)
}

// Wire types for the Gemini REST surface.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

impl Content {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
    safety_ratings: Option<Vec<SafetyRating>>,
}

impl Candidate {
    fn into_text(self) -> Option<String> {
        self.content?
            .parts
            .unwrap_or_default()
            .into_iter()
            .find_map(|part| part.text)
    }
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn classifier_for(server: &MockServer, temp_dir: &Path) -> GeminiClassifier {
        GeminiClassifier::new(GeminiConfig {
            api_key: "test-key".to_string(),
            model: "gemini-1.5-flash".to_string(),
            base_url: server.uri(),
            temp_dir: temp_dir.to_path_buf(),
        })
    }

    fn sample_request() -> ClassifyRequest {
        ClassifyRequest {
            name: "Mug".to_string(),
            description: "A ceramic mug".to_string(),
            image: vec![0x89, 0x50, 0x4e, 0x47],
            mime_type: "image/png".to_string(),
            filename: Some("mug.png".to_string()),
        }
    }

    async fn mock_upload(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file": {
                    "name": "files/abc123",
                    "uri": "https://files.example/abc123",
                    "mimeType": "image/png"
                }
            })))
            .mount(server)
            .await;
    }

    /// Response shape per the official generateContent reference.
    fn answered_response(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP",
                "safetyRatings": [
                    { "category": "HARM_CATEGORY_HATE_SPEECH", "probability": "NEGLIGIBLE" }
                ]
            }]
        })
    }

    fn assert_no_staged_files(dir: &Path) {
        assert_eq!(
            std::fs::read_dir(dir).unwrap().count(),
            0,
            "staging directory should be empty after classification"
        );
    }

    #[tokio::test]
    async fn answered_verdict_carries_model_text() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();
        mock_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(answered_response(r#"{"compliant": true, "reason": ""}"#)),
            )
            .mount(&server)
            .await;

        let classifier = classifier_for(&server, temp.path());
        let verdict = classifier.classify(sample_request()).await.unwrap();
        match verdict {
            ClassifierVerdict::Answered { text } => {
                assert_eq!(text, r#"{"compliant": true, "reason": ""}"#);
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
        assert_no_staged_files(temp.path());
    }

    #[tokio::test]
    async fn safety_termination_yields_blocked_verdict() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();
        mock_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "finishReason": "SAFETY",
                    "safetyRatings": [
                        { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "probability": "HIGH" },
                        { "category": "HARM_CATEGORY_HATE_SPEECH", "probability": "NEGLIGIBLE" }
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server, temp.path());
        let verdict = classifier.classify(sample_request()).await.unwrap();
        match verdict {
            ClassifierVerdict::SafetyBlocked { ratings } => {
                assert_eq!(ratings.len(), 2);
                assert_eq!(ratings[0].category, "HARM_CATEGORY_SEXUALLY_EXPLICIT");
                assert_eq!(ratings[0].probability, "HIGH");
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
        assert_no_staged_files(temp.path());
    }

    #[tokio::test]
    async fn upload_failure_is_an_error_and_cleans_up() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server, temp.path());
        assert!(classifier.classify(sample_request()).await.is_err());
        assert_no_staged_files(temp.path());
    }

    #[tokio::test]
    async fn undecodable_completion_is_an_error_and_cleans_up() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();
        mock_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server, temp.path());
        assert!(classifier.classify(sample_request()).await.is_err());
        assert_no_staged_files(temp.path());
    }

    #[tokio::test]
    async fn empty_candidate_list_is_an_error() {
        let server = MockServer::start().await;
        let temp = tempfile::tempdir().unwrap();
        mock_upload(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server, temp.path());
        assert!(classifier.classify(sample_request()).await.is_err());
        assert_no_staged_files(temp.path());
    }
}
