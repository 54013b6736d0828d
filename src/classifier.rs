use crate::types::{ClassifierVerdict, ClassifyRequest};
use anyhow::Result;
use async_trait::async_trait;

/// Boundary to the hosted multimodal classifier. Transport, upload and
/// protocol failures are the `Err` arm; the two ways the service can answer
/// are the verdict variants. The handler and normalizer only ever see this
/// trait, so they can be exercised against fakes.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: ClassifyRequest) -> Result<ClassifierVerdict>;
}
