use std::sync::Arc;

use axum::Router;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use metrics::counter;

use crate::classifier::Classifier;
use crate::denylist::Denylist;
use crate::normalize::{Normalized, normalize};
use crate::types::{
    ALLOWED_IMAGE_TYPES, ClassifyRequest, ComplianceResponse, ErrorResponse,
    INVALID_MODEL_JSON_ERROR, MISSING_FIELDS_ERROR, Photo, UNSUPPORTED_FORMAT_ERROR,
};

#[derive(Clone)]
pub struct AppState {
    classifier: Arc<dyn Classifier>,
    denylist: Arc<Denylist>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, denylist: Arc<Denylist>) -> Self {
        Self {
            classifier,
            denylist,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/check_compliance", post(check_compliance))
        .with_state(state)
}

#[derive(Debug, Default)]
struct ComplianceForm {
    photo: Option<Photo>,
    name: Option<String>,
    description: Option<String>,
}

/// Linear decision sequence: denylist, then field validation, then the model.
/// Every terminal produces exactly one response; nothing is retried.
#[tracing::instrument(skip(state, multipart))]
async fn check_compliance(State(state): State<AppState>, multipart: Multipart) -> Response {
    counter!("compliance_requests_total").increment(1);

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(error) => {
            // An unreadable body has no usable fields; same outcome as absent ones.
            tracing::warn!(%error, "failed to read multipart body");
            return required_fields_error();
        }
    };

    let name = form.name.unwrap_or_default();
    let combined = format!("{} {}", name, form.description.as_deref().unwrap_or(""));
    if state.denylist.contains_denylisted_term(&combined) {
        counter!("denylist_hits_total").increment(1);
        tracing::info!("listing rejected by denylist");
        return Json(ComplianceResponse::tos_rejection()).into_response();
    }

    let description = form.description.filter(|description| !description.is_empty());
    let (Some(photo), Some(description)) = (form.photo, description) else {
        tracing::info!("rejecting request with missing fields");
        return required_fields_error();
    };

    let mime_type = photo.content_type.unwrap_or_default();
    if !ALLOWED_IMAGE_TYPES.contains(&mime_type.as_str()) {
        tracing::info!(mime_type = %mime_type, "rejecting unsupported image format");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(UNSUPPORTED_FORMAT_ERROR)),
        )
            .into_response();
    }

    let request = ClassifyRequest {
        name,
        description,
        image: photo.bytes,
        mime_type,
        filename: photo.filename,
    };

    let outcome = state.classifier.classify(request).await;
    match normalize(outcome) {
        Normalized::Model(value) => Json(value).into_response(),
        Normalized::Synthesized(body) => Json(body).into_response(),
        Normalized::InvalidModelJson => {
            Json(ErrorResponse::new(INVALID_MODEL_JSON_ERROR)).into_response()
        }
    }
}

fn required_fields_error() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(MISSING_FIELDS_ERROR)),
    )
        .into_response()
}

async fn read_form(mut multipart: Multipart) -> Result<ComplianceForm, MultipartError> {
    let mut form = ComplianceForm::default();
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "photo" => {
                let content_type = field.content_type().map(str::to_owned);
                let filename = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await?;
                form.photo = Some(Photo {
                    bytes: bytes.to_vec(),
                    content_type,
                    filename,
                });
            }
            "name" => form.name = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(form)
}
